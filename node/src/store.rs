//! Sending batches of DICOM instances to a peer.
//!
//! The file meta groups of all sources are read concurrently,
//! and their SOP classes and transfer syntaxes
//! become the proposed presentation contexts of a single association.
//! The instances are then sent one at a time, in input order,
//! and the outcome of each one is reported as soon as it is known.
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use dcmnet_dimse::{CommandMessage, Priority, Status};
use dcmnet_object::{open_meta, read_meta, FileMetaTable, RawDicomFile, ReadError, ReadPreamble};
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info};

use crate::connection::{AssociateOptions, Association, Connection};
use crate::{NoTransferSyntaxSnafu, Result, StoreTaskSnafu};

/// A DICOM instance to send, in the DICOM file format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSource {
    /// A file in the file system.
    File(PathBuf),
    /// A file already in memory, with a name for reporting.
    Buffer { name: String, data: Vec<u8> },
}

impl StoreSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        StoreSource::File(path.into())
    }

    pub fn buffer(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        StoreSource::Buffer {
            name: name.into(),
            data: data.into(),
        }
    }

    fn read_meta(&self) -> Result<FileMetaTable, ReadError> {
        match self {
            StoreSource::File(path) => open_meta(path),
            StoreSource::Buffer { data, .. } => read_meta(&data[..], ReadPreamble::Auto),
        }
    }

    async fn load(&self) -> Result<RawDicomFile, StoreError> {
        match self {
            StoreSource::File(path) => {
                let data = tokio::fs::read(path).await.context(LoadFileSnafu)?;
                RawDicomFile::from_reader(&data[..], ReadPreamble::Auto).context(ReadFileSnafu)
            }
            StoreSource::Buffer { data, .. } => {
                RawDicomFile::from_reader(&data[..], ReadPreamble::Auto).context(ReadFileSnafu)
            }
        }
    }
}

impl fmt::Display for StoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreSource::File(path) => write!(f, "{}", path.display()),
            StoreSource::Buffer { name, .. } => f.write_str(name),
        }
    }
}

/// Why an instance of a batch was not stored.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum StoreError {
    /// could not read file meta group
    ReadMeta {
        #[snafu(backtrace)]
        source: ReadError,
    },

    /// could not load file
    LoadFile {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// could not read file
    ReadFile {
        #[snafu(backtrace)]
        source: ReadError,
    },

    #[snafu(display(
        "no accepted presentation context for {} in {}",
        sop_class_uid,
        transfer_syntax
    ))]
    NoPresentationContext {
        sop_class_uid: String,
        transfer_syntax: String,
        backtrace: Backtrace,
    },

    #[snafu(display("store failed with status {}", status))]
    Failed { status: Status, backtrace: Backtrace },

    /// association failure
    Association {
        #[snafu(backtrace)]
        source: crate::Error,
    },

    /// not sent after an earlier association failure
    Skipped { backtrace: Backtrace },

    /// reading task was interrupted
    Interrupted {
        source: JoinError,
        backtrace: Backtrace,
    },
}

impl StoreError {
    /// Whether the failure also ends the association,
    /// so that no further instances of the batch can be sent.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Association { .. })
    }
}

/// The outcome of sending one instance of a batch.
#[derive(Debug)]
pub struct StoreOutcome {
    /// the position of the instance in the batch
    pub index: usize,
    pub source: Arc<StoreSource>,
    /// the status of a successful response,
    /// which may still be a warning
    pub result: Result<Status, StoreError>,
}

/// A handle to a running batch.
///
/// Outcomes arrive in no particular order:
/// instances with unreadable meta groups are reported first,
/// and the rest as they are sent.
#[derive(Debug)]
pub struct StoreHandle {
    outcomes: mpsc::UnboundedReceiver<StoreOutcome>,
    task: JoinHandle<Result<()>>,
}

impl StoreHandle {
    /// Wait for the next outcome,
    /// or `None` once the batch is over.
    pub async fn next_outcome(&mut self) -> Option<StoreOutcome> {
        self.outcomes.recv().await
    }

    /// Wait for the batch to end, discarding pending outcomes.
    ///
    /// Fails if the batch could not be sent at all,
    /// such as when the association was not established.
    pub async fn finish(self) -> Result<()> {
        let StoreHandle { outcomes, task } = self;
        drop(outcomes);
        task.await.context(StoreTaskSnafu)?
    }

    /// Wait for the batch to end, collecting all outcomes by input order.
    pub async fn collect(mut self) -> Result<Vec<StoreOutcome>> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.next_outcome().await {
            outcomes.push(outcome);
        }
        outcomes.sort_by_key(|o| o.index);
        self.finish().await?;
        Ok(outcomes)
    }
}

pub(crate) fn spawn_store(
    connection: Connection,
    sources: Vec<StoreSource>,
    options: AssociateOptions,
) -> StoreHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_store(connection, sources, options, tx));
    StoreHandle { outcomes: rx, task }
}

struct Reporter {
    sources: Vec<Arc<StoreSource>>,
    outcomes: mpsc::UnboundedSender<StoreOutcome>,
}

impl Reporter {
    fn report(&self, index: usize, result: Result<Status, StoreError>) {
        let source = Arc::clone(&self.sources[index]);
        match &result {
            Ok(status) => info!("{}: stored ({})", source, status),
            Err(e) => debug!("{}: {}", source, snafu::Report::from_error(e)),
        }
        // outcomes are no longer wanted if the receiver is gone
        let _ = self.outcomes.send(StoreOutcome {
            index,
            source,
            result,
        });
    }
}

/// An instance with a readable meta group.
struct Readable {
    index: usize,
    meta: FileMetaTable,
}

async fn run_store(
    connection: Connection,
    sources: Vec<StoreSource>,
    options: AssociateOptions,
    outcomes: mpsc::UnboundedSender<StoreOutcome>,
) -> Result<()> {
    let reporter = Reporter {
        sources: sources.into_iter().map(Arc::new).collect(),
        outcomes,
    };

    let readable = read_metas(&reporter).await;
    if readable.is_empty() {
        info!("No instances to send");
        return Ok(());
    }

    let contexts = presentation_contexts(readable.iter().map(|r| &r.meta))?;
    let options = AssociateOptions { contexts, ..options };
    let mut association = connection.associate(options).await?;

    let mut fatal = false;
    for Readable { index, meta } in readable {
        if fatal {
            reporter.report(index, SkippedSnafu.fail());
            continue;
        }
        let result = store_one(&mut association, &reporter.sources[index], &meta).await;
        fatal = matches!(&result, Err(e) if e.is_fatal());
        reporter.report(index, result);
    }

    if fatal {
        let _ = association.abort().await;
        Ok(())
    } else {
        association.release().await
    }
}

/// Read all meta groups concurrently,
/// reporting the sources which could not be read.
async fn read_metas(reporter: &Reporter) -> Vec<Readable> {
    let tasks: Vec<_> = reporter
        .sources
        .iter()
        .map(|source| {
            let source = Arc::clone(source);
            tokio::task::spawn_blocking(move || source.read_meta())
        })
        .collect();

    let mut readable = Vec::with_capacity(tasks.len());
    for (index, task) in tasks.into_iter().enumerate() {
        match task.await {
            Ok(Ok(meta)) => readable.push(Readable { index, meta }),
            Ok(Err(source)) => reporter.report(index, Err(StoreError::ReadMeta { source })),
            Err(e) => reporter.report(index, Err(e).context(InterruptedSnafu)),
        }
    }
    readable
}

/// Group the transfer syntaxes of the given files by SOP class,
/// in order of appearance.
fn presentation_contexts<'a>(
    metas: impl IntoIterator<Item = &'a FileMetaTable>,
) -> Result<Vec<(String, Vec<String>)>> {
    let mut contexts: Vec<(String, Vec<String>)> = Vec::new();
    for meta in metas {
        let sop_class_uid = meta.media_storage_sop_class_uid();
        let transfer_syntax = meta.transfer_syntax();
        let i = match contexts.iter().position(|(uid, _)| uid == sop_class_uid) {
            Some(i) => i,
            None => {
                contexts.push((sop_class_uid.to_string(), Vec::new()));
                contexts.len() - 1
            }
        };
        let syntaxes = &mut contexts[i].1;
        if !transfer_syntax.is_empty() && !syntaxes.iter().any(|ts| ts == transfer_syntax) {
            syntaxes.push(transfer_syntax.to_string());
        }
    }

    if let Some((sop_class_uid, _)) = contexts.iter().find(|(_, ts)| ts.is_empty()) {
        return NoTransferSyntaxSnafu { sop_class_uid }.fail();
    }
    debug!("Proposed presentation contexts: {:?}", contexts);
    Ok(contexts)
}

async fn store_one(
    association: &mut Association,
    source: &StoreSource,
    meta: &FileMetaTable,
) -> Result<Status, StoreError> {
    let sop_class_uid = meta.media_storage_sop_class_uid();
    let transfer_syntax = meta.transfer_syntax();
    let pc_id = association
        .find_context(sop_class_uid, transfer_syntax)
        .map(|pc| pc.id)
        .context(NoPresentationContextSnafu {
            sop_class_uid,
            transfer_syntax,
        })?;

    let file = source.load().await?;
    let message_id = association.next_message_id();
    let command = CommandMessage::c_store_rq(
        message_id,
        Priority::Medium,
        sop_class_uid,
        meta.media_storage_sop_instance_uid(),
    );
    debug!(
        "Sending {} as message {} on presentation context {}",
        source, message_id, pc_id
    );
    let response = association
        .request(pc_id, &command, Some(&file.dataset[..]))
        .await
        .context(AssociationSnafu)?;

    let status = response.status().unwrap_or(Status::UNABLE_TO_PROCESS);
    if status.is_success() || status.is_warning() {
        Ok(status)
    } else {
        FailedSnafu { status }.fail()
    }
}
