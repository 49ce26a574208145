use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use dcmnet_dimse::Status;
use dcmnet_node::{Connection, ConnectionOptions, PeerOptions, StoreRequest, StoreServiceProvider};
use dcmnet_object::FileMetaTableBuilder;
use snafu::{ensure_whatever, Report, ResultExt, Whatever};
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Refused: out of resources
const OUT_OF_RESOURCES: Status = Status(0xA700);

/// Whether a UID is made only of digits and dots,
/// and so can name a file within the output directory.
fn is_valid_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid.len() <= 64
        && uid.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && !uid.starts_with('.')
}

/// DICOM C-STORE SCP
#[derive(Debug, Parser)]
#[command(version)]
struct App {
    /// Verbose mode
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
    /// Calling Application Entity title
    #[arg(long = "calling-ae-title", default_value = "STORE-SCP")]
    calling_ae_title: String,
    /// Enforce max pdu length
    #[arg(short = 's', long = "strict")]
    strict: bool,
    /// Accept unknown SOP classes
    #[arg(long)]
    promiscuous: bool,
    /// Maximum PDU length
    #[arg(
        short = 'm',
        long = "max-pdu-length",
        default_value = "16384",
        value_parser(clap::value_parser!(u32).range(4096..=131_072))
    )]
    max_pdu_length: u32,
    /// Output directory for incoming objects,
    /// objects are only acknowledged if absent
    #[arg(short = 'o', long = "out-dir")]
    out_dir: Option<PathBuf>,
    /// Which port to listen on
    #[arg(short, long, default_value = "11111")]
    port: u16,
    /// Stop listening once the first connection closes
    #[arg(long = "close-on-disconnect")]
    close_on_disconnect: bool,
}

/// A store provider writing every instance to a DICOM file.
#[derive(Debug)]
struct FileStore {
    out_dir: PathBuf,
}

impl FileStore {
    fn write(&self, request: StoreRequest<'_>) -> Result<PathBuf, Whatever> {
        let meta = FileMetaTableBuilder::new()
            .media_storage_sop_class_uid(request.sop_class_uid)
            .media_storage_sop_instance_uid(request.sop_instance_uid)
            .transfer_syntax(request.transfer_syntax)
            .source_application_entity_title(request.calling_ae_title)
            .build()
            .whatever_context("Could not build file meta group")?;

        let path = self
            .out_dir
            .join(format!("{}.dcm", request.sop_instance_uid));
        let file = File::create(&path)
            .with_whatever_context(|_| format!("Could not create file {}", path.display()))?;
        let mut file = BufWriter::new(file);
        file.write_all(&[0; 128])
            .whatever_context("Could not write preamble")?;
        meta.write(&mut file)
            .whatever_context("Could not write file meta group")?;
        file.write_all(request.data)
            .whatever_context("Could not write data set")?;
        file.flush().whatever_context("Could not write data set")?;
        Ok(path)
    }
}

impl StoreServiceProvider for FileStore {
    fn store(&self, request: StoreRequest<'_>) -> Status {
        if !is_valid_uid(request.sop_instance_uid) {
            error!(
                "Refusing instance with invalid SOP Instance UID {:?} from {}",
                request.sop_instance_uid, request.calling_ae_title
            );
            return Status::UNABLE_TO_PROCESS;
        }
        // file system calls must not stall the async workers
        match tokio::task::block_in_place(|| self.write(request)) {
            Ok(path) => {
                info!("Stored {}", path.display());
                Status::SUCCESS
            }
            Err(e) => {
                error!("{}", Report::from_error(e));
                OUT_OF_RESOURCES
            }
        }
    }
}

fn main() {
    run().unwrap_or_else(|e| {
        error!("{}", Report::from_error(e));
        std::process::exit(-2);
    });
}

fn run() -> Result<(), Whatever> {
    let app = App::parse();
    let level = if app.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(level)
            .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
            .finish(),
    )
    .whatever_context("Could not set up global logging subscriber")
    .unwrap_or_else(|e: Whatever| {
        eprintln!("[ERROR] {}", Report::from_error(e));
    });

    if let Some(out_dir) = &app.out_dir {
        std::fs::create_dir_all(out_dir)
            .whatever_context("Could not create output directory")?;
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .whatever_context("Could not start async runtime")?
        .block_on(serve(app))
}

async fn serve(app: App) -> Result<(), Whatever> {
    let connection = Connection::new(
        ConnectionOptions::new()
            .max_pdu_length(app.max_pdu_length)
            .strict(app.strict),
    );

    let mut peer = PeerOptions::new(app.calling_ae_title.as_str(), "0.0.0.0", app.port)
        .server(true)
        .default_peer(true)
        .promiscuous(app.promiscuous)
        .close_on_disconnect(app.close_on_disconnect);
    if let Some(out_dir) = app.out_dir {
        peer = peer.provider(FileStore { out_dir });
    }
    ensure_whatever!(
        connection.add_peer(peer),
        "Could not listen on port {}",
        app.port
    );

    tokio::select! {
        interrupted = tokio::signal::ctrl_c() => {
            interrupted.whatever_context("Could not wait for interruption")?;
            info!("Interrupted, shutting down");
        }
        _ = connection.stopped_listening(&app.calling_ae_title) => {
            info!("Connection closed, shutting down");
        }
    }
    connection.reset();
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{is_valid_uid, App, FileStore};
    use clap::CommandFactory;
    use dcmnet_core::VR;
    use dcmnet_dictionary_std::{tags, uids};
    use dcmnet_dimse::Status;
    use dcmnet_encoding::transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN;
    use dcmnet_node::{StoreRequest, StoreServiceProvider};
    use dcmnet_object::{open_file, InMemDicomObject};

    #[test]
    fn verify_cli() {
        App::command().debug_assert();
    }

    #[test]
    fn file_store_writes_readable_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut obj = InMemDicomObject::new_empty();
        obj.put_str(tags::SOP_CLASS_UID, VR::UI, uids::CT_IMAGE_STORAGE);
        obj.put_str(tags::SOP_INSTANCE_UID, VR::UI, "2.25.42");
        obj.put_str(tags::PATIENT_NAME, VR::PN, "Doe^Jane");
        let mut data = Vec::new();
        obj.write_dataset_with_ts(&mut data, &EXPLICIT_VR_LITTLE_ENDIAN)
            .unwrap();

        let provider = FileStore {
            out_dir: dir.path().to_path_buf(),
        };
        let status = provider.store(StoreRequest {
            calling_ae_title: "STORE-SCU",
            sop_class_uid: uids::CT_IMAGE_STORAGE,
            sop_instance_uid: "2.25.42",
            transfer_syntax: uids::EXPLICIT_VR_LITTLE_ENDIAN,
            data: &data,
        });
        assert_eq!(status, Status::SUCCESS);

        let file = open_file(dir.path().join("2.25.42.dcm")).unwrap();
        assert_eq!(file.meta().media_storage_sop_instance_uid(), "2.25.42");
        assert_eq!(
            file.element(tags::PATIENT_NAME).unwrap().to_str().unwrap(),
            "Doe^Jane"
        );
    }

    #[test]
    fn unwritable_directory_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileStore {
            out_dir: dir.path().join("missing"),
        };
        let status = provider.store(StoreRequest {
            calling_ae_title: "STORE-SCU",
            sop_class_uid: uids::CT_IMAGE_STORAGE,
            sop_instance_uid: "2.25.43",
            transfer_syntax: uids::EXPLICIT_VR_LITTLE_ENDIAN,
            data: &[],
        });
        assert!(status.is_failure());
    }

    #[test]
    fn uids_are_checked_before_naming_files() {
        assert!(is_valid_uid("1.2.840.10008.5.1.4.1.1.2"));
        assert!(!is_valid_uid(""));
        assert!(!is_valid_uid("../escaped"));
        assert!(!is_valid_uid("/tmp/x"));
        assert!(!is_valid_uid(".."));

        let root = tempfile::tempdir().unwrap();
        let out_dir = root.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();
        let provider = FileStore {
            out_dir: out_dir.clone(),
        };
        let status = provider.store(StoreRequest {
            calling_ae_title: "STORE-SCU",
            sop_class_uid: uids::CT_IMAGE_STORAGE,
            sop_instance_uid: "../escaped",
            transfer_syntax: uids::EXPLICIT_VR_LITTLE_ENDIAN,
            data: &[],
        });
        assert!(status.is_failure());
        assert!(!root.path().join("escaped.dcm").exists());
        assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 0);
    }
}
