use clap::Parser;
use dcmnet_node::{Connection, ConnectionOptions, PeerOptions, StoreSource};
use dcmnet_ul::AeAddr;
use snafu::prelude::*;
use snafu::{Report, Whatever};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use walkdir::WalkDir;

/// DICOM C-STORE SCU
#[derive(Debug, Parser)]
#[command(version)]
struct App {
    /// socket address to Store SCP,
    /// optionally with AE title
    /// (example: "STORE-SCP@127.0.0.1:104")
    addr: String,
    /// the DICOM file(s) to store,
    /// directories are searched recursively
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// verbose mode
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
    /// the calling Application Entity title
    #[arg(long = "calling-ae-title", default_value = "STORE-SCU")]
    calling_ae_title: String,
    /// the called Application Entity title,
    /// overrides AE title in address if present [default: ANY-SCP]
    #[arg(long = "called-ae-title")]
    called_ae_title: Option<String>,
    /// the maximum PDU length accepted by the SCU
    #[arg(
        long = "max-pdu-length",
        default_value = "16384",
        value_parser(clap::value_parser!(u32).range(4096..=131_072))
    )]
    max_pdu_length: u32,
    /// time limit for connecting to the SCP, in seconds
    #[arg(long = "timeout")]
    timeout: Option<u64>,
}

fn main() {
    run().unwrap_or_else(|e| {
        error!("{}", Report::from_error(e));
        std::process::exit(-2);
    });
}

fn run() -> Result<(), Whatever> {
    let App {
        addr,
        files,
        verbose,
        calling_ae_title,
        called_ae_title,
        max_pdu_length,
        timeout,
    } = App::parse();

    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
            .finish(),
    )
    .whatever_context("Could not set up global logging subscriber")
    .unwrap_or_else(|e: Whatever| {
        eprintln!("[ERROR] {}", Report::from_error(e));
    });

    let (called_ae_title, host, port) = parse_address(&addr, called_ae_title)?;

    let files = collect_files(files);
    if files.is_empty() {
        whatever!("No files to transfer");
    }
    let total = files.len();

    let mut options = ConnectionOptions::new()
        .calling_ae_title(calling_ae_title)
        .max_pdu_length(max_pdu_length);
    if let Some(timeout) = timeout {
        options = options.connection_timeout(Duration::from_secs(timeout));
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .whatever_context("Could not start async runtime")?;

    let failed = runtime.block_on(async move {
        let connection = Connection::new(options);
        let added = connection.add_peer(
            PeerOptions::new(called_ae_title.as_str(), host.as_str(), port).default_peer(true),
        );
        ensure_whatever!(added, "Invalid peer address {}@{}:{}", called_ae_title, host, port);

        info!("Sending {} files to {}@{}:{}", total, called_ae_title, host, port);
        store_files(&connection, files).await
    })?;

    if failed > 0 {
        whatever!("{} of {} files could not be stored", failed, total);
    }
    info!("All {} files stored", total);
    Ok(())
}

/// Send all files and report each outcome,
/// returning the number of files which could not be stored.
async fn store_files(connection: &Connection, files: Vec<PathBuf>) -> Result<usize, Whatever> {
    let sources = files.into_iter().map(StoreSource::File).collect();
    let mut handle = connection.store_instances(sources);

    let mut failed = 0;
    while let Some(outcome) = handle.next_outcome().await {
        match outcome.result {
            Ok(status) if status.is_warning() => {
                warn!(
                    "Possible issue storing {} (status code {})",
                    outcome.source, status
                );
            }
            Ok(_) => {}
            Err(e) => {
                failed += 1;
                error!("Failed to store {}: {}", outcome.source, Report::from_error(e));
            }
        }
    }
    handle
        .finish()
        .await
        .whatever_context("Could not transfer files")?;
    Ok(failed)
}

/// Split an `AE@host:port` or `host:port` address into its parts.
fn parse_address(
    addr: &str,
    called_ae_title: Option<String>,
) -> Result<(String, String, u16), Whatever> {
    let addr: AeAddr<String> = addr
        .parse()
        .whatever_context("Could not parse address")?;
    let (ae_title, socket_addr) = addr.into_parts();
    let ae_title = called_ae_title
        .or(ae_title)
        .unwrap_or_else(|| "ANY-SCP".to_string());

    let (host, port) = socket_addr
        .rsplit_once(':')
        .with_whatever_context(|| format!("Missing port in address `{}`", socket_addr))?;
    let port = port
        .parse::<u16>()
        .with_whatever_context(|_| format!("Invalid port `{}`", port))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    ensure_whatever!(!host.is_empty(), "Missing host in address `{}`", socket_addr);
    Ok((ae_title, host.to_string(), port))
}

/// Expand directories into the files within,
/// leaving out DICOMDIR files.
fn collect_files(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(
                WalkDir::new(&path)
                    .into_iter()
                    .filter_map(Result::ok)
                    .filter(|f| !f.file_type().is_dir())
                    .map(|f| f.into_path()),
            );
        } else {
            files.push(path);
        }
    }
    files.retain(|file| file.file_name() != Some(OsStr::new("DICOMDIR")));
    files
}
