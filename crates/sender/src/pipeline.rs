//! Sequential multi-file sending.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::client::{SenderOptions, TransferOutcome, send_file};
use crate::error::SenderError;

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// The exchange completed; see the outcome for the verdict.
    Sent(TransferOutcome),
    /// The exchange failed and was not retried.
    Skipped { reason: String },
}

/// Per-file report from [`send_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
}

impl FileReport {
    pub fn is_verified(&self) -> bool {
        matches!(self.status, FileStatus::Sent(outcome) if outcome.is_verified())
    }
}

/// Sends every file in order, one connection each.
///
/// Failures are logged and reported per file; the run always reaches the
/// end of the list.
pub async fn send_files<I>(addr: SocketAddr, paths: I, options: &SenderOptions) -> Vec<FileReport>
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut reports = Vec::new();
    for path in paths {
        let status = match send_file(addr, &path, options).await {
            Ok(outcome @ TransferOutcome::Verified { .. }) => FileStatus::Sent(outcome),
            Ok(outcome @ TransferOutcome::Mismatch { local, remote }) => {
                warn!(
                    path = %path.display(),
                    local = %format!("{local:08x}"),
                    remote = %format!("{remote:016x}"),
                    "checksum mismatch"
                );
                FileStatus::Sent(outcome)
            }
            Err(e) => {
                warn!(path = %path.display(), "skipping file: {e}");
                FileStatus::Skipped {
                    reason: e.to_string(),
                }
            }
        };
        reports.push(FileReport { path, status });
    }

    let verified = reports.iter().filter(|r| r.is_verified()).count();
    info!(total = reports.len(), verified, "send run finished");
    reports
}

/// Regular files directly inside `dir`, sorted by name.
pub async fn source_files(dir: &Path) -> Result<Vec<PathBuf>, SenderError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
