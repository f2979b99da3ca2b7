//! Where received files land on disk.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use ferry_protocol::{ProtocolError, validate_file_name};

/// Default directory for received files.
pub const DEFAULT_SAVE_DIR: &str = "server_files";

/// Default directory for sampled copies.
pub const DEFAULT_SAMPLE_DIR: &str = "server_sampling";

/// Default prefix prepended to every stored file name.
pub const DEFAULT_FILE_PREFIX: &str = "server_received_";

/// Directory layout for stored and sampled files.
///
/// A file named `a.bin` is stored as `<save_dir>/<prefix>a.bin`, and its
/// sampled copy (if any) as `<sample_dir>/<prefix>a.bin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub save_dir: PathBuf,
    pub sample_dir: PathBuf,
    pub prefix: String,
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from(DEFAULT_SAVE_DIR),
            sample_dir: PathBuf::from(DEFAULT_SAMPLE_DIR),
            prefix: DEFAULT_FILE_PREFIX.into(),
        }
    }
}

impl StorageLayout {
    /// Creates both directories if they do not exist yet.
    pub async fn ensure_dirs(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.save_dir).await?;
        tokio::fs::create_dir_all(&self.sample_dir).await?;
        Ok(())
    }

    /// Path of the stored copy of a peer-supplied file name.
    pub fn output_path(&self, name: &str) -> Result<PathBuf, ProtocolError> {
        Ok(self.save_dir.join(self.stored_name(name)?))
    }

    /// Path of the sampled copy of a peer-supplied file name.
    pub fn sample_path(&self, name: &str) -> Result<PathBuf, ProtocolError> {
        Ok(self.sample_dir.join(self.stored_name(name)?))
    }

    fn stored_name(&self, name: &str) -> Result<String, ProtocolError> {
        validate_file_name(name)?;
        let stored = format!("{}{name}", self.prefix);
        // The prefix comes from config; the combination must still be flat.
        validate_file_name(&stored)?;
        Ok(stored)
    }
}

/// Output side of a session: the stored file plus an optional sample copy.
///
/// Every chunk written goes to both files.
pub(crate) struct SampleTee {
    primary: BufWriter<File>,
    sample: Option<BufWriter<File>>,
}

impl SampleTee {
    /// Creates (truncating) the output file and, if given, the sample file.
    pub(crate) fn create(output: &Path, sample: Option<&Path>) -> io::Result<Self> {
        let primary = BufWriter::new(File::create(output)?);
        let sample = sample
            .map(|p| File::create(p).map(BufWriter::new))
            .transpose()?;
        Ok(Self { primary, sample })
    }

    /// Flushes and syncs both files to disk.
    pub(crate) fn finish(self) -> io::Result<()> {
        let primary = self.primary.into_inner().map_err(|e| e.into_error())?;
        primary.sync_all()?;
        if let Some(sample) = self.sample {
            let sample = sample.into_inner().map_err(|e| e.into_error())?;
            sample.sync_all()?;
        }
        Ok(())
    }
}

impl Write for SampleTee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // write_all keeps both files at the same length.
        self.primary.write_all(buf)?;
        if let Some(sample) = self.sample.as_mut() {
            sample.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.primary.flush()?;
        if let Some(sample) = self.sample.as_mut() {
            sample.flush()?;
        }
        Ok(())
    }
}
