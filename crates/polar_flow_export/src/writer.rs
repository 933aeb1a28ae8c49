//! Writes downloaded activities into the output directory.

use async_trait::async_trait;
use polar_flow_client::{ActivityRecord, ActivitySink, PolarFlowError};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug)]
pub struct TcxDirectoryWriter {
    output_dir: PathBuf,
    written: Vec<PathBuf>,
}

impl TcxDirectoryWriter {
    /// Create `output_dir` (and its parents) if it does not exist yet.
    pub async fn create(output_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let output_dir = output_dir.into();
        tokio::fs::create_dir_all(&output_dir).await?;
        Ok(Self {
            output_dir,
            written: Vec::new(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Write the record's bytes unchanged, truncating any existing file.
    ///
    /// The file name comes from server data, so a name that could leave the output
    /// directory is rejected with `InvalidInput`.
    pub async fn write_record(&mut self, record: &ActivityRecord) -> std::io::Result<PathBuf> {
        let file_name = record.file_name();
        if !is_plain_file_name(&file_name) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("refusing to write unsafe file name '{file_name}'"),
            ));
        }
        let path = self.output_dir.join(file_name);
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(&record.content).await?;
        file.sync_all().await?;
        self.written.push(path.clone());
        Ok(path)
    }
}

/// A single path component: no separators, no NUL, not `.` or `..`.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[async_trait]
impl ActivitySink for TcxDirectoryWriter {
    async fn accept(&mut self, record: &ActivityRecord) -> Result<(), PolarFlowError> {
        let path = self.write_record(record).await?;
        tracing::debug!(path = %path.display(), bytes = record.content.len(), "wrote TCX file");
        println!("Wrote file {}", record.file_name());
        Ok(())
    }
}
