//! Filesystem artifact sink.
//!
//! Artifacts are written to a hidden temporary file in the output directory
//! and renamed into place, so an interrupted write never leaves a truncated
//! report under the final name.

use std::path::PathBuf;

use tracing::{debug, info};

use super::{Artifact, ArtifactSink, ReportError};

/// Saves artifacts into a directory.
#[derive(Debug, Clone)]
pub struct FsArtifactSink {
    dir: PathBuf,
}

impl FsArtifactSink {
    /// Create a sink writing into `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where an artifact with this file name is saved.
    #[must_use]
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    async fn write(&self, artifact: &Artifact) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let target = self.path_for(&artifact.filename);
        let partial = self.dir.join(format!(".{}.partial", artifact.filename));
        debug!("Writing {}", partial.display());

        if let Err(e) = tokio::fs::write(&partial, &artifact.bytes).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&partial, &target).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
        Ok(target)
    }
}

#[async_trait::async_trait]
impl ArtifactSink for FsArtifactSink {
    async fn offer(&self, artifact: &Artifact) -> Result<(), ReportError> {
        let target = self
            .write(artifact)
            .await
            .map_err(|e| ReportError::Delivery {
                filename: artifact.filename.clone(),
                message: e.to_string(),
            })?;
        info!("Saved report to {}", target.display());
        Ok(())
    }
}
