//! Filesystem template source.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::{ReportError, TemplateSource};

/// Loads templates from a directory.
#[derive(Debug, Clone)]
pub struct FsTemplateSource {
    dir: PathBuf,
}

impl FsTemplateSource {
    /// Create a source reading from `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Resolve a template name to a path inside the directory.
    ///
    /// Only plain file names are accepted.
    fn resolve(&self, name: &str) -> Result<PathBuf, ReportError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(file)), None) if !name.contains(['/', '\\']) => {
                Ok(self.dir.join(file))
            }
            _ => Err(ReportError::InvalidTemplateName(name.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl TemplateSource for FsTemplateSource {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, ReportError> {
        let path = self.resolve(name)?;
        debug!("Reading template {}", path.display());
        tokio::fs::read(&path)
            .await
            .map_err(|e| ReportError::TemplateFetch {
                template: name.to_string(),
                message: format!("{}: {e}", path.display()),
            })
    }
}
