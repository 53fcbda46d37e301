use crate::domain::ports::TicketStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Keeps one `ta-<service>.xml` per service under a directory.
#[derive(Debug, Clone)]
pub struct FileTicketStore {
    base_path: PathBuf,
}

impl FileTicketStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn path_for(&self, service: &str) -> PathBuf {
        let safe: String = service
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.base_path.join(format!("ta-{}.xml", safe))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait]
impl TicketStore for FileTicketStore {
    async fn load(&self, service: &str) -> Result<Option<String>> {
        let path = self.path_for(service);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, service: &str, ticket_xml: &str) -> Result<()> {
        let path = self.path_for(service);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write then rename so a crash never leaves half a ticket behind.
        let tmp = path.with_extension("xml.tmp");
        tokio::fs::write(&tmp, ticket_xml).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
