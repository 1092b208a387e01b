use crate::prelude::TransportError;
use serde::{Deserialize, Serialize};

/// Largest page requested when listing a destination folder.
pub const LIST_PAGE_SIZE: usize = 1000;

/// A file entry inside a destination folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
}

/// Folder-scoped file storage.
///
/// Names are not unique: a folder may hold several entries with the same
/// name, each with its own id. Backends must tolerate that.
pub trait DriveStore: Send + Sync {
    /// Acquires whatever the backend needs before the first call of a run.
    fn prepare(&self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Lists up to `page_size` entries whose parent is `folder_id`.
    fn list(&self, folder_id: &str, page_size: usize) -> Result<Vec<RemoteFile>, TransportError>;

    fn delete(&self, file_id: &str) -> Result<(), TransportError>;

    /// Creates a new entry; never overwrites an existing one.
    fn create(
        &self,
        folder_id: &str,
        name: &str,
        content: &[u8],
    ) -> Result<RemoteFile, TransportError>;
}
