use crate::drive::store::{DriveStore, RemoteFile};
use crate::prelude::TransportError;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredFile {
    id: String,
    folder_id: String,
    name: String,
    content: Vec<u8>,
}

#[derive(Default)]
struct Folders {
    files: Vec<StoredFile>,
    next_id: u64,
}

/// In-process store with Drive semantics (duplicate names allowed).
#[derive(Default)]
pub struct MemoryDrive {
    inner: Mutex<Folders>,
}

impl MemoryDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry directly, bypassing the capability interface.
    pub fn insert(&self, folder_id: &str, name: &str, content: &[u8]) -> RemoteFile {
        let mut folders = self.lock();
        folders.next_id += 1;
        let file = StoredFile {
            id: format!("mem-{}", folders.next_id),
            folder_id: folder_id.to_string(),
            name: name.to_string(),
            content: content.to_vec(),
        };
        let remote = RemoteFile {
            id: file.id.clone(),
            name: file.name.clone(),
        };
        folders.files.push(file);
        remote
    }

    /// Contents of every entry in `folder_id` called `name`, oldest first.
    pub fn contents_named(&self, folder_id: &str, name: &str) -> Vec<Vec<u8>> {
        self.lock()
            .files
            .iter()
            .filter(|file| file.folder_id == folder_id && file.name == name)
            .map(|file| file.content.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Folders> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DriveStore for MemoryDrive {
    fn list(&self, folder_id: &str, page_size: usize) -> Result<Vec<RemoteFile>, TransportError> {
        Ok(self
            .lock()
            .files
            .iter()
            .filter(|file| file.folder_id == folder_id)
            .take(page_size)
            .map(|file| RemoteFile {
                id: file.id.clone(),
                name: file.name.clone(),
            })
            .collect())
    }

    fn delete(&self, file_id: &str) -> Result<(), TransportError> {
        let mut folders = self.lock();
        let before = folders.files.len();
        folders.files.retain(|file| file.id != file_id);
        if folders.files.len() == before {
            return Err(TransportError::Status {
                status: 404,
                body: format!("file {file_id} not found"),
            });
        }
        Ok(())
    }

    fn create(
        &self,
        folder_id: &str,
        name: &str,
        content: &[u8],
    ) -> Result<RemoteFile, TransportError> {
        Ok(self.insert(folder_id, name, content))
    }
}
