use crate::drive::store::{DriveStore, RemoteFile};
use crate::prelude::TransportError;
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem-backed store rooted at `base_dir`.
///
/// A folder id maps to a subdirectory and a file id is `<folder>/<name>`,
/// so a folder never holds two entries with the same name.
pub struct LocalFolder {
    base_dir: PathBuf,
}

impl LocalFolder {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    fn folder_path(&self, folder_id: &str) -> Result<PathBuf, TransportError> {
        check_component(folder_id)?;
        Ok(self.base_dir.join(folder_id))
    }

    fn file_path(&self, file_id: &str) -> Result<PathBuf, TransportError> {
        let (folder_id, name) = file_id
            .split_once('/')
            .ok_or_else(|| TransportError::Malformed(format!("invalid file id {file_id:?}")))?;
        check_component(name)?;
        Ok(self.folder_path(folder_id)?.join(name))
    }
}

fn check_component(component: &str) -> Result<(), TransportError> {
    if component.is_empty()
        || component == "."
        || component == ".."
        || component.contains(['/', '\\'])
    {
        return Err(TransportError::Malformed(format!(
            "invalid path component {component:?}"
        )));
    }
    Ok(())
}

impl DriveStore for LocalFolder {
    fn prepare(&self) -> Result<(), TransportError> {
        fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }

    fn list(&self, folder_id: &str, page_size: usize) -> Result<Vec<RemoteFile>, TransportError> {
        let dir = self.folder_path(folder_id)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push(RemoteFile {
                id: format!("{folder_id}/{name}"),
                name,
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        files.truncate(page_size);
        Ok(files)
    }

    fn delete(&self, file_id: &str) -> Result<(), TransportError> {
        fs::remove_file(self.file_path(file_id)?)?;
        Ok(())
    }

    fn create(
        &self,
        folder_id: &str,
        name: &str,
        content: &[u8],
    ) -> Result<RemoteFile, TransportError> {
        let id = format!("{folder_id}/{name}");
        let path = self.file_path(&id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(RemoteFile {
            id,
            name: name.to_string(),
        })
    }
}
