use crate::drive::{DriveStore, RemoteFile, LIST_PAGE_SIZE};
use crate::prelude::{PipelineError, PipelineResult, PipelineStage};
use crate::stages::render::RenderedImage;
use log::{info, warn};
use std::sync::Arc;

/// Replaces every same-named entry in a folder with fresh content.
///
/// Stale copies are deleted before the upload; a failure in between leaves
/// the folder without the file until the next successful run.
pub struct Publisher {
    store: Arc<dyn DriveStore>,
}

impl Publisher {
    pub fn new(store: Arc<dyn DriveStore>) -> Self {
        Self { store }
    }

    pub fn publish(
        &self,
        content: &[u8],
        folder_id: &str,
        file_name: &str,
    ) -> PipelineResult<RemoteFile> {
        self.store.prepare().map_err(PipelineError::ServiceInit)?;

        let existing = self
            .store
            .list(folder_id, LIST_PAGE_SIZE)
            .map_err(PipelineError::List)?;
        for stale in existing.iter().filter(|file| file.name == file_name) {
            warn!("removing stale {} ({})", stale.name, stale.id);
            self.store
                .delete(&stale.id)
                .map_err(|source| PipelineError::Delete {
                    id: stale.id.clone(),
                    source,
                })?;
        }

        let file = self
            .store
            .create(folder_id, file_name, content)
            .map_err(PipelineError::Upload)?;
        info!("published {} bytes as {} ({})", content.len(), file.name, file.id);
        Ok(file)
    }
}

/// Pipeline stage publishing the rendered panel to a fixed destination.
pub struct PublishStage {
    publisher: Publisher,
    folder_id: String,
    file_name: String,
}

impl PublishStage {
    pub fn new(
        publisher: Publisher,
        folder_id: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            folder_id: folder_id.into(),
            file_name: file_name.into(),
        }
    }
}

impl PipelineStage for PublishStage {
    type Input = RenderedImage;
    type Output = RemoteFile;

    fn name(&self) -> &'static str {
        "publish"
    }

    fn execute(&mut self, image: RenderedImage) -> PipelineResult<RemoteFile> {
        self.publisher
            .publish(&image.bytes, &self.folder_id, &self.file_name)
    }
}
