use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use remocore::journal::{RunId, RunJournal, RunState};
use remocore::stages::{FetchStage, PublishStage, Publisher, RenderStage};
use remocore::{DriveStore, PipelineStage, RemoteFile, TelemetrySource, REMO_IMAGE_NAME};
use std::sync::Arc;

/// Drives fetch, render and publish in order, stopping at the first failure.
#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    source: Arc<dyn TelemetrySource>,
    store: Arc<dyn DriveStore>,
    journal: Arc<RunJournal>,
}

impl Runner {
    pub fn new(
        config: WorkflowConfig,
        source: Arc<dyn TelemetrySource>,
        store: Arc<dyn DriveStore>,
    ) -> Self {
        Self {
            config,
            source,
            store,
            journal: Arc::new(RunJournal::new()),
        }
    }

    pub fn journal(&self) -> &RunJournal {
        &self.journal
    }

    pub fn execute(&self) -> anyhow::Result<()> {
        let run = self.journal.begin();
        match self.run_stages(run) {
            Ok(_) => {
                self.journal.advance(run, RunState::Done);
                Ok(())
            }
            Err(err) => {
                self.journal.fail(run, format!("{err:#}"));
                Err(err)
            }
        }
    }

    fn run_stages(&self, run: RunId) -> anyhow::Result<RemoteFile> {
        let mut fetch_stage = FetchStage::new(self.source.clone());
        let watts = fetch_stage
            .execute(())
            .with_context(|| format!("executing {} stage", fetch_stage.name()))?;
        self.journal.advance(run, RunState::Fetched);

        let mut render_stage = RenderStage::new();
        let image = render_stage
            .execute(watts)
            .with_context(|| format!("executing {} stage", render_stage.name()))?;
        self.journal.advance(run, RunState::Rendered);

        let mut publish_stage = PublishStage::new(
            Publisher::new(self.store.clone()),
            self.config.drive_folder_id.as_str(),
            REMO_IMAGE_NAME,
        );
        let file = publish_stage
            .execute(image)
            .with_context(|| format!("executing {} stage", publish_stage.name()))?;
        self.journal.advance(run, RunState::Published);

        Ok(file)
    }
}
