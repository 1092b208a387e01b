//! Core pipeline for the Nature Remo power panel.
//!
//! One run reads the instantaneous power of the household smart meter,
//! renders it as large text on a 960x540 JPEG and replaces the copy stored
//! in a Google Drive folder. Stages are plain values driven in sequence;
//! network clients are injected through the [`TelemetrySource`] and
//! [`DriveStore`] capabilities.

pub mod drive;
pub mod journal;
pub mod prelude;
pub mod remo_api;
pub mod stages;

#[cfg(test)]
pub(crate) mod test_server;

pub use drive::{DriveStore, RemoteFile};
pub use prelude::{PipelineError, PipelineResult, PipelineStage, TransportError};
pub use remo_api::TelemetrySource;

/// Name under which the rendered panel is published.
pub const REMO_IMAGE_NAME: &str = "remo.jpeg";
