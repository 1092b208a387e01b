use std::num::ParseFloatError;

/// Failure reported by an injected network or storage capability.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Common error type for every pipeline stage.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("telemetry request failed: {0}")]
    FetchTransport(#[source] TransportError),
    #[error("telemetry body is not valid appliance json: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("exactly one telemetry-connected appliance expected, found {0}")]
    TopologyMismatch(usize),
    #[error("no instantaneous power property (epc {0}) reported")]
    MeasurementNotFound(u32),
    #[error("measurement value {value:?} is not a number: {source}")]
    ValueParse {
        value: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("bundled font could not be loaded: {0}")]
    FontLoad(String),
    #[error("jpeg encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("storage service unavailable: {0}")]
    ServiceInit(#[source] TransportError),
    #[error("listing destination folder failed: {0}")]
    List(#[source] TransportError),
    #[error("deleting stale file {id} failed: {source}")]
    Delete {
        id: String,
        #[source]
        source: TransportError,
    },
    #[error("uploading file failed: {0}")]
    Upload(#[source] TransportError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// One step of the fetch, render, publish chain.
///
/// Each stage consumes the previous stage's output and either hands its own
/// result forward or stops the run with a [`PipelineError`].
pub trait PipelineStage {
    type Input;
    type Output;

    fn name(&self) -> &'static str;
    fn execute(&mut self, input: Self::Input) -> PipelineResult<Self::Output>;
}

/// Turns a non-2xx reply into [`TransportError::Status`], keeping the body for diagnostics.
pub(crate) fn ensure_success(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(TransportError::Status {
        status: status.as_u16(),
        body: response.text().unwrap_or_default(),
    })
}
