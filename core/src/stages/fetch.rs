use crate::prelude::{PipelineError, PipelineResult, PipelineStage};
use crate::remo_api::{instantaneous_power, Appliance, TelemetrySource};
use log::info;
use std::sync::Arc;

/// Reads the household's instantaneous power from the telemetry source.
pub struct FetchStage {
    source: Arc<dyn TelemetrySource>,
}

impl FetchStage {
    pub fn new(source: Arc<dyn TelemetrySource>) -> Self {
        Self { source }
    }

    pub fn fetch(&self) -> PipelineResult<f64> {
        let body = self
            .source
            .appliances_body()
            .map_err(PipelineError::FetchTransport)?;
        let appliances: Vec<Appliance> = serde_json::from_slice(&body)?;
        let watts = instantaneous_power(&appliances)?;
        info!("instantaneous power {} W", watts);
        Ok(watts)
    }
}

impl PipelineStage for FetchStage {
    type Input = ();
    type Output = f64;

    fn name(&self) -> &'static str {
        "fetch"
    }

    fn execute(&mut self, _input: ()) -> PipelineResult<f64> {
        self.fetch()
    }
}
