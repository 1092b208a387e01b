use crate::prelude::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};

/// ECHONET Lite property code for the measured instantaneous electric power.
pub const MEASURED_INSTANTANEOUS_EPC: u32 = 231;

/// One registered appliance as returned by `GET /1/appliances`.
///
/// Only the smart-meter block is modelled; every other field of the
/// response is ignored. Appliances that are not smart meters report
/// `smart_meter: null` or omit it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Appliance {
    #[serde(default)]
    pub smart_meter: Option<SmartMeter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SmartMeter {
    #[serde(default)]
    pub echonetlite_properties: Vec<EchonetLiteProperty>,
}

/// A `(name, epc, val)` triple; the value is always transmitted as a string.
///
/// Missing fields decode to their zero value so that one incomplete property
/// does not hide the one the panel needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EchonetLiteProperty {
    pub name: String,
    pub epc: u32,
    pub val: String,
}

impl Appliance {
    pub fn properties(&self) -> &[EchonetLiteProperty] {
        self.smart_meter
            .as_ref()
            .map(|meter| meter.echonetlite_properties.as_slice())
            .unwrap_or_default()
    }

    /// First property carrying `epc`, if any.
    pub fn property(&self, epc: u32) -> Option<&EchonetLiteProperty> {
        self.properties().iter().find(|property| property.epc == epc)
    }
}

/// Extracts the instantaneous power in watts from the appliance list.
///
/// The household has exactly one appliance connected to the Remo; any other
/// count is rejected before the properties are looked at.
pub fn instantaneous_power(appliances: &[Appliance]) -> PipelineResult<f64> {
    let [appliance] = appliances else {
        return Err(PipelineError::TopologyMismatch(appliances.len()));
    };

    let property = appliance
        .property(MEASURED_INSTANTANEOUS_EPC)
        .ok_or(PipelineError::MeasurementNotFound(MEASURED_INSTANTANEOUS_EPC))?;

    property
        .val
        .parse::<f64>()
        .map_err(|source| PipelineError::ValueParse {
            value: property.val.clone(),
            source,
        })
}
