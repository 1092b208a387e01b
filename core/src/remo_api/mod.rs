pub mod appliance;
pub mod client;

pub use appliance::{
    instantaneous_power, Appliance, EchonetLiteProperty, SmartMeter, MEASURED_INSTANTANEOUS_EPC,
};
pub use client::{RemoClient, TelemetrySource, APPLIANCES_ENDPOINT};
