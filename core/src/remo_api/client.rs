use crate::prelude::{ensure_success, TransportError};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION};

/// Nature Remo cloud API listing every registered appliance.
pub const APPLIANCES_ENDPOINT: &str = "https://api.nature.global/1/appliances";

/// Capability that returns the raw appliance listing.
///
/// Decoding and validation stay in the fetch stage so that fakes only need
/// to hand back a JSON body.
pub trait TelemetrySource: Send + Sync {
    fn appliances_body(&self) -> Result<Vec<u8>, TransportError>;
}

/// Blocking HTTPS client for the Nature Remo API.
pub struct RemoClient {
    http: Client,
    endpoint: String,
    token: String,
}

impl RemoClient {
    pub fn new(token: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_endpoint(APPLIANCES_ENDPOINT, token)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            http: Client::builder().build()?,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }

    fn request(&self) -> RequestBuilder {
        self.http
            .get(&self.endpoint)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
    }
}

impl TelemetrySource for RemoClient {
    fn appliances_body(&self) -> Result<Vec<u8>, TransportError> {
        debug!("GET {}", self.endpoint);
        let response = ensure_success(self.request().send()?)?;
        let body = response.bytes()?;
        debug!("appliance listing: {} bytes", body.len());
        Ok(body.to_vec())
    }
}
