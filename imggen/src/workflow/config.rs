use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const TOKEN_VAR: &str = "REMO_API_TOKEN";
pub const FOLDER_VAR: &str = "IMG_DRIVE_ID";
pub const DRIVE_TOKEN_VAR: &str = "DRIVE_ACCESS_TOKEN";

#[derive(Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Bearer token for the Nature Remo API.
    pub remo_api_token: String,
    /// Google Drive folder receiving the panel image.
    pub drive_folder_id: String,
    /// Fixed Drive token; the metadata server is asked when absent.
    #[serde(default)]
    pub drive_access_token: Option<String>,
}

impl std::fmt::Debug for WorkflowConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowConfig")
            .field("remo_api_token", &"<redacted>")
            .field("drive_folder_id", &self.drive_folder_id)
            .field(
                "drive_access_token",
                &self.drive_access_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .with_context(|| format!("{key} is not set"))
        };
        let config = Self {
            remo_api_token: required(TOKEN_VAR)?,
            drive_folder_id: required(FOLDER_VAR)?,
            drive_access_token: lookup(DRIVE_TOKEN_VAR).filter(|value| !value.is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.remo_api_token.trim().is_empty(), "remo_api_token is empty");
        ensure!(!self.drive_folder_id.trim().is_empty(), "drive_folder_id is empty");
        Ok(())
    }
}
