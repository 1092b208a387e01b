use anyhow::Context;
use clap::Parser;
use log::info;
use remocore::drive::{GoogleDrive, LocalFolder};
use remocore::remo_api::RemoClient;
use remocore::{DriveStore, TelemetrySource};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use trigger::bridge::TriggerBridge;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod trigger;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Nature Remo power panel generator")]
struct Args {
    /// Load the workflow config from YAML instead of the environment
    #[arg(long)]
    config: Option<PathBuf>,
    /// Publish into a local directory instead of Google Drive
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Keep serving Pub/Sub push triggers instead of running once
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = &args.config {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_env().context("reading workflow config from environment")?
    };

    let source: Arc<dyn TelemetrySource> = Arc::new(
        RemoClient::new(workflow_config.remo_api_token.as_str())
            .context("creating Nature Remo client")?,
    );
    let store: Arc<dyn DriveStore> = match &args.output_dir {
        Some(dir) => {
            info!("publishing into {}", dir.display());
            Arc::new(LocalFolder::new(dir))
        }
        None => Arc::new(
            GoogleDrive::new(workflow_config.drive_access_token.clone())
                .context("creating Google Drive client")?,
        ),
    };

    let runner = Arc::new(Runner::new(workflow_config, source, store));

    if args.serve {
        TriggerBridge::new(runner.clone()).serve(args.bind)?;
    } else {
        runner.execute()?;
        info!("panel published");
    }

    Ok(())
}
