use crate::trigger::model::{PushEnvelope, TriggerReply};
use crate::workflow::runner::Runner;
use anyhow::Context;
use log::{debug, error, info};
use std::{net::SocketAddr, sync::Arc};
use tokio::runtime::Builder;
use tokio::signal;
use warp::{http::StatusCode, Filter, Rejection, Reply};

/// HTTP front that runs the pipeline once per Pub/Sub push.
pub struct TriggerBridge {
    runner: Arc<Runner>,
}

impl TriggerBridge {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self { runner }
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let runner = self.runner.clone();
        let runner_filter = warp::any().map(move || runner.clone());

        let trigger_route = warp::path("trigger")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(runner_filter.clone())
            .and_then(handle_push);

        let status_route = warp::path("status")
            .and(warp::path::end())
            .and(warp::get())
            .and(runner_filter)
            .map(|runner: Arc<Runner>| warp::reply::json(&runner.journal().snapshot()));

        trigger_route.or(status_route)
    }

    /// Serves until Ctrl+C.
    pub fn serve(&self, addr: SocketAddr) -> anyhow::Result<()> {
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("creating runtime for trigger bridge")?;
        let routes = self.routes();
        runtime.block_on(async move {
            let (bound, server) =
                warp::serve(routes).try_bind_with_graceful_shutdown(addr, async {
                    if let Err(err) = signal::ctrl_c().await {
                        error!("awaiting Ctrl+C failed: {}", err);
                    }
                })?;
            info!("trigger bridge listening on {}", bound);
            server.await;
            Ok::<(), warp::Error>(())
        })
        .with_context(|| format!("binding trigger bridge to {addr}"))?;
        info!("trigger bridge stopped");
        Ok(())
    }
}

async fn handle_push(envelope: PushEnvelope, runner: Arc<Runner>) -> Result<impl Reply, Rejection> {
    debug!(
        "push {} from {}",
        envelope.message.message_id.as_deref().unwrap_or("-"),
        envelope.subscription.as_deref().unwrap_or("-")
    );

    let outcome = tokio::task::spawn_blocking(move || runner.execute())
        .await
        .map_err(anyhow::Error::from)
        .and_then(|result| result);

    let (reply, status) = match outcome {
        Ok(()) => (TriggerReply::ok(), StatusCode::OK),
        Err(err) => (
            TriggerReply::failed(format!("{err:#}")),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    };
    Ok(warp::reply::with_status(warp::reply::json(&reply), status))
}
