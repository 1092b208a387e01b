use std::net::SocketAddr;
use std::sync::mpsc;
use std::thread;
use tokio::runtime::Builder;
use warp::{Filter, Rejection, Reply};

/// Serves `routes` on an ephemeral localhost port from a background thread.
///
/// The server lives until the test process exits, so blocking clients can be
/// driven from ordinary `#[test]` functions.
pub(crate) fn spawn<F, R>(routes: F) -> SocketAddr
where
    F: Filter<Extract = (R,), Error = Rejection> + Clone + Send + Sync + 'static,
    R: Reply,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("failed to build runtime");
        runtime.block_on(async move {
            let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
            tx.send(addr).expect("test waiting for address");
            server.await;
        });
    });
    rx.recv().expect("test server did not start")
}
