//! Liveness endpoint for the hosting platform.

use tracing::info;
use warp::Filter;

fn route() -> impl Filter<Extract = (&'static str,), Error = warp::Rejection> + Clone {
    warp::path::end().and(warp::get()).map(|| "OK")
}

/// Serve `GET /` -> 200 `OK` on all interfaces. Runs until the process
/// exits; callers spawn it next to the bot dispatcher.
pub async fn serve(port: u16) {
    info!("Health endpoint listening on http://0.0.0.0:{}", port);
    warp::serve(route()).run(([0, 0, 0, 0], port)).await;
}
