use axum::routing::get;
use axum::Router;

pub mod data_source;
mod liveness;
mod readiness;
mod version;

pub use data_source::{DataSource, DataSourceError};

/// Status routes, nested under `/_status` by both services.
pub fn router<S>(state: S) -> Router<S>
where
    S: DataSource + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/livez", get(liveness::handler))
        .route("/readyz", get(readiness::handler::<S>))
        .route("/version", get(version::handler))
        .with_state(state)
}
