pub mod command;
pub mod config;
pub mod error;

use std::sync::Arc;

use axum::Router;
use common::types::METRIC_HTTP_REQUESTS_TOTAL;
use common::types::METRIC_HTTP_REQUEST_TIME_SECONDS;
use metadata::MetadataProvider;
use metrics::describe_counter;
use metrics::describe_histogram;
use metrics::Unit;
use metrics_exporter_prometheus::PrometheusBuilder;
use platform::PlatformProvider;

/// Installs the Prometheus recorder with its default http listener.
pub fn init_metrics() -> error::Result<()> {
    PrometheusBuilder::new().install()?;

    describe_counter!(METRIC_HTTP_REQUESTS_TOTAL, "number of http requests");
    describe_histogram!(
        METRIC_HTTP_REQUEST_TIME_SECONDS,
        Unit::Seconds,
        "http request time"
    );

    Ok(())
}

pub fn init_platform(md: Arc<MetadataProvider>, router: Router) -> Router {
    let platform = Arc::new(PlatformProvider::new(md));

    platform::http::attach_routes(router, &platform)
}
