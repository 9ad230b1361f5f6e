//! Property Refresh Job
//!
//! Re-ingests every URL-tracked property once per interval (default daily).
//! Properties are refreshed one at a time with a pause in between; a
//! failing property is logged and the pass moves on.

use std::sync::Arc;
use tokio::time::{interval_at, Instant};
use tracing::{error, info};

use crate::config::RefreshConfig;
use crate::services::property_service::PropertyService;

/// Start the property refresh job
///
/// Spawns a background task whose first pass runs one interval after
/// startup. Does nothing when the job is disabled.
pub async fn start_property_refresh_job(service: Arc<PropertyService>, config: RefreshConfig) {
    if !config.enabled {
        info!("Property refresh job disabled (PROPERTY_REFRESH_ENABLED=false)");
        return;
    }

    tokio::spawn(async move {
        info!(
            interval_secs = config.interval.as_secs(),
            delay_ms = config.delay.as_millis() as u64,
            "Property refresh job started"
        );

        let mut ticker = interval_at(Instant::now() + config.interval, config.interval);

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, stopping property refresh job");
                    break;
                }
                _ = ticker.tick() => {
                    info!("Starting scheduled property refresh");

                    match service.refresh_all(config.delay).await {
                        Ok(summary) => info!(
                            refreshed = summary.refreshed,
                            failed = summary.failed,
                            "Scheduled property refresh complete"
                        ),
                        Err(e) => {
                            error!(error = %e, "Scheduled property refresh failed");
                            // Next interval will retry
                        }
                    }
                }
            }
        }

        info!("Property refresh job stopped");
    });
}
