//! Gateway liveness probe

use tracing::info;

use crate::api::HealthReport;
use crate::app::Controller;
use crate::error::ControllerError;

impl Controller {
    /// Ask the gateway whether it and the analysis engine are up
    pub async fn check_health(&self) -> Result<HealthReport, ControllerError> {
        let report = self.backend.health().await?;
        info!(
            "Gateway: {}, analysis engine: {}",
            report.gateway, report.engine
        );
        Ok(report)
    }
}
