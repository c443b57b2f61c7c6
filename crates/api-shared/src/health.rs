use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response body.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Simple health service for the REST API.
///
/// This service provides a standardised way to check the health status of the
/// fhir-bridge system. It can be used both as a static utility and as an instantiated
/// service.
#[derive(Clone)]
pub struct HealthService;

impl HealthService {
    /// Creates a new instance of HealthService.
    pub fn new() -> Self {
        Self
    }

    /// Static method to check health without creating an instance
    ///
    /// This is the preferred method for health checks as it doesn't require
    /// instantiating the service.
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "fhir-bridge is alive".into(),
        }
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_alive() {
        let res = HealthService::check_health();
        assert!(res.ok);
        assert!(res.message.contains("alive"));
    }
}
