use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub environment_valid: bool,
    pub missing_credentials: Vec<String>,
    pub dependencies_valid: bool,
    pub missing_dependencies: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub message: String,
    pub timestamp: i64,
}

impl PingResponse {
    pub fn at(timestamp: i64) -> Self {
        Self {
            status: "success",
            message: "audiogen service is working".to_string(),
            timestamp,
        }
    }
}
