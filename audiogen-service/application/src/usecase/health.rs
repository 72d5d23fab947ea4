use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use audiogen_domain::DependencyProbe;

use crate::{HealthReport, HealthStatus};

#[async_trait]
pub trait HealthUseCase: Send + Sync {
    async fn check(&self) -> HealthReport;
}

pub struct HealthUseCaseImpl {
    missing_credentials: Vec<String>,
    probes: Vec<Arc<dyn DependencyProbe>>,
}

impl HealthUseCaseImpl {
    pub fn new(missing_credentials: Vec<String>, probes: Vec<Arc<dyn DependencyProbe>>) -> Self {
        Self {
            missing_credentials,
            probes,
        }
    }
}

#[async_trait]
impl HealthUseCase for HealthUseCaseImpl {
    async fn check(&self) -> HealthReport {
        let results = join_all(self.probes.iter().map(|probe| async move {
            (probe.dependency_name(), probe.is_available().await)
        }))
        .await;

        let missing_dependencies = results
            .into_iter()
            .filter(|(_, available)| !available)
            .map(|(name, _)| name.to_string())
            .collect::<Vec<_>>();

        let environment_valid = self.missing_credentials.is_empty();
        let dependencies_valid = missing_dependencies.is_empty();
        let status = if environment_valid && dependencies_valid {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        tracing::debug!(
            ?status,
            environment_valid,
            dependencies_valid,
            "health check completed"
        );

        HealthReport {
            status,
            environment_valid,
            missing_credentials: self.missing_credentials.clone(),
            dependencies_valid,
            missing_dependencies,
        }
    }
}
