use serde::Serialize;

use crate::covers::CoverService;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub cached_covers: usize,
    pub probes_in_flight: usize,
    pub client_generation: Option<u64>,
}

impl HealthStatus {
    pub fn collect(service: &CoverService) -> Self {
        Self {
            status: "healthy".to_string(),
            service: "homedeck".to_string(),
            cached_covers: service.cache().len(),
            probes_in_flight: service.cache().inflight(),
            client_generation: service.registry().current_generation(),
        }
    }
}
