use provflow_cloud::{LifecycleDriver, PollConfig, ResourceKind, ResourceSpec, WaitPolicy};
use provflow_sim::SimulatedCloud;
use std::sync::Arc;
use std::time::Duration;

pub fn driver<K: ResourceKind>(
    sim: SimulatedCloud<K>,
) -> (LifecycleDriver<K, SimulatedCloud<K>>, Arc<SimulatedCloud<K>>) {
    let sim = Arc::new(sim);
    (LifecycleDriver::new(Arc::clone(&sim)), sim)
}

/// One second interval with the given deadline
pub fn wait(deadline_secs: u64) -> WaitPolicy {
    WaitPolicy::Wait(config(deadline_secs))
}

pub fn config(deadline_secs: u64) -> PollConfig {
    PollConfig::new(Duration::from_secs(1)).with_deadline(Duration::from_secs(deadline_secs))
}

pub fn spec(name: &str) -> ResourceSpec {
    ResourceSpec::new(name, serde_json::json!({}))
}
