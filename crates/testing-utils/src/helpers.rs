//! Async helpers shared by integration tests

use std::time::Duration;

use scheduler_core::SharedTask;
use tokio::time::sleep;

pub struct TestEnv;

impl TestEnv {
    /// Wait for a condition to be true with timeout
    pub async fn wait_for<F, Fut>(mut condition: F, timeout: Duration) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let start = std::time::Instant::now();

        while start.elapsed() < timeout {
            if condition().await {
                return true;
            }
            sleep(Duration::from_millis(10)).await;
        }

        false
    }
}

/// Sorted ids of the given tasks
pub fn task_ids(tasks: &[SharedTask]) -> Vec<String> {
    let mut ids: Vec<String> = tasks.iter().map(|t| t.id().to_string()).collect();
    ids.sort();
    ids
}
