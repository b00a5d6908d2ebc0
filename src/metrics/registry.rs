//! In-memory accumulation of counters, gauges and latency samples.

use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Accumulators {
    get_requests: u64,
    post_requests: u64,
    put_requests: u64,
    delete_requests: u64,

    active_users: i64,

    auth_success: u64,
    auth_failure: u64,

    pizza_purchases: u64,
    pizza_failures: u64,
    revenue: f64,

    request_latencies: Vec<f64>,
    pizza_latencies: Vec<f64>,
}

impl Accumulators {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            get_requests: self.get_requests,
            post_requests: self.post_requests,
            put_requests: self.put_requests,
            delete_requests: self.delete_requests,
            active_users: self.active_users,
            auth_success: self.auth_success,
            auth_failure: self.auth_failure,
            pizza_purchases: self.pizza_purchases,
            pizza_failures: self.pizza_failures,
            revenue: self.revenue,
            average_request_latency: average(&self.request_latencies),
            average_pizza_latency: average(&self.pizza_latencies),
        }
    }
}

/// Arithmetic mean, 0 for an empty sample set.
fn average(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Point-in-time copy of every metric the reporter emits.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub get_requests: u64,
    pub post_requests: u64,
    pub put_requests: u64,
    pub delete_requests: u64,
    pub active_users: i64,
    pub auth_success: u64,
    pub auth_failure: u64,
    pub pizza_purchases: u64,
    pub pizza_failures: u64,
    pub revenue: f64,
    pub average_request_latency: f64,
    pub average_pizza_latency: f64,
}

impl Snapshot {
    pub fn total_requests(&self) -> u64 {
        self.get_requests + self.post_requests + self.put_requests + self.delete_requests
    }
}

/// Process-wide metric state, shared as `Arc<MetricsRegistry>` between the
/// HTTP layer and the reporter.
///
/// Every mutator takes the same short critical section, so concurrent request
/// handlers never lose updates and `take_snapshot` observes a consistent view.
/// Inputs are not validated: negative revenue, latency or active-user values
/// are reported as they are.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    state: Mutex<Accumulators>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, Accumulators> {
        // A panic while holding the lock cannot leave the counters half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // HTTP requests

    pub fn increment_get_requests(&self) {
        self.state().get_requests += 1;
    }

    pub fn increment_post_requests(&self) {
        self.state().post_requests += 1;
    }

    pub fn increment_put_requests(&self) {
        self.state().put_requests += 1;
    }

    pub fn increment_delete_requests(&self) {
        self.state().delete_requests += 1;
    }

    pub fn get_requests(&self) -> u64 {
        self.state().get_requests
    }

    pub fn post_requests(&self) -> u64 {
        self.state().post_requests
    }

    pub fn put_requests(&self) -> u64 {
        self.state().put_requests
    }

    pub fn delete_requests(&self) -> u64 {
        self.state().delete_requests
    }

    /// Sum of the four verb counters, computed on every read.
    pub fn total_requests(&self) -> u64 {
        let state = self.state();
        state.get_requests + state.post_requests + state.put_requests + state.delete_requests
    }

    // Active users

    pub fn increment_active_users(&self) {
        self.state().active_users += 1;
    }

    pub fn decrement_active_users(&self) {
        self.state().active_users -= 1;
    }

    pub fn active_users(&self) -> i64 {
        self.state().active_users
    }

    // Auth attempts

    pub fn increment_auth_success(&self) {
        self.state().auth_success += 1;
    }

    pub fn increment_auth_failure(&self) {
        self.state().auth_failure += 1;
    }

    pub fn auth_success(&self) -> u64 {
        self.state().auth_success
    }

    pub fn auth_failure(&self) -> u64 {
        self.state().auth_failure
    }

    // Pizzas

    pub fn increment_pizza_purchases(&self) {
        self.state().pizza_purchases += 1;
    }

    pub fn increment_pizza_failures(&self) {
        self.state().pizza_failures += 1;
    }

    pub fn increase_revenue(&self, added_revenue: f64) {
        self.state().revenue += added_revenue;
    }

    pub fn pizza_purchases(&self) -> u64 {
        self.state().pizza_purchases
    }

    pub fn pizza_failures(&self) -> u64 {
        self.state().pizza_failures
    }

    pub fn revenue(&self) -> f64 {
        self.state().revenue
    }

    // Latency

    pub fn add_request_latency(&self, latency_ms: f64) {
        self.state().request_latencies.push(latency_ms);
    }

    pub fn add_pizza_latency(&self, latency_ms: f64) {
        self.state().pizza_latencies.push(latency_ms);
    }

    /// Mean of the request latencies collected since the last cycle.
    pub fn average_request_latency(&self) -> f64 {
        average(&self.state().request_latencies)
    }

    /// Mean of the purchase latencies collected since the last cycle.
    pub fn average_pizza_latency(&self) -> f64 {
        average(&self.state().pizza_latencies)
    }

    // Snapshots

    /// Copies the current state without resetting anything.
    pub fn peek(&self) -> Snapshot {
        self.state().snapshot()
    }

    /// Copies the current state and empties both latency sample sequences
    /// under the same lock, so no sample lands between the read and the clear.
    /// Cumulative counters are left untouched.
    pub fn take_snapshot(&self) -> Snapshot {
        let mut state = self.state();
        let snapshot = state.snapshot();
        state.request_latencies.clear();
        state.pizza_latencies.clear();
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn verb_counters_sum_into_total() {
        let registry = MetricsRegistry::new();
        for _ in 0..5 {
            registry.increment_get_requests();
        }
        for _ in 0..3 {
            registry.increment_post_requests();
        }
        registry.increment_put_requests();
        registry.increment_delete_requests();
        registry.increment_delete_requests();

        assert_eq!(registry.get_requests(), 5);
        assert_eq!(registry.post_requests(), 3);
        assert_eq!(registry.put_requests(), 1);
        assert_eq!(registry.delete_requests(), 2);
        assert_eq!(registry.total_requests(), 11);
        assert_eq!(registry.peek().total_requests(), 11);
    }

    #[test]
    fn active_users_may_go_negative() {
        let registry = MetricsRegistry::new();
        registry.increment_active_users();
        registry.decrement_active_users();
        assert_eq!(registry.active_users(), 0);

        registry.increment_active_users();
        for _ in 0..3 {
            registry.decrement_active_users();
        }
        assert_eq!(registry.active_users(), -2);
    }

    #[test]
    fn average_latency_is_zero_when_empty() {
        let registry = MetricsRegistry::new();
        assert_eq!(registry.average_request_latency(), 0.0);
        assert_eq!(registry.average_pizza_latency(), 0.0);

        for latency in [10.0, 20.0, 30.0] {
            registry.add_request_latency(latency);
        }
        assert_eq!(registry.average_request_latency(), 20.0);
        assert_eq!(registry.average_pizza_latency(), 0.0);
    }

    #[test]
    fn negative_inputs_are_kept_verbatim() {
        let registry = MetricsRegistry::new();
        registry.increase_revenue(5.0);
        registry.increase_revenue(-7.5);
        registry.add_pizza_latency(-4.0);

        assert_eq!(registry.revenue(), -2.5);
        assert_eq!(registry.average_pizza_latency(), -4.0);
    }

    #[test]
    fn take_snapshot_resets_only_latency_samples() {
        let registry = MetricsRegistry::new();
        registry.increment_auth_success();
        registry.increment_auth_failure();
        registry.increment_pizza_purchases();
        registry.increment_pizza_failures();
        registry.increase_revenue(12.5);
        registry.add_request_latency(40.0);
        registry.add_pizza_latency(100.0);

        let first = registry.take_snapshot();
        assert_eq!(first.average_request_latency, 40.0);
        assert_eq!(first.average_pizza_latency, 100.0);

        let second = registry.take_snapshot();
        assert_eq!(second.average_request_latency, 0.0);
        assert_eq!(second.average_pizza_latency, 0.0);
        assert_eq!(second.auth_success, first.auth_success);
        assert_eq!(second.auth_failure, first.auth_failure);
        assert_eq!(second.pizza_purchases, first.pizza_purchases);
        assert_eq!(second.pizza_failures, first.pizza_failures);
        assert_eq!(second.revenue, first.revenue);
    }

    #[test]
    fn peek_does_not_reset_samples() {
        let registry = MetricsRegistry::new();
        registry.add_request_latency(8.0);
        registry.peek();
        assert_eq!(registry.average_request_latency(), 8.0);
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let registry = Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        registry.increment_get_requests();
                        registry.increment_active_users();
                        registry.add_request_latency(1.0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker thread panicked");
        }

        let snapshot = registry.take_snapshot();
        assert_eq!(snapshot.get_requests, 8000);
        assert_eq!(snapshot.active_users, 8000);
        assert_eq!(snapshot.average_request_latency, 1.0);
    }
}
