//! Line-protocol formatting and the pending line buffer.
//!
//! Every line has the shape
//! `<measurement>,source=<source>[,<tag>=<value>...] <field>=<value>`
//! and a payload is the buffered lines joined with `\n`.

use std::fmt::Display;

use super::registry::Snapshot;

/// Host resource percentages already derived for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceUsage {
    pub cpu_percentage: f64,
    pub memory_percentage: String,
}

/// Formats a single line.
pub fn format_line(
    measurement: &str,
    source: &str,
    tags: &[(&str, &str)],
    field: &str,
    value: impl Display,
) -> String {
    let mut line = format!("{},source={}", measurement, source);
    for (key, tag_value) in tags {
        line.push(',');
        line.push_str(key);
        line.push('=');
        line.push_str(tag_value);
    }
    line.push(' ');
    line.push_str(field);
    line.push('=');
    line.push_str(&value.to_string());
    line
}

/// Ordered lines waiting to be pushed in the current cycle.
#[derive(Debug)]
pub struct LineBuffer {
    source: String,
    lines: Vec<String>,
}

impl LineBuffer {
    pub fn new(source: impl Into<String>) -> Self {
        LineBuffer {
            source: source.into(),
            lines: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Joins the buffered lines into one payload and empties the buffer.
    pub fn flush(&mut self) -> String {
        let payload = self.lines.join("\n");
        self.lines.clear();
        payload
    }

    fn push(&mut self, measurement: &str, tags: &[(&str, &str)], field: &str, value: impl Display) {
        let line = format_line(measurement, &self.source, tags, field, value);
        self.lines.push(line);
    }

    pub fn queue_http_metric(&mut self, method: &str, total: u64) {
        self.push("request", &[("method", method)], "total", total);
    }

    pub fn queue_user_metric(&mut self, total: i64) {
        self.push("active_user", &[], "total", total);
    }

    pub fn queue_auth_metric(&mut self, result: &str, total: u64) {
        self.push("auth_attempt", &[("result", result)], "total", total);
    }

    pub fn queue_resource_metric(&mut self, resource: &str, percentage: impl Display) {
        self.push("resource", &[("resource", resource)], "percentage", percentage);
    }

    pub fn queue_pizza_metric(&mut self, action: &str, total: u64) {
        self.push("pizza", &[("action", action)], "total", total);
    }

    pub fn queue_revenue_metric(&mut self, total: f64) {
        self.push("revenue", &[], "total", total);
    }

    pub fn queue_latency_metric(&mut self, action: &str, average: f64) {
        self.push("latency", &[("action", action)], "total", average);
    }

    /// Queues one line per metric family, in the order the collector
    /// dashboards expect.
    pub fn queue_snapshot(&mut self, snapshot: &Snapshot, resources: &ResourceUsage) {
        self.queue_http_metric("all", snapshot.total_requests());
        self.queue_http_metric("get", snapshot.get_requests);
        self.queue_http_metric("post", snapshot.post_requests);
        self.queue_http_metric("put", snapshot.put_requests);
        self.queue_http_metric("delete", snapshot.delete_requests);

        self.queue_user_metric(snapshot.active_users);

        self.queue_auth_metric("Success", snapshot.auth_success);
        self.queue_auth_metric("Failure", snapshot.auth_failure);

        self.queue_resource_metric("Memory", &resources.memory_percentage);
        self.queue_resource_metric("CPU", resources.cpu_percentage);

        self.queue_pizza_metric("Purchases", snapshot.pizza_purchases);
        self.queue_pizza_metric("Failures", snapshot.pizza_failures);
        self.queue_revenue_metric(snapshot.revenue);

        self.queue_latency_metric("request", snapshot.average_request_latency);
        self.queue_latency_metric("pizza", snapshot.average_pizza_latency);
    }
}

/// Renders a snapshot as a complete payload without touching any buffer.
pub fn render(source: &str, snapshot: &Snapshot, resources: &ResourceUsage) -> String {
    let mut buffer = LineBuffer::new(source);
    buffer.queue_snapshot(snapshot, resources);
    buffer.flush()
}
