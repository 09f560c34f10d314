use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Tracks:
// - HTTP traffic (requests by route and status, latency)
// - Order lifecycle (creations, deletions and how many child rows they took)
// - Optimistic-concurrency conflicts by entity
//
// Scraped via GET /metrics on the main server.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub http_requests_total: IntCounterVec,
    pub http_request_duration: HistogramVec,

    pub orders_created_total: IntCounter,
    pub orders_deleted_total: IntCounter,
    pub line_items_deleted_total: IntCounter,

    pub concurrency_conflicts_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP requests by route and status"),
            &["endpoint", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["endpoint"],
        )?;
        registry.register(Box::new(http_request_duration.clone()))?;

        let orders_created_total =
            IntCounter::new("orders_created_total", "Orders created with their first line item")?;
        registry.register(Box::new(orders_created_total.clone()))?;

        let orders_deleted_total =
            IntCounter::new("orders_deleted_total", "Orders removed by the deletion workflow")?;
        registry.register(Box::new(orders_deleted_total.clone()))?;

        let line_items_deleted_total = IntCounter::new(
            "line_items_deleted_total",
            "Line items removed, including cascades from order deletion",
        )?;
        registry.register(Box::new(line_items_deleted_total.clone()))?;

        let concurrency_conflicts_total = IntCounterVec::new(
            Opts::new(
                "concurrency_conflicts_total",
                "Optimistic version mismatches surfaced to callers",
            ),
            &["entity"],
        )?;
        registry.register(Box::new(concurrency_conflicts_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration,
            orders_created_total,
            orders_deleted_total,
            line_items_deleted_total,
            concurrency_conflicts_total,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_http_request(&self, endpoint: &str, status: u16, duration_secs: f64) {
        self.http_requests_total
            .with_label_values(&[endpoint, &status.to_string()])
            .inc();
        self.http_request_duration
            .with_label_values(&[endpoint])
            .observe(duration_secs);
    }

    pub fn record_order_created(&self) {
        self.orders_created_total.inc();
    }

    pub fn record_order_deleted(&self, line_items_removed: u64) {
        self.orders_deleted_total.inc();
        self.line_items_deleted_total.inc_by(line_items_removed);
    }

    pub fn record_line_item_deleted(&self) {
        self.line_items_deleted_total.inc();
    }

    pub fn record_conflict(&self, entity: &str) {
        self.concurrency_conflicts_total
            .with_label_values(&[entity])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert!(metrics.registry.gather().len() > 0);
    }

    #[test]
    fn test_record_http_request() {
        let metrics = Metrics::new().unwrap();
        metrics.record_http_request("/orders", 200, 0.05);
        metrics.record_http_request("/orders", 404, 0.01);

        let gathered = metrics.registry.gather();
        let requests = gathered
            .iter()
            .find(|m| m.name() == "http_requests_total")
            .unwrap();
        assert_eq!(requests.metric.len(), 2); // Two different status labels
    }

    #[test]
    fn test_record_order_deletion_counts_cascade() {
        let metrics = Metrics::new().unwrap();
        metrics.record_order_deleted(3);

        let gathered = metrics.registry.gather();
        let cascades = gathered
            .iter()
            .find(|m| m.name() == "line_items_deleted_total")
            .unwrap();
        assert_eq!(cascades.metric[0].counter.value, Some(3.0));
    }

    #[test]
    fn test_record_conflict_by_entity() {
        let metrics = Metrics::new().unwrap();
        metrics.record_conflict("order");
        metrics.record_conflict("order");
        metrics.record_conflict("line_item");

        let gathered = metrics.registry.gather();
        let conflicts = gathered
            .iter()
            .find(|m| m.name() == "concurrency_conflicts_total")
            .unwrap();
        assert_eq!(conflicts.metric.len(), 2);
    }
}
