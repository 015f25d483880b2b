use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Per-app registry so separate routers (and tests) don't share counters.
pub struct Metrics {
    registry: Registry,
    pub orders_created: IntCounter,
    pub order_failures: IntCounterVec,
    pub verifications: IntCounterVec,
    pub webhooks: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let orders_created = IntCounter::new(
            "yatra_orders_created_total",
            "Total number of gateway orders created",
        )?;
        let order_failures = IntCounterVec::new(
            Opts::new("yatra_order_failures_total", "Order creation failures by reason"),
            &["reason"],
        )?;
        let verifications = IntCounterVec::new(
            Opts::new("yatra_verifications_total", "Payment verifications by outcome"),
            &["outcome"],
        )?;
        let webhooks = IntCounterVec::new(
            Opts::new("yatra_webhooks_total", "Gateway webhooks by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(orders_created.clone()))?;
        registry.register(Box::new(order_failures.clone()))?;
        registry.register(Box::new(verifications.clone()))?;
        registry.register(Box::new(webhooks.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            order_failures,
            verifications,
            webhooks,
        })
    }

    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_labels() {
        let metrics = Metrics::new().unwrap();
        metrics.orders_created.inc();
        metrics.verifications.with_label_values(&["paid"]).inc();

        let text = metrics.render().unwrap();
        assert!(text.contains("yatra_orders_created_total 1"));
        assert!(text.contains("yatra_verifications_total{outcome=\"paid\"} 1"));
    }

    #[test]
    fn test_registries_are_independent() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.orders_created.inc();
        assert_eq!(b.orders_created.get(), 0);
    }
}
