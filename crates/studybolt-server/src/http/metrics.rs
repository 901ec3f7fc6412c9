use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

// ── Label types ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabel {
    pub outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct SourceLabel {
    pub source: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct EndpointLabel {
    pub endpoint: String,
}

// ── Metrics registry ───────────────────────────────────────────────────────────

pub struct StudyBoltMetrics {
    pub registry: Registry,

    // Chat
    pub chat_requests: Counter,
    pub chat_streams: Family<OutcomeLabel, Counter>,

    // Search summaries, by where the answer came from
    pub search_requests: Family<SourceLabel, Counter>,

    // Requests answered with an error status or error event
    pub failures: Family<EndpointLabel, Counter>,

    // Uptime (set on each scrape)
    pub uptime_seconds: Gauge,
}

impl StudyBoltMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let chat_requests: Counter = Counter::default();
        registry.register(
            "studybolt_chat_requests",
            "Chat requests that opened an event stream",
            chat_requests.clone(),
        );

        let chat_streams: Family<OutcomeLabel, Counter> = Family::default();
        registry.register(
            "studybolt_chat_streams",
            "Chat streams by terminal event (done or error)",
            chat_streams.clone(),
        );

        let search_requests: Family<SourceLabel, Counter> = Family::default();
        registry.register(
            "studybolt_search_requests",
            "Search summaries served, by source (cache or fresh)",
            search_requests.clone(),
        );

        let failures: Family<EndpointLabel, Counter> = Family::default();
        registry.register(
            "studybolt_failures",
            "Requests that failed, by endpoint",
            failures.clone(),
        );

        let uptime_seconds: Gauge = Gauge::default();
        registry.register(
            "studybolt_uptime_seconds",
            "Server uptime in seconds",
            uptime_seconds.clone(),
        );

        Self {
            registry,
            chat_requests,
            chat_streams,
            search_requests,
            failures,
            uptime_seconds,
        }
    }

    pub fn record_stream_end(&self, outcome: &str) {
        self.chat_streams
            .get_or_create(&OutcomeLabel {
                outcome: outcome.to_string(),
            })
            .inc();
    }

    pub fn record_search(&self, source: &str) {
        self.search_requests
            .get_or_create(&SourceLabel {
                source: source.to_string(),
            })
            .inc();
    }

    pub fn record_failure(&self, endpoint: &str) {
        self.failures
            .get_or_create(&EndpointLabel {
                endpoint: endpoint.to_string(),
            })
            .inc();
    }

    /// OpenMetrics text exposition of every registered metric.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for StudyBoltMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_appear_in_exposition() {
        let metrics = StudyBoltMetrics::new();
        metrics.chat_requests.inc();
        metrics.record_stream_end("done");
        metrics.record_search("cache");
        metrics.record_failure("search");

        let text = metrics.render().unwrap();
        assert!(text.contains("studybolt_chat_requests_total 1"));
        assert!(text.contains("studybolt_chat_streams_total{outcome=\"done\"} 1"));
        assert!(text.contains("studybolt_search_requests_total{source=\"cache\"} 1"));
        assert!(text.contains("studybolt_failures_total{endpoint=\"search\"} 1"));
        assert!(text.ends_with("# EOF\n"));
    }
}
