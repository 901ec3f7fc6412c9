use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use studybolt_core::PipelineConfig;

/// Scheme that selects the in-process cache instead of Redis.
pub const MEMORY_CACHE_SCHEME: &str = "memory://";

#[derive(Parser, Debug, Clone)]
#[command(name = "studybolt")]
#[command(about = "StudyBolt API: streaming study chat with web search augmentation", version)]
pub struct Config {
    /// Interface to listen on
    #[arg(long, env = "STUDYBOLT_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// HTTP listen port
    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Mistral API key
    #[arg(long, env = "MISTRAL_API_KEY", hide_env_values = true)]
    pub mistral_api_key: String,

    /// Mistral agent every completion is addressed to
    #[arg(long, env = "MISTRAL_AGENT_ID")]
    pub agent_id: String,

    /// Mistral API base URL
    #[arg(long, env = "MISTRAL_BASE_URL", default_value = "https://api.mistral.ai")]
    pub mistral_base_url: String,

    /// SerpAPI key
    #[arg(long, env = "SERP_API_KEY", hide_env_values = true)]
    pub serp_api_key: String,

    /// SerpAPI base URL
    #[arg(long, env = "SERP_BASE_URL", default_value = "https://serpapi.com")]
    pub serp_base_url: String,

    /// SerpAPI search engine
    #[arg(long, env = "SERP_ENGINE", default_value = "google")]
    pub search_engine: String,

    /// Redis URL for the summary cache (`memory://` keeps it in-process)
    #[arg(long, env = "REDIS_URL", default_value = "redis://localhost:6379")]
    pub redis_url: String,

    /// Cached summary lifetime in seconds
    #[arg(long, env = "CACHE_TTL", default_value = "3600")]
    pub cache_ttl: u64,

    /// Search results injected into a chat when search is enabled
    #[arg(long, env = "STUDYBOLT_CHAT_SEARCH_RESULTS", default_value = "5")]
    pub chat_search_results: usize,

    /// Largest numResults honoured by /api/search
    #[arg(long, env = "STUDYBOLT_MAX_SEARCH_RESULTS", default_value = "20")]
    pub max_search_results: usize,

    /// Seconds before an upstream request (or the start of a stream) times out
    #[arg(long, env = "STUDYBOLT_UPSTREAM_TIMEOUT", default_value = "30")]
    pub upstream_timeout: u64,

    /// Seconds allowed between two fragments of a streaming completion
    #[arg(long, env = "STUDYBOLT_STREAM_IDLE_TIMEOUT", default_value = "60")]
    pub stream_idle_timeout: u64,

    /// Maximum request body size in bytes
    #[arg(long, env = "STUDYBOLT_BODY_LIMIT", default_value = "1048576")]
    pub body_limit: usize,
}

impl Config {
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }

    pub fn uses_memory_cache(&self) -> bool {
        self.redis_url.starts_with(MEMORY_CACHE_SCHEME)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            chat_search_results: self.chat_search_results,
            max_search_results: self.max_search_results,
            cache_ttl: Duration::from_secs(self.cache_ttl),
            stream_idle_timeout: Duration::from_secs(self.stream_idle_timeout),
            ..PipelineConfig::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let required = [
            ("MISTRAL_API_KEY", &self.mistral_api_key),
            ("MISTRAL_AGENT_ID", &self.agent_id),
            ("SERP_API_KEY", &self.serp_api_key),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                anyhow::bail!("{} must not be empty", name);
            }
        }

        if self.cache_ttl == 0 {
            anyhow::bail!("CACHE_TTL must be at least one second");
        }
        if self.upstream_timeout == 0 || self.stream_idle_timeout == 0 {
            anyhow::bail!("Upstream timeouts must be at least one second");
        }
        if self.chat_search_results == 0 || self.max_search_results == 0 {
            anyhow::bail!("Search result counts must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Config, clap::Error> {
        let mut args = vec![
            "studybolt",
            "--mistral-api-key",
            "m-key",
            "--agent-id",
            "ag:test",
            "--serp-api-key",
            "s-key",
        ];
        args.extend_from_slice(extra);
        Config::try_parse_from(args)
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).unwrap();
        config.validate().unwrap();

        assert_eq!(config.cache_ttl, 3600);
        assert_eq!(config.mistral_base_url, "https://api.mistral.ai");
        assert!(!config.uses_memory_cache());

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.cache_ttl, Duration::from_secs(3600));
        assert_eq!(pipeline.chat_search_results, 5);
    }

    #[test]
    fn listen_address_from_host_and_port() {
        let config = parse(&["--host", "127.0.0.1", "--port", "8080"]).unwrap();
        assert_eq!(config.http_addr(), "127.0.0.1:8080".parse().unwrap());
    }

    #[test]
    fn memory_cache_selected_by_scheme() {
        let config = parse(&["--redis-url", "memory://"]).unwrap();
        assert!(config.uses_memory_cache());
    }

    #[test]
    fn rejects_blank_credentials_and_zero_ttl() {
        let mut config = parse(&[]).unwrap();
        config.agent_id = "  ".to_string();
        assert!(config.validate().is_err());

        let config = parse(&["--cache-ttl", "0"]).unwrap();
        assert!(config.validate().is_err());

        let config = parse(&["--stream-idle-timeout", "0"]).unwrap();
        assert!(config.validate().is_err());
    }
}
