use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "redis" => Ok(CacheBackend::Redis),
            "memory" => Ok(CacheBackend::Memory),
            other => Err(anyhow::anyhow!(
                "Unknown CACHE_BACKEND '{other}'. Supported backends: redis, memory"
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub visualcrossing_api_key: String,
    pub visualcrossing_base_url: String,
    pub default_location: String,
    pub cache_backend: CacheBackend,
    pub redis_url: String,
    pub cache_ttl_secs: u64,
    pub memory_cache_capacity: u64,
    pub upstream_timeout_secs: u64,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string_or = |name: &str, default: &str| {
            lookup(name).unwrap_or_else(|| default.to_string())
        };
        let number_or = |name: &str, default: u64| -> anyhow::Result<u64> {
            match lookup(name) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("{name} must be a positive integer, got '{raw}'")),
                None => Ok(default),
            }
        };

        Ok(Config {
            visualcrossing_api_key: lookup("VISUALCROSSING_API_KEY")
                .or_else(|| lookup("key"))
                .ok_or_else(|| anyhow::anyhow!("VISUALCROSSING_API_KEY not set"))?,
            visualcrossing_base_url: string_or(
                "VISUALCROSSING_BASE_URL",
                "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline",
            ),
            default_location: string_or("DEFAULT_LOCATION", "Cluj"),
            cache_backend: string_or("CACHE_BACKEND", "redis").parse()?,
            redis_url: string_or("REDIS_URL", "redis://127.0.0.1:6379/0"),
            cache_ttl_secs: number_or("CACHE_TTL_SECS", 3600)?,
            memory_cache_capacity: number_or("MEMORY_CACHE_CAPACITY", 1000)?,
            upstream_timeout_secs: number_or("UPSTREAM_TIMEOUT_SECS", 30)?,
            bind_addr: string_or("BIND_ADDR", "0.0.0.0:8080"),
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}
