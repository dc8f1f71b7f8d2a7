use std::env;

/// How `season_N` keys are probed on a series record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonProbe {
    /// Stop at the first missing or null season
    Contiguous,
    /// Skip over gaps, probing up to `max`
    Tolerant { max: u32 },
}

impl Default for SeasonProbe {
    fn default() -> Self {
        Self::Contiguous
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,

    // Upstream
    pub upstream_base_url: String,
    pub fetch_timeout_ms: u64,
    pub user_agent: String,

    // Extraction
    pub season_probe: SeasonProbe,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let probe_max = env::var("SEASON_PROBE_MAX")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .unwrap_or(50);

        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .unwrap_or(3001),

            // Upstream
            upstream_base_url: env::var("UPSTREAM_BASE_URL")
                .unwrap_or_else(|_| "https://api.hicine.info".to_string()),

            fetch_timeout_ms: env::var("FETCH_TIMEOUT_MS")
                .unwrap_or_else(|_| "15000".to_string())
                .parse()
                .unwrap_or(15_000), // 15 seconds

            user_agent: env::var("USER_AGENT")
                .unwrap_or_else(|_| format!("media-normalizer/{}", env!("CARGO_PKG_VERSION"))),

            // Extraction
            season_probe: parse_season_probe(env::var("SEASON_PROBE").ok().as_deref(), probe_max),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Unknown values fall back to contiguous probing
fn parse_season_probe(value: Option<&str>, max: u32) -> SeasonProbe {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("tolerant") => SeasonProbe::Tolerant { max },
        _ => SeasonProbe::Contiguous,
    }
}
