use std::env;
use std::time::Duration;

/// Ambient configuration, loaded once from the environment (`.env` via
/// `dotenvy`, falling back to process env) with the spec's defaults where the
/// environment says nothing. Parameters that the spec fixes as constants
/// (window size, hop, quantization bins, thresholds...) are NOT configurable
/// here — only the deployment-level knobs spec.md leaves to the surrounding
/// system are.
#[derive(Debug, Clone)]
pub struct Config {
    /// `DATABASE_URL` for `PgStore`. `None` means "use the in-memory store".
    pub database_url: Option<String>,
    /// §5 `C_ING`: bounded ingestion worker concurrency.
    pub concurrent_ingestions: usize,
    /// §7: max retry attempts for a transient store failure during ingest.
    pub max_ingest_retries: u32,
    /// §5: soft wall-clock budget for `identify`.
    pub identify_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            concurrent_ingestions: 2,
            max_ingest_retries: 3,
            identify_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration the way the teacher's `DB::new()` does —
    /// `dotenvy::dotenv().ok()` then fall through to `env::var`, except
    /// centralized once instead of repeated at each call site.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").ok(),
            concurrent_ingestions: env::var("C_ING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.concurrent_ingestions),
            max_ingest_retries: env::var("R_MAX")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_ingest_retries),
            identify_timeout: env::var("IDENTIFY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.identify_timeout),
        }
    }
}
