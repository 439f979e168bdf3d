use std::time::Duration;

use mediagen_core::defaults::{
    GenerationDefaults, DEFAULT_CFG_SCALE, DEFAULT_HEIGHT, DEFAULT_LORA_WEIGHT, DEFAULT_MODEL,
    DEFAULT_SAMPLER, DEFAULT_SPEAKER_ID, DEFAULT_STEPS, DEFAULT_WIDTH,
};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5100`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`).
    pub request_timeout_secs: u64,
    /// PostgreSQL URL for image metadata. Unset selects the in-memory store.
    pub database_url: Option<String>,
    pub sd_api_url: String,
    pub sd_output_dir: String,
    pub voicevox_api_url: String,
    pub voicevox_output_dir: String,
    /// Fallbacks for request fields and pipeline parameters.
    pub defaults: GenerationDefaults,
    /// Pause between consecutive backend calls of one job, in milliseconds.
    pub job_unit_delay_ms: u64,
    /// How long finished jobs stay queryable.
    pub job_retention_minutes: u64,
    pub job_sweep_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                      |
    /// |---------------------------|------------------------------|
    /// | `HOST`                    | `0.0.0.0`                    |
    /// | `PORT`                    | `5100`                       |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`      |
    /// | `REQUEST_TIMEOUT_SECS`    | `300`                        |
    /// | `DATABASE_URL`            | unset (in-memory store)      |
    /// | `SD_API_URL`              | `http://127.0.0.1:7860`      |
    /// | `SD_OUTPUT_DIR`           | `./data/images`              |
    /// | `VOICEVOX_API_URL`        | `http://127.0.0.1:50021`     |
    /// | `VOICEVOX_OUTPUT_DIR`     | `./data/audio`               |
    /// | `DEFAULT_MODEL`           | `dreamshaper_8.safetensors`  |
    /// | `DEFAULT_SAMPLER`         | `DPM++ 2M Karras`            |
    /// | `DEFAULT_STEPS`           | `30`                         |
    /// | `DEFAULT_CFG_SCALE`       | `6.0`                        |
    /// | `DEFAULT_WIDTH`           | `768`                        |
    /// | `DEFAULT_HEIGHT`          | `768`                        |
    /// | `DEFAULT_LORA_WEIGHT`     | `0.8`                        |
    /// | `DEFAULT_SPEAKER_ID`      | `3`                          |
    /// | `JOB_UNIT_DELAY_MS`       | `500`                        |
    /// | `JOB_RETENTION_MINUTES`   | `60`                         |
    /// | `JOB_SWEEP_INTERVAL_SECS` | `300`                        |
    ///
    /// Panics on unparseable values; misconfiguration should fail fast.
    pub fn from_env() -> Self {
        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let defaults = GenerationDefaults {
            model: env_or("DEFAULT_MODEL", DEFAULT_MODEL),
            sampler: env_or("DEFAULT_SAMPLER", DEFAULT_SAMPLER),
            steps: parse_env("DEFAULT_STEPS", DEFAULT_STEPS),
            cfg_scale: parse_env("DEFAULT_CFG_SCALE", DEFAULT_CFG_SCALE),
            width: parse_env("DEFAULT_WIDTH", DEFAULT_WIDTH),
            height: parse_env("DEFAULT_HEIGHT", DEFAULT_HEIGHT),
            lora_weight: parse_env("DEFAULT_LORA_WEIGHT", DEFAULT_LORA_WEIGHT),
            speaker_id: parse_env("DEFAULT_SPEAKER_ID", DEFAULT_SPEAKER_ID),
        };

        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: parse_env("PORT", 5100),
            cors_origins,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 300),
            database_url,
            sd_api_url: env_or("SD_API_URL", "http://127.0.0.1:7860"),
            sd_output_dir: env_or("SD_OUTPUT_DIR", "./data/images"),
            voicevox_api_url: env_or("VOICEVOX_API_URL", "http://127.0.0.1:50021"),
            voicevox_output_dir: env_or("VOICEVOX_OUTPUT_DIR", "./data/audio"),
            defaults,
            job_unit_delay_ms: parse_env("JOB_UNIT_DELAY_MS", 500),
            job_retention_minutes: parse_env("JOB_RETENTION_MINUTES", 60),
            job_sweep_interval_secs: parse_env("JOB_SWEEP_INTERVAL_SECS", 300),
        }
    }

    pub fn job_unit_delay(&self) -> Duration {
        Duration::from_millis(self.job_unit_delay_ms)
    }

    pub fn job_retention(&self) -> Duration {
        Duration::from_secs(self.job_retention_minutes * 60)
    }

    pub fn job_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.job_sweep_interval_secs)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid value: {e}")),
        Err(_) => default,
    }
}
