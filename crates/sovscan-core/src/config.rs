use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Log filter used when `SOVSCAN_LOG_LEVEL` is unset.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Load `.env` into the process environment, if present.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Load application configuration from environment variables already in the process.
///
/// Call [`load_dotenv`] first to pick up a `.env` file.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// `SOVSCAN_LOG_LEVEL`, or `info`. Needs no credentials.
#[must_use]
pub fn log_level_from_env() -> String {
    log_level(&|key: &str| std::env::var(key))
}

/// `SOVSCAN_BRANDS_PATH` as a path; unset or blank means the built-in roster.
#[must_use]
pub fn brands_path_from_env() -> Option<PathBuf> {
    brands_path(&|key: &str| std::env::var(key))
}

fn log_level<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    lookup("SOVSCAN_LOG_LEVEL")
        .ok()
        .map(|level| level.trim().to_string())
        .filter(|level| !level.is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

fn brands_path<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    lookup("SOVSCAN_BRANDS_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every missing credential is reported at once rather than one per attempt.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let mut missing = Vec::new();
    let mut require = |var: &str| -> String {
        match lookup(var) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => {
                missing.push(var.to_string());
                String::new()
            }
        }
    };

    let google_api_key = require("GOOGLE_API_KEY");
    let google_cse_id = require("GOOGLE_CSE_ID");
    let openai_api_key = require("OPENAI_API_KEY");

    if !missing.is_empty() {
        return Err(ConfigError::MissingEnvVars(missing));
    }

    let openai_model = or_default("OPENAI_MODEL", "gpt-4o");
    let openai_base_url = or_default("OPENAI_BASE_URL", "https://api.openai.com/v1");
    let search_base_url = or_default(
        "SOVSCAN_SEARCH_BASE_URL",
        "https://www.googleapis.com/customsearch/v1",
    );
    let relay_base_url = or_default("SOVSCAN_RELAY_BASE_URL", "https://api.allorigins.win");
    let brands_path = brands_path(&lookup);

    let request_timeout_secs = parse_u64("SOVSCAN_REQUEST_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("SOVSCAN_USER_AGENT", "sovscan/0.1 (brand-visibility)");
    let search_page_delay_ms = parse_u64("SOVSCAN_SEARCH_PAGE_DELAY_MS", "100")?;
    let fetch_batch_size = parse_usize("SOVSCAN_FETCH_BATCH_SIZE", "3")?;
    let fetch_max_attempts = parse_u32("SOVSCAN_FETCH_MAX_ATTEMPTS", "2")?;
    let fetch_retry_delay_ms = parse_u64("SOVSCAN_FETCH_RETRY_DELAY_MS", "1000")?;
    let fetch_batch_delay_ms = parse_u64("SOVSCAN_FETCH_BATCH_DELAY_MS", "1000")?;
    let min_content_chars = parse_usize("SOVSCAN_MIN_CONTENT_CHARS", "100")?;

    if fetch_batch_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SOVSCAN_FETCH_BATCH_SIZE".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if fetch_max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SOVSCAN_FETCH_MAX_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        google_api_key,
        google_cse_id,
        openai_api_key,
        openai_model,
        openai_base_url,
        search_base_url,
        relay_base_url,
        brands_path,
        request_timeout_secs,
        user_agent,
        search_page_delay_ms,
        fetch_batch_size,
        fetch_max_attempts,
        fetch_retry_delay_ms,
        fetch_batch_delay_ms,
        min_content_chars,
    })
}
