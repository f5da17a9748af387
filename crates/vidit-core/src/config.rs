use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(invalid(var, "must be a finite number".to_string()))
        }
    };

    let parse_unit = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = parse_f64(var, default)?;
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(invalid(var, format!("{value} is outside [0, 1]")))
        }
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("VIDIT_ENV", "development"))?;
    let log_level = or_default("VIDIT_LOG_LEVEL", "info");

    let newsapi_key = lookup("NEWSAPI_KEY").ok().filter(|k| !k.trim().is_empty());
    let newsapi_base_url = or_default("VIDIT_NEWSAPI_BASE_URL", "https://newsapi.org");
    let newsapi_language = or_default("VIDIT_NEWSAPI_LANGUAGE", "es");

    let db_max_connections = parse_u32("VIDIT_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("VIDIT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("VIDIT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let fetch_timeout_secs = parse_u64("VIDIT_FETCH_TIMEOUT_SECS", "10")?;
    let fetch_user_agent = or_default("VIDIT_FETCH_USER_AGENT", "vidit/0.1 (news-aggregator)");
    let fetch_max_concurrent_sources = parse_usize("VIDIT_FETCH_MAX_CONCURRENT_SOURCES", "16")?;
    if fetch_max_concurrent_sources == 0 {
        return Err(invalid(
            "VIDIT_FETCH_MAX_CONCURRENT_SOURCES",
            "must be at least 1".to_string(),
        ));
    }

    let rank_cluster_threshold = parse_unit("VIDIT_RANK_CLUSTER_THRESHOLD", "0.4")?;
    let rank_dedup_threshold = parse_unit("VIDIT_RANK_DEDUP_THRESHOLD", "0.35")?;
    let rank_cluster_weight = parse_f64("VIDIT_RANK_CLUSTER_WEIGHT", "2.5")?;
    let rank_decay = parse_f64("VIDIT_RANK_DECAY", "1.8")?;
    let rank_weight_feed = parse_f64("VIDIT_RANK_WEIGHT_FEED", "1.5")?;
    let rank_weight_sitemap = parse_f64("VIDIT_RANK_WEIGHT_SITEMAP", "1.2")?;
    let rank_weight_search_api = parse_f64("VIDIT_RANK_WEIGHT_SEARCH_API", "1.0")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        newsapi_key,
        newsapi_base_url,
        newsapi_language,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        fetch_timeout_secs,
        fetch_user_agent,
        fetch_max_concurrent_sources,
        rank_cluster_threshold,
        rank_dedup_threshold,
        rank_cluster_weight,
        rank_decay,
        rank_weight_feed,
        rank_weight_sitemap,
        rank_weight_search_api,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "VIDIT_ENV".to_string(),
            reason: format!("unknown environment {other:?}"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
