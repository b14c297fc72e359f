//! Runtime configuration loaded from environment variables.

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SESSION_TTL_HOURS: i64 = 168;
const DEFAULT_PAGE_SIZE_MAX: i64 = 500;
const DEFAULT_SESSION_SWEEP_MINUTES: u64 = 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Lifetime of a session token created at sign-in.
    pub session_ttl_hours: i64,
    /// How often expired session rows are deleted.
    pub session_sweep_minutes: u64,
    /// Upper bound for `limit` on list endpoints.
    pub page_size_max: i64,
}

impl AppConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            session_ttl_hours: env_parse("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS).max(1),
            session_sweep_minutes: env_parse("SESSION_SWEEP_MINUTES", DEFAULT_SESSION_SWEEP_MINUTES).max(1),
            page_size_max: env_parse("PAGE_SIZE_MAX", DEFAULT_PAGE_SIZE_MAX).max(1),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            session_sweep_minutes: DEFAULT_SESSION_SWEEP_MINUTES,
            page_size_max: DEFAULT_PAGE_SIZE_MAX,
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Non-empty environment variable, trimmed.
pub(crate) fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
