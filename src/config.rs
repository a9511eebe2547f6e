use std::time::Duration;

use log::LevelFilter;

use crate::event_cache::DEFAULT_TTL;

pub const DEFAULT_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/1soXeIAa-XoHsTfAE8hXIQ8lT711k9GFuuAL_gkFTUQs/edit?gid=0#gid=0";

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Pre-filled link in the URL field.
    pub sheet_url: String,
    /// How long a loaded sheet is reused for the same link. Zero disables.
    pub cache_ttl: Duration,
    /// `None` means the download may block indefinitely.
    pub fetch_timeout: Option<Duration>,
    pub log_level: LevelFilter,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            sheet_url: DEFAULT_SHEET_URL.to_string(),
            cache_ttl: DEFAULT_TTL,
            fetch_timeout: None,
            log_level: LevelFilter::Info,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let sheet_url = value("WAR_GAMES_SHEET_URL").unwrap_or(defaults.sheet_url);
        let cache_ttl = value("WAR_GAMES_CACHE_TTL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);
        let fetch_timeout = value("WAR_GAMES_FETCH_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let log_level = value("WAR_GAMES_LOG_LEVEL")
            .and_then(|v| v.parse::<LevelFilter>().ok())
            .unwrap_or(defaults.log_level);

        Self {
            sheet_url,
            cache_ttl,
            fetch_timeout,
            log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use log::LevelFilter;

    use super::GameConfig;

    #[test]
    fn empty_environment_gives_defaults() {
        let config = GameConfig::from_lookup(|_| None);
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.cache_ttl, Duration::from_secs(600));
        assert_eq!(config.fetch_timeout, None);
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("WAR_GAMES_SHEET_URL", " https://docs.google.com/spreadsheets/d/x/edit "),
            ("WAR_GAMES_CACHE_TTL_SECS", "30"),
            ("WAR_GAMES_FETCH_TIMEOUT_SECS", "soon"),
            ("WAR_GAMES_LOG_LEVEL", "debug"),
        ]);
        let config = GameConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.sheet_url, "https://docs.google.com/spreadsheets/d/x/edit");
        assert_eq!(config.cache_ttl, Duration::from_secs(30));
        assert_eq!(config.fetch_timeout, None);
        assert_eq!(config.log_level, LevelFilter::Debug);
    }
}
