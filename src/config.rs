use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use std::fmt;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub cors_origin: String,
    pub trust_proxy: bool,
    pub rate_limit: RateLimitConfig,
    pub tts: TtsConfig,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_requests: u64,
}

#[derive(Clone)]
pub struct TtsConfig {
    /// Base URL of the synthesis API; `/tts` is appended.
    pub api_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub max_text_chars: usize,
}

impl TtsConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl fmt::Debug for TtsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtsConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"***REDACTED***")
            .field("timeout_secs", &self.timeout_secs)
            .field("max_text_chars", &self.max_text_chars)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 5001_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            // The board page is served from a different origin.
            cors_origin: env_or("CORS_ORIGIN", "*"),
            trust_proxy: env_or_bool("TRUST_PROXY", false),
            rate_limit: RateLimitConfig {
                window_secs: env_or_parse("RATE_LIMIT_WINDOW_SECS", 60_u64),
                max_requests: env_or_parse("RATE_LIMIT_MAX", 60_u64),
            },
            tts: TtsConfig {
                api_url: env_or("TTS_API_URL", "https://api.fish.audio/v1"),
                api_key: env_or("TTS_API_KEY", ""),
                timeout_secs: env_or_parse("TTS_TIMEOUT_SECS", 30_u64),
                max_text_chars: env_or_parse("TTS_MAX_TEXT_CHARS", 2000_usize),
            },
        }
    }
}

/// Fixed config for unit tests that must not read process env.
#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 5001,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        cors_origin: "*".to_string(),
        trust_proxy: false,
        rate_limit: RateLimitConfig {
            window_secs: 60,
            max_requests: 60,
        },
        tts: TtsConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            api_key: "test-key".to_string(),
            timeout_secs: 1,
            max_text_chars: 2000,
        },
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use super::*;

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn managed_keys() -> &'static [&'static str] {
        &[
            "HOST",
            "PORT",
            "RUST_LOG",
            "CORS_ORIGIN",
            "RATE_LIMIT_MAX",
            "TTS_API_URL",
            "TTS_API_KEY",
            "TTS_TIMEOUT_SECS",
            "TTS_MAX_TEXT_CHARS",
        ]
    }

    fn clear_keys(keys: &[&str]) {
        for key in keys {
            env::remove_var(key);
        }
    }

    #[test]
    fn loads_defaults_when_missing() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 5001);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.cors_origin, "*");
        assert_eq!(cfg.tts.api_url, "https://api.fish.audio/v1");
        assert_eq!(cfg.tts.timeout_secs, 30);
        assert!(!cfg.tts.is_configured());
    }

    #[test]
    fn parses_numeric_values() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("PORT", "5100");
        env::set_var("RATE_LIMIT_MAX", "10");
        env::set_var("TTS_TIMEOUT_SECS", "5");
        env::set_var("TTS_MAX_TEXT_CHARS", "300");

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 5100);
        assert_eq!(cfg.rate_limit.max_requests, 10);
        assert_eq!(cfg.tts.timeout_secs, 5);
        assert_eq!(cfg.tts.max_text_chars, 300);
        clear_keys(managed_keys());
    }

    #[test]
    fn invalid_values_fall_back() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("PORT", "bad");
        env::set_var("TTS_TIMEOUT_SECS", "-1");

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 5001);
        assert_eq!(cfg.tts.timeout_secs, 30);
        clear_keys(managed_keys());
    }

    #[test]
    fn api_key_is_redacted_in_debug() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("TTS_API_KEY", "sk-very-secret");
        let cfg = Config::from_env();
        assert!(cfg.tts.is_configured());
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("sk-very-secret"));
        assert!(printed.contains("REDACTED"));
        clear_keys(managed_keys());
    }
}
