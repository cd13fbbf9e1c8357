use axum::Router;
use tokio::sync::broadcast;

use dwell_board_proxy::config::{Config, RateLimitConfig, TtsConfig};
use dwell_board_proxy::routes::build_router;
use dwell_board_proxy::state::AppState;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
}

/// Builds `Config` directly so parallel tests never touch process env.
pub fn test_config(tts_url: &str, api_key: &str, rate_limit_max: u64) -> Config {
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 5001,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        cors_origin: "*".to_string(),
        trust_proxy: false,
        rate_limit: RateLimitConfig {
            window_secs: 60,
            max_requests: rate_limit_max,
        },
        tts: TtsConfig {
            api_url: tts_url.to_string(),
            api_key: api_key.to_string(),
            timeout_secs: 5,
            max_text_chars: 200,
        },
    }
}

pub fn spawn_with(config: Config) -> TestApp {
    let (shutdown_tx, _) = broadcast::channel::<()>(8);
    let state = AppState::new(&config, shutdown_tx);
    let app = build_router(state.clone());

    TestApp { app, state, config }
}

pub fn spawn_test_app(tts_url: &str, api_key: &str, rate_limit_max: u64) -> TestApp {
    spawn_with(test_config(tts_url, api_key, rate_limit_max))
}

/// App pointed at a closed port, for tests that never reach upstream.
pub fn spawn_offline_app() -> TestApp {
    spawn_test_app("http://127.0.0.1:9", "test-key", 100)
}
