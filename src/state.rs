use std::sync::Arc;
use std::time::Instant;

use dwell_board_wasm::VoiceTable;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::middleware::rate_limit::RateLimiter;
use crate::services::tts_client::TtsClient;

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    tts: Arc<TtsClient>,
    voices: Arc<VoiceTable>,
    rate_limit: Arc<RateLimiter>,
    shutdown_tx: broadcast::Sender<()>,
    started_at: Instant,
}

impl AppState {
    pub fn new(config: &Config, shutdown_tx: broadcast::Sender<()>) -> Self {
        let rate_limit = Arc::new(RateLimiter::new(
            config.rate_limit.window_secs,
            config.rate_limit.max_requests,
        ));

        Self {
            config: Arc::new(config.clone()),
            tts: Arc::new(TtsClient::new(&config.tts)),
            voices: Arc::new(VoiceTable::default()),
            rate_limit,
            shutdown_tx,
            started_at: Instant::now(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tts(&self) -> &TtsClient {
        &self.tts
    }

    /// Emotion → prosody used when a request names an emotion but no prosody.
    pub fn voices(&self) -> &VoiceTable {
        &self.voices
    }

    pub fn rate_limit(&self) -> &Arc<RateLimiter> {
        &self.rate_limit
    }

    pub fn shutdown_rx(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
