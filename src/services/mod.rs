pub mod tts_client;
