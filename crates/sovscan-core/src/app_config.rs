use std::path::PathBuf;

/// Process-wide settings for the analysis pipeline, loaded once from the
/// environment by [`crate::load_app_config_from_env`].
#[derive(Clone)]
pub struct AppConfig {
    pub google_api_key: String,
    pub google_cse_id: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub search_base_url: String,
    pub relay_base_url: String,
    pub brands_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub search_page_delay_ms: u64,
    pub fetch_batch_size: usize,
    pub fetch_max_attempts: u32,
    pub fetch_retry_delay_ms: u64,
    pub fetch_batch_delay_ms: u64,
    pub min_content_chars: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("google_api_key", &"[redacted]")
            .field("google_cse_id", &"[redacted]")
            .field("openai_api_key", &"[redacted]")
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("search_base_url", &self.search_base_url)
            .field("relay_base_url", &self.relay_base_url)
            .field("brands_path", &self.brands_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("search_page_delay_ms", &self.search_page_delay_ms)
            .field("fetch_batch_size", &self.fetch_batch_size)
            .field("fetch_max_attempts", &self.fetch_max_attempts)
            .field("fetch_retry_delay_ms", &self.fetch_retry_delay_ms)
            .field("fetch_batch_delay_ms", &self.fetch_batch_delay_ms)
            .field("min_content_chars", &self.min_content_chars)
            .finish()
    }
}
