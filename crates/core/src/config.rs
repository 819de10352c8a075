use crate::error::ConfigError;

pub const DEFAULT_LLM_MODEL: &str = "mistralai/mistral-7b-instruct:free";
pub const DEFAULT_CHAT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "hashed-ngram-256";

/// Process-wide settings resolved once at startup. A missing API key is the
/// one configuration error callers must treat as fatal.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub api_key: String,
    pub llm_model: String,
    pub chat_base_url: String,
    pub embedding_model: String,
}

impl AssistantConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(Self {
            api_key,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            chat_base_url: DEFAULT_CHAT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        })
    }

    pub fn with_llm_model(mut self, model: impl Into<String>) -> Self {
        self.llm_model = model.into();
        self
    }

    pub fn with_chat_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.chat_base_url = base_url.into();
        self
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }
}
