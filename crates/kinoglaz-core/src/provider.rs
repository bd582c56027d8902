use crate::{
    analyzer::{AnalyzerOptions, VideoAnalyzer},
    error::{KinoglazError, Result},
    gemini::GeminiAnalyzer,
    openrouter::OpenRouterAnalyzer,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    Gemini,
    OpenRouter,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
    pub model_env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/models",
                model: "gemini-3-pro",
                env_var: "GEMINI_API_KEY",
                model_env_var: "GEMINI_MODEL_NAME",
            },
            Provider::OpenRouter => ProviderConfig {
                api_url: "https://openrouter.ai/api/v1/chat/completions",
                model: "google/gemini-3-pro-preview",
                env_var: "OPENROUTER_API_KEY",
                model_env_var: "OPENROUTER_MODEL_NAME",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::OpenRouter => "OpenRouter",
        }
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String> {
        let config = self.config();
        std::env::var(config.env_var).map_err(|_| KinoglazError::MissingApiKey {
            env_var: config.env_var.to_string(),
        })
    }

    /// Model to use: explicit override first, then the environment, then
    /// the provider default.
    pub fn resolve_model(&self, override_model: Option<String>) -> String {
        let config = self.config();
        override_model
            .or_else(|| std::env::var(config.model_env_var).ok())
            .unwrap_or_else(|| config.model.to_string())
    }
}

/// Build the analyzer for a provider. Fails fast when the API key is
/// missing.
pub fn create_analyzer(
    provider: Provider,
    options: AnalyzerOptions,
) -> Result<Box<dyn VideoAnalyzer>> {
    match provider {
        Provider::Gemini => Ok(Box::new(GeminiAnalyzer::new(options)?)),
        Provider::OpenRouter => Ok(Box::new(OpenRouterAnalyzer::new(options)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_is_wired_per_provider() {
        let gemini = Provider::Gemini.config();
        assert!(gemini.api_url.contains("generativelanguage"));
        assert_eq!(gemini.env_var, "GEMINI_API_KEY");

        let openrouter = Provider::OpenRouter.config();
        assert!(openrouter.api_url.contains("openrouter.ai"));
        assert_eq!(openrouter.env_var, "OPENROUTER_API_KEY");
    }

    #[test]
    fn explicit_model_override_wins() {
        let model = Provider::Gemini.resolve_model(Some("custom-model".to_string()));
        assert_eq!(model, "custom-model");
    }
}
