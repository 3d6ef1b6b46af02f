use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::anthropic;
use std::time::Duration;
use tracing::instrument;

use crate::domain::{ports::GenerationProducer, DomainError, GenerationRequest};
use crate::infrastructure::capability::{classify, with_timeout};
use crate::infrastructure::config::{LlmConfig, PromptsConfig};
use crate::infrastructure::llm::render_prompt;

pub struct AnthropicGeneration {
    client: anthropic::Client,
    model: String,
    temperature: f64,
    max_tokens: u64,
    timeout: Duration,
    prompts: PromptsConfig,
}

impl AnthropicGeneration {
    /// Reads `ANTHROPIC_API_KEY` from the environment.
    pub fn from_config(config: &LlmConfig, prompts: &PromptsConfig) -> Result<Self, DomainError> {
        if std::env::var("ANTHROPIC_API_KEY").map_or(true, |k| k.trim().is_empty()) {
            return Err(DomainError::validation("ANTHROPIC_API_KEY is not set"));
        }

        Ok(Self {
            client: anthropic::Client::from_env(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout(),
            prompts: prompts.clone(),
        })
    }
}

#[async_trait]
impl GenerationProducer for AnthropicGeneration {
    #[instrument(skip(self, request), fields(model = %self.model, context = request.context.len()))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String, DomainError> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(&self.prompts.system)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build();
        let prompt = render_prompt(request, &self.prompts);

        with_timeout("generation", self.timeout, async {
            agent
                .prompt(prompt.as_str())
                .await
                .map_err(|e| classify("generation", e))
        })
        .await
    }
}
