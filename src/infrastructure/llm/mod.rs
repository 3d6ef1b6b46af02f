mod anthropic;
mod openai;

pub use anthropic::AnthropicGeneration;
pub use openai::OpenAiGeneration;

use crate::domain::GenerationRequest;
use crate::infrastructure::config::PromptsConfig;

/// Fills the configured template with the question and the numbered context
/// documents.
pub fn render_prompt(request: &GenerationRequest, prompts: &PromptsConfig) -> String {
    if !request.has_context() {
        return prompts
            .no_context_template
            .replace("{question}", &request.question);
    }

    let context = request
        .context
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            format!(
                "[{}] (id: {}, similarity: {:.3})\n{}",
                i + 1,
                doc.document_id,
                doc.similarity,
                doc.text
            )
        })
        .collect::<Vec<_>>()
        .join(&prompts.document_separator);

    prompts
        .context_template
        .replace("{context}", &context)
        .replace("{question}", &request.question)
}
