//! Built-in provider implementations. Adding a backend means adding a module
//! here and registering it in [`builtin`]; nothing else changes.

mod anthropic;
mod custom;
mod gemini;
mod huggingface;
mod ollama;
mod openai;

pub use anthropic::AnthropicProvider;
pub use custom::CustomProvider;
pub use gemini::GeminiProvider;
pub use huggingface::HuggingFaceProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::provider::Provider;
use std::collections::BTreeMap;
use std::sync::Arc;

const CUSTOM_ENDPOINT: &str = "https://api.example.com/custom_ia";

/// The default provider table. A `BTreeMap` keeps iteration order stable,
/// which is what gives `first_valid` and default fan-out their determinism.
pub fn builtin() -> BTreeMap<String, Arc<dyn Provider>> {
    let providers: Vec<Arc<dyn Provider>> = vec![
        Arc::new(OpenAiProvider::new()),
        Arc::new(HuggingFaceProvider::new()),
        Arc::new(AnthropicProvider::new()),
        Arc::new(GeminiProvider::new()),
        Arc::new(OllamaProvider::new()),
        Arc::new(CustomProvider::new("custom", CUSTOM_ENDPOINT)),
    ];
    providers
        .into_iter()
        .map(|p| (p.name().to_string(), p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_complete_and_ordered() {
        let table = builtin();
        let names: Vec<&str> = table.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            ["anthropic", "custom", "gemini", "huggingface", "ollama", "openai"]
        );
    }

    #[test]
    fn only_local_and_custom_skip_credentials() {
        let table = builtin();
        for (name, provider) in &table {
            let expected = !matches!(name.as_str(), "ollama" | "custom");
            assert_eq!(provider.requires_credential(), expected, "{name}");
        }
    }
}
