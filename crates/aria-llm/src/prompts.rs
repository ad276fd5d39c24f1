//! Task-shaped prompt helpers layered over the gateway. Each helper wraps
//! the user's text in a fixed instruction and delegates to [`ProviderGateway::query`].

use crate::gateway::ProviderGateway;
use crate::provider::ProviderResult;

impl ProviderGateway {
    /// Translate `text` from `source_language` into `target_language`.
    pub async fn translate(
        &self,
        provider: &str,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> ProviderResult<String> {
        let prompt = format!(
            "Translate the following text from {source_language} to {target_language}: {text}"
        );
        self.query(provider, &prompt, None).await
    }

    /// Summarize `text` in at most `max_words` words.
    pub async fn summarize(
        &self,
        provider: &str,
        text: &str,
        max_words: usize,
    ) -> ProviderResult<String> {
        let prompt = format!("Summarize the following text in {max_words} words or less: {text}");
        self.query(provider, &prompt, None).await
    }

    /// Classify the sentiment of `text` as positive, negative, or neutral.
    pub async fn sentiment(&self, provider: &str, text: &str) -> ProviderResult<String> {
        let prompt = format!(
            "Classify the sentiment of the following text as positive, negative, or neutral. \
             Reply with one word only: {text}"
        );
        self.query(provider, &prompt, None).await
    }

    /// Extract up to `max_keywords` keywords from `text`. The response is
    /// split on commas; whatever the backend returns beyond that is kept as-is.
    pub async fn keywords(
        &self,
        provider: &str,
        text: &str,
        max_keywords: usize,
    ) -> ProviderResult<Vec<String>> {
        let prompt = format!(
            "Extract up to {max_keywords} keywords from the following text, \
             separated by commas: {text}"
        );
        let raw = self.query(provider, &prompt, None).await?;
        Ok(raw
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .take(max_keywords)
            .collect())
    }

    /// Turn a plain description into a detailed prompt for an image model.
    pub async fn image_prompt(&self, provider: &str, description: &str) -> ProviderResult<String> {
        let prompt = format!(
            "Create a detailed image-generation prompt from the following description: \
             {description}\n\nInclude style, lighting, composition, and visual elements."
        );
        self.query(provider, &prompt, None).await
    }

    /// Answer `question`, optionally grounded in `context`.
    pub async fn answer(
        &self,
        provider: &str,
        question: &str,
        context: Option<&str>,
    ) -> ProviderResult<String> {
        let prompt = match context {
            Some(ctx) => format!(
                "Using the following context, answer the question.\n\nContext: {ctx}\n\nQuestion: {question}"
            ),
            None => question.to_string(),
        };
        self.query(provider, &prompt, None).await
    }
}

#[cfg(test)]
mod tests {
    use crate::gateway::{GatewayConfig, ProviderGateway};
    use crate::provider::{Provider, ProviderResult};
    use aria_core::MemoryStore;
    use reqwest::Client;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct RecordingProvider {
        prompts: Mutex<Vec<String>>,
        reply: &'static str,
    }

    #[async_trait::async_trait]
    impl Provider for RecordingProvider {
        fn name(&self) -> &str {
            "recorder"
        }
        fn requires_credential(&self) -> bool {
            false
        }
        async fn query(
            &self,
            _client: &Client,
            prompt: &str,
            _model: Option<&str>,
            _credential: Option<&str>,
        ) -> ProviderResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.to_string())
        }
    }

    fn gateway_with(reply: &'static str) -> (ProviderGateway, Arc<RecordingProvider>) {
        let recorder = Arc::new(RecordingProvider {
            prompts: Mutex::new(Vec::new()),
            reply,
        });
        let mut table: BTreeMap<String, Arc<dyn Provider>> = BTreeMap::new();
        table.insert("recorder".to_string(), recorder.clone());
        let gateway = ProviderGateway::with_providers(
            Arc::new(MemoryStore::new()),
            table,
            GatewayConfig {
                max_retries: 1,
                retry_delay: Duration::from_millis(0),
            },
        );
        (gateway, recorder)
    }

    #[tokio::test]
    async fn translate_embeds_both_languages_and_text() {
        let (gateway, recorder) = gateway_with("bonjour");
        let out = gateway
            .translate("recorder", "hello", "English", "French")
            .await
            .unwrap();
        assert_eq!(out, "bonjour");
        let prompts = recorder.prompts.lock().unwrap();
        assert!(prompts[0].contains("English"));
        assert!(prompts[0].contains("French"));
        assert!(prompts[0].contains("hello"));
    }

    #[tokio::test]
    async fn image_prompt_carries_description_and_asks_for_detail() {
        let (gateway, recorder) = gateway_with("a cinematic shot of a fox");
        gateway
            .image_prompt("recorder", "a fox at dawn")
            .await
            .unwrap();
        let prompts = recorder.prompts.lock().unwrap();
        assert!(prompts[0].contains("a fox at dawn"));
        assert!(prompts[0].contains("lighting"));
    }

    #[tokio::test]
    async fn keywords_splits_on_commas_and_caps_count() {
        let (gateway, _) = gateway_with("rust, async , tokio,, networking");
        let words = gateway.keywords("recorder", "some text", 3).await.unwrap();
        assert_eq!(words, ["rust", "async", "tokio"]);
    }

    #[tokio::test]
    async fn answer_without_context_passes_question_through() {
        let (gateway, recorder) = gateway_with("42");
        gateway.answer("recorder", "meaning of life?", None).await.unwrap();
        assert_eq!(recorder.prompts.lock().unwrap()[0], "meaning of life?");
    }

    #[tokio::test]
    async fn answer_with_context_includes_both() {
        let (gateway, recorder) = gateway_with("blue");
        gateway
            .answer("recorder", "sky color?", Some("the sky is blue"))
            .await
            .unwrap();
        let prompts = recorder.prompts.lock().unwrap();
        assert!(prompts[0].contains("the sky is blue"));
        assert!(prompts[0].contains("sky color?"));
    }
}
