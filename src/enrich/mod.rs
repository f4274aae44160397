use serde::Deserialize;

use crate::llm::openai::{ChatMessage, ChatRequest, ChatRole, LlmClient, OpenAiError};

/// The newsletter's topic labels. Classification output is validated
/// against this list; anything unrecognizable lands in the fallback.
pub const TOPICS: &[&str] = &[
    "Models",
    "Agents & Tools",
    "MCP & SKILLs",
    "Safety",
    "Industry",
];

pub const FALLBACK_TOPIC: &str = "Industry";

const SNIPPET_MAX_CHARS: usize = 500;

const DEFAULT_TOPIC_PROMPT: &str = "You are classifying AI news articles into exactly one topic for a daily newsletter.\n\n\
Topics (respond with ONLY one of these exact labels):\n\
- Models\n\
- Agents & Tools\n\
- MCP & SKILLs\n\
- Safety\n\
- Industry\n\n\
Given the article title and optionally a short snippet, respond with exactly one topic label from the list above. No explanation, just the topic.";

const SUMMARIZE_PROMPT: &str = "You are a concise tech news summarizer. Given an article title and content, produce:\n\
1. \"summary\": a 2-3 sentence summary that captures the key news and why it matters, in clear accessible language\n\
2. \"opinion\": a single-sentence editorial take on the story\n\
3. \"image_url\": a relevant image URL if one appears in the content, else null\n\n\
Respond with a single JSON object with exactly those three keys. No preamble, no markdown fences.";

/// Enrichment fields produced for one item. `image_url` is optional; the
/// orchestrator only adopts it when the item has none of its own.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Enrichment {
    pub summary: String,
    pub opinion: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// The enrichment collaborator: wraps an [`LlmClient`] with the two call
/// shapes the pipeline needs. `classify` is the cheap topic-only shape
/// used at ingestion time; `summarize` is the expensive shape invoked
/// just-in-time for items actually selected into a digest.
pub struct Enricher<'a> {
    client: &'a dyn LlmClient,
    topic_prompt: String,
}

impl<'a> Enricher<'a> {
    pub fn new(client: &'a dyn LlmClient) -> Self {
        let topic_prompt = std::env::var("NEWSY_TOPIC_PROMPT")
            .unwrap_or_else(|_| DEFAULT_TOPIC_PROMPT.to_string());
        Self {
            client,
            topic_prompt,
        }
    }

    /// Topic-only classification. Transport errors propagate (the caller
    /// defers the item); unrecognizable model output degrades to the
    /// fallback label instead.
    pub async fn classify(
        &self,
        title: &str,
        snippet: Option<&str>,
    ) -> Result<String, OpenAiError> {
        let mut context = format!("Title: {title}");
        if let Some(snippet) = snippet.filter(|s| !s.trim().is_empty()) {
            context.push_str("\nSnippet: ");
            context.push_str(truncate_chars(snippet, SNIPPET_MAX_CHARS));
        }

        let request = ChatRequest {
            model: None,
            messages: vec![
                ChatMessage::new(ChatRole::System, self.topic_prompt.clone()),
                ChatMessage::new(ChatRole::User, context),
            ],
            max_tokens: Some(16),
            temperature: Some(0.0),
        };

        let content = self.client.chat(request).await?;
        Ok(match_topic(&content).unwrap_or(FALLBACK_TOPIC).to_string())
    }

    /// Full enrichment: summary + opinion + optional image reference,
    /// returned as parsed JSON.
    pub async fn summarize(
        &self,
        title: &str,
        content: Option<&str>,
    ) -> Result<Enrichment, OpenAiError> {
        let body = content.filter(|c| !c.trim().is_empty()).unwrap_or(title);
        let request = ChatRequest {
            model: None,
            messages: vec![
                ChatMessage::new(ChatRole::System, SUMMARIZE_PROMPT),
                ChatMessage::new(
                    ChatRole::User,
                    format!("Title: {title}\n\nContent: {body}"),
                ),
            ],
            max_tokens: Some(512),
            temperature: None,
        };

        let content = self.client.chat(request).await?;
        parse_enrichment(&content)
    }
}

// Accept the label anywhere in the reply; models like to add punctuation.
fn match_topic(text: &str) -> Option<&'static str> {
    let text = text.trim();
    let lowered = text.to_lowercase();
    TOPICS
        .iter()
        .copied()
        .find(|t| text == *t || lowered.contains(&t.to_lowercase()))
}

fn parse_enrichment(content: &str) -> Result<Enrichment, OpenAiError> {
    let cleaned = strip_code_fences(content);
    serde_json::from_str::<Enrichment>(cleaned).map_err(OpenAiError::Decode)
}

// Models sometimes wrap JSON in ```json fences despite instructions.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::openai::MockClient;

    #[test]
    fn topic_matching_is_case_insensitive_and_tolerant() {
        assert_eq!(match_topic("Models"), Some("Models"));
        assert_eq!(match_topic("  agents & tools.\n"), Some("Agents & Tools"));
        assert_eq!(match_topic("The topic is Safety"), Some("Safety"));
        assert_eq!(match_topic("something else entirely"), None);
    }

    #[test]
    fn enrichment_json_parses_with_and_without_fences() {
        let plain = r#"{"summary": "S.", "opinion": "O.", "image_url": null}"#;
        let parsed = parse_enrichment(plain).unwrap();
        assert_eq!(parsed.summary, "S.");
        assert_eq!(parsed.opinion, "O.");
        assert_eq!(parsed.image_url, None);

        let fenced = "```json\n{\"summary\": \"S.\", \"opinion\": \"O.\", \"image_url\": \"https://x/y.png\"}\n```";
        let parsed = parse_enrichment(fenced).unwrap();
        assert_eq!(parsed.image_url.as_deref(), Some("https://x/y.png"));
    }

    #[test]
    fn enrichment_junk_is_a_decode_error() {
        assert!(matches!(
            parse_enrichment("not json at all"),
            Err(OpenAiError::Decode(_))
        ));
    }

    #[test]
    fn snippet_truncation_respects_char_boundaries() {
        let s = "é".repeat(600);
        assert_eq!(truncate_chars(&s, 500).chars().count(), 500);
        assert_eq!(truncate_chars("short", 500), "short");
    }

    #[tokio::test]
    async fn classify_validates_label_and_falls_back() {
        let mock = MockClient::new();
        mock.push_response(Ok("Agents & Tools".to_string()));
        mock.push_response(Ok("no idea, sorry".to_string()));

        let enricher = Enricher::new(&mock);
        let topic = enricher.classify("New agent framework", None).await.unwrap();
        assert_eq!(topic, "Agents & Tools");

        let topic = enricher.classify("Mystery title", None).await.unwrap();
        assert_eq!(topic, FALLBACK_TOPIC);
    }

    #[tokio::test]
    async fn classify_includes_snippet_in_context() {
        let mock = MockClient::new();
        mock.push_response(Ok("Models".to_string()));

        let enricher = Enricher::new(&mock);
        enricher
            .classify("Title here", Some("body text"))
            .await
            .unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        let user = &calls[0].messages[1].content;
        assert!(user.contains("Title here"));
        assert!(user.contains("Snippet: body text"));
    }

    #[tokio::test]
    async fn summarize_parses_model_json() {
        let mock = MockClient::new();
        mock.push_response(Ok(
            r#"{"summary": "Big release.", "opinion": "Matters a lot.", "image_url": null}"#
                .to_string(),
        ));

        let enricher = Enricher::new(&mock);
        let enrichment = enricher
            .summarize("Release", Some("Details of the release"))
            .await
            .unwrap();

        assert_eq!(enrichment.summary, "Big release.");
        assert_eq!(enrichment.opinion, "Matters a lot.");
        assert!(enrichment.image_url.is_none());
    }
}
