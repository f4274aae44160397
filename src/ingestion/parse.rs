use anyhow::Result;
use bytes::Bytes;
use rss::{Channel, Item as RssItem};
use scraper::Html;

use super::types::NewItem;

const SNIPPET_MAX_CHARS: usize = 500;

// Keywords used to filter general-purpose tech feeds down to AI coverage.
const AI_KEYWORDS: &[&str] = &[
    "ai",
    "artificial intelligence",
    "machine learning",
    "deep learning",
    "neural network",
    "gpt",
    "llm",
    "chatgpt",
    "openai",
    "anthropic",
    "claude",
    "gemini",
    "transformer",
    "generative ai",
    "diffusion",
    "stable diffusion",
    "midjourney",
    "copilot",
    "automation",
];

pub fn parse_channel(xml: &Bytes) -> Result<Channel> {
    let ch = Channel::read_from(&xml[..])?;
    Ok(ch)
}

/// Map one RSS entry to a candidate item. Entries without a title or link
/// are dropped; the description is flattened to text and truncated.
pub fn entry_to_candidate(source: &str, entry: &RssItem) -> Option<NewItem> {
    let title = entry.title()?.trim().to_string();
    let url = entry.link()?.trim().to_string();
    if title.is_empty() || url.is_empty() {
        return None;
    }

    let content = entry
        .description()
        .map(strip_html)
        .map(|text| truncate_chars(&text, SNIPPET_MAX_CHARS).to_string())
        .filter(|text| !text.is_empty());

    let image_url = entry
        .enclosure()
        .filter(|enc| enc.mime_type().starts_with("image/"))
        .map(|enc| enc.url().to_string());

    Some(NewItem {
        url,
        title,
        source: source.to_string(),
        content,
        image_url,
    })
}

/// Keyword filter for general feeds; feeds whose name already scopes them
/// to AI skip this check.
pub fn is_ai_related(title: &str, snippet: Option<&str>) -> bool {
    let text = format!("{} {}", title, snippet.unwrap_or("")).to_lowercase();
    AI_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join("")
        .trim()
        .to_string()
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
    use rss::{Enclosure, Item as RssItem};

    fn entry(title: Option<&str>, link: Option<&str>, description: Option<&str>) -> RssItem {
        let mut entry = RssItem::default();
        entry.set_title(title.map(String::from));
        entry.set_link(link.map(String::from));
        entry.set_description(description.map(String::from));
        entry
    }

    fn enclosure(url: &str, mime: &str) -> Enclosure {
        let mut enc = Enclosure::default();
        enc.set_url(url.to_string());
        enc.set_mime_type(mime.to_string());
        enc
    }

    #[test]
    fn entry_without_link_is_dropped() {
        let entry = entry(Some("T"), None, None);
        assert!(entry_to_candidate("The Verge", &entry).is_none());
    }

    #[test]
    fn description_html_is_stripped() {
        let entry = entry(
            Some("Model news"),
            Some("https://example.com/a"),
            Some("<p>Hello <b>world</b></p>"),
        );

        let candidate = entry_to_candidate("The Verge", &entry).unwrap();
        assert_eq!(candidate.content.as_deref(), Some("Hello world"));
        assert_eq!(candidate.source, "The Verge");
    }

    #[test]
    fn image_enclosure_is_captured() {
        let mut e = entry(Some("T"), Some("https://example.com/a"), None);
        e.set_enclosure(enclosure("https://example.com/a.png", "image/png"));

        let candidate = entry_to_candidate("Ars", &e).unwrap();
        assert_eq!(
            candidate.image_url.as_deref(),
            Some("https://example.com/a.png")
        );
    }

    #[test]
    fn audio_enclosure_is_ignored() {
        let mut e = entry(Some("T"), Some("https://example.com/a"), None);
        e.set_enclosure(enclosure("https://example.com/a.mp3", "audio/mpeg"));

        assert!(entry_to_candidate("Ars", &e).unwrap().image_url.is_none());
    }

    #[test]
    fn keyword_filter_matches_title_or_snippet() {
        assert!(is_ai_related("OpenAI ships a new model", None));
        assert!(is_ai_related("Quarterly results", Some("the LLM boom continues")));
        assert!(!is_ai_related("New phone released", Some("battery life improves")));
    }
}
