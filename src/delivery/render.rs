use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::store::Item;

/// "🤖 Newsy • Models • Aug 05 • 4 Stories"
pub fn subject_line(topic: &str, story_count: usize, now: DateTime<Utc>) -> String {
    format!(
        "🤖 Newsy • {topic} • {} • {story_count} {}",
        now.format("%b %d"),
        if story_count == 1 { "Story" } else { "Stories" }
    )
}

/// Render the digest email body. All item-derived text is escaped; the
/// unsubscribe link carries the per-subscriber token.
pub fn render_digest(
    topic: &str,
    items: &[Item],
    now: DateTime<Utc>,
    app_url: &str,
    unsubscribe_token: &str,
) -> String {
    let today = now.format("%B %d, %Y");

    let mut cards = String::new();
    for item in items {
        let title = encode_text(&item.title);
        let url = encode_double_quoted_attribute(&item.url);
        let source = encode_text(&item.source);
        let summary = item
            .summary
            .as_deref()
            .unwrap_or("No summary available.");
        let summary = encode_text(summary);

        let image = item
            .image_url
            .as_deref()
            .map(|src| {
                format!(
                    r#"<img src="{}" alt="" style="max-width: 100%; border-radius: 8px; margin-bottom: 12px;">"#,
                    encode_double_quoted_attribute(src)
                )
            })
            .unwrap_or_default();

        let opinion = item
            .opinion
            .as_deref()
            .map(|op| {
                format!(
                    r#"<p style="margin: 8px 0 0 0; color: #a5b4fc; font-size: 13px; font-style: italic;">{}</p>"#,
                    encode_text(op)
                )
            })
            .unwrap_or_default();

        cards.push_str(&format!(
            r#"
        <div style="background: #1a1a2e; border-radius: 12px; padding: 20px; margin-bottom: 16px; border-left: 4px solid #6366f1;">
            {image}
            <h3 style="margin: 0 0 8px 0; color: #e0e0e0; font-size: 16px;">
                <a href="{url}" style="color: #818cf8; text-decoration: none;">{title}</a>
            </h3>
            <p style="margin: 0 0 8px 0; color: #9ca3af; font-size: 12px;">
                {source}
            </p>
            <p style="margin: 0; color: #d1d5db; font-size: 14px; line-height: 1.5;">
                {summary}
            </p>
            {opinion}
        </div>
        "#
        ));
    }

    let topic = encode_text(topic);
    let unsubscribe = format!(
        "{}/api/unsubscribe?token={}",
        app_url.trim_end_matches('/'),
        unsubscribe_token
    );
    let unsubscribe = encode_double_quoted_attribute(&unsubscribe);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="margin: 0; padding: 0; background-color: #0f0f1a; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;">
    <div style="max-width: 600px; margin: 0 auto; padding: 40px 20px;">

        <!-- Header -->
        <div style="text-align: center; margin-bottom: 32px;">
            <h1 style="color: #ffffff; font-size: 28px; margin: 0;">
                🤖 Newsy
            </h1>
            <p style="color: #9ca3af; margin: 8px 0 0 0; font-size: 14px;">
                Today in {topic} • {today}
            </p>
        </div>

        <!-- Articles -->
        <div style="margin-bottom: 32px;">
            {cards}
        </div>

        <!-- Footer -->
        <div style="text-align: center; padding-top: 24px; border-top: 1px solid #2d2d44;">
            <p style="color: #6b7280; font-size: 12px; margin: 0;">
                You're receiving this because you subscribed to Newsy.
            </p>
            <p style="margin: 8px 0 0 0;">
                <a href="{unsubscribe}"
                   style="color: #6b7280; font-size: 12px; text-decoration: underline;">
                    Unsubscribe
                </a>
            </p>
        </div>

    </div>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(title: &str, url: &str, summary: Option<&str>) -> Item {
        Item {
            item_id: 1,
            url: url.to_string(),
            title: title.to_string(),
            source: "The Verge".to_string(),
            content: None,
            summary: summary.map(String::from),
            opinion: Some("Worth watching.".to_string()),
            image_url: None,
            topic: Some("Models".to_string()),
            fetched_at: Utc::now(),
            sent_at: None,
        }
    }

    #[test]
    fn subject_counts_stories() {
        let now = Utc.with_ymd_and_hms(2025, 8, 5, 9, 0, 0).unwrap();
        let subject = subject_line("Models", 4, now);
        assert!(subject.contains("Models"));
        assert!(subject.contains("Aug 05"));
        assert!(subject.contains("4 Stories"));
        assert!(subject_line("Models", 1, now).contains("1 Story"));
    }

    #[test]
    fn body_contains_cards_and_unsubscribe_link() {
        let now = Utc.with_ymd_and_hms(2025, 8, 5, 9, 0, 0).unwrap();
        let items = vec![item(
            "Big model drop",
            "https://example.com/a",
            Some("It dropped."),
        )];
        let html = render_digest("Models", &items, now, "https://newsy.example", "tok-123");

        assert!(html.contains("Big model drop"));
        assert!(html.contains("https://example.com/a"));
        assert!(html.contains("It dropped."));
        assert!(html.contains("Worth watching."));
        assert!(html.contains("https://newsy.example/api/unsubscribe?token=tok-123"));
        assert!(html.contains("August 05, 2025"));
    }

    #[test]
    fn item_text_is_escaped() {
        let now = Utc::now();
        let items = vec![item(
            "<script>alert(1)</script>",
            "https://example.com/b",
            Some("a < b & c"),
        )];
        let html = render_digest("Models", &items, now, "https://newsy.example", "t");

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn missing_summary_gets_placeholder() {
        let now = Utc::now();
        let items = vec![item("Title", "https://example.com/c", None)];
        let html = render_digest("Models", &items, now, "https://newsy.example", "t");
        assert!(html.contains("No summary available."));
    }
}
