//! Prompt sent to the generation backend for a single article.

use crate::domain::ArticleRequest;

/// Builds the generation prompt for a topic.
///
/// The caller guarantees the topic is trimmed and non-empty, which
/// [`ArticleRequest`] enforces.
pub fn build_prompt(request: &ArticleRequest) -> String {
    let topic = request.topic();
    [
        "You are a skilled human journalist writing for a general audience.",
        "Write a compelling, emotionally engaging article about the following topic or headline.",
        "",
        &format!("Topic: {topic}"),
        "",
        "Requirements:",
        "- Length: 800-1200 words",
        "- Style: human storytelling, emotional, engaging; avoid robotic or listicle tone",
        "- Structure: an introduction, at least three sections each with one H2 heading and",
        "  optional H3 subheadings where appropriate, and a conclusion",
        "- Return a single JSON object with EXACTLY these keys:",
        "  \"title\": article title (string)",
        "  \"slug\": URL-safe slug, lowercase, hyphens only (string)",
        "  \"meta_description\": 150-160 characters summary for SEO (string)",
        "  \"keywords\": comma-separated SEO keywords, 5-8 keywords (string)",
        "  \"html_content\": the article body as clean HTML using <p>, <h2>, and <h3> tags only",
        "    (NO <html>, <head>, <body>, or <article> wrappers) (string)",
        "",
        "Return ONLY the JSON object with no markdown fences or extra text.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::build_prompt;
    use crate::domain::{ArticleRequest, REQUIRED_FIELDS};

    fn prompt_for(topic: &str) -> String {
        build_prompt(&ArticleRequest::from_text(topic).expect("non-empty topic"))
    }

    #[test]
    fn embeds_topic_verbatim() {
        let prompt = prompt_for("  Heatwave breaks records in Lisbon ");
        assert!(prompt.contains("Topic: Heatwave breaks records in Lisbon\n"));
    }

    #[test]
    fn names_every_required_field() {
        let prompt = prompt_for("anything");
        for field in REQUIRED_FIELDS {
            assert!(prompt.contains(&format!("\"{field}\"")), "prompt should mention {field}");
        }
    }

    #[test]
    fn constrains_length_tags_and_format() {
        let prompt = prompt_for("anything");
        assert!(prompt.contains("800-1200 words"));
        assert!(prompt.contains("<p>, <h2>, and <h3> tags only"));
        assert!(prompt.contains("no markdown fences"));
        assert!(prompt.contains("at least three sections"));
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(prompt_for("same topic"), prompt_for("same topic"));
    }
}
