use nomorejokes_core::domain::PublishedArticle;
use nomorejokes_core::flows::FlowReply;
use serde::Serialize;

/// `sendMessage` rejects text longer than this many characters.
pub const MESSAGE_CHAR_LIMIT: usize = 4096;

const TITLE_CHARS: usize = 256;
const SUMMARY_FIELD_CHARS: usize = 512;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    Markdown,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageTemplate {
    pub text: String,
    pub parse_mode: Option<ParseMode>,
}

impl MessageTemplate {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), parse_mode: None }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self { text: text.into(), parse_mode: Some(ParseMode::Markdown) }
    }
}

pub fn render_reply(reply: &FlowReply) -> MessageTemplate {
    match reply {
        FlowReply::Greeting => MessageTemplate::markdown(
            "👋 Welcome to *NoMoreJokes Bot*!\n\n\
             Use /generate or /publish and then send me a news headline or trending topic \
             to generate an SEO-optimized article.\n\n\
             Use /cancel at any time to stop.",
        ),
        FlowReply::TopicRequested => MessageTemplate::markdown(
            "📰 Send me a *news headline or trending topic* and I'll write a full article for you.",
        ),
        FlowReply::EmptyTopic => MessageTemplate::plain("Please send a non-empty topic."),
        FlowReply::Generating => {
            MessageTemplate::plain("⏳ Generating your article… this may take a moment.")
        }
        FlowReply::Published(article) => published_summary(article),
        FlowReply::ParseFailure => {
            MessageTemplate::plain("❌ Could not parse the AI response. Please try again later.")
        }
        FlowReply::GenerationFailure => MessageTemplate::plain(
            "❌ An error occurred while generating the article. Please try again later.",
        ),
        FlowReply::Cancelled => {
            MessageTemplate::plain("❎ Cancelled. Use /generate or /publish to start again.")
        }
    }
}

fn published_summary(article: &PublishedArticle) -> MessageTemplate {
    let saved_path = article.saved_path.display().to_string().replace('`', "'");
    let text = format!(
        "✅ *Article generated!*\n\n\
         📌 *Title:* {}\n\
         📝 *Meta:* {}\n\
         🔑 *Keywords:* {}\n\
         📁 *Saved to:* `{}`\n\
         🌐 *URL:* {}",
        escape_markdown(&clip(&article.title, TITLE_CHARS)),
        escape_markdown(&clip(&article.meta_description, SUMMARY_FIELD_CHARS)),
        escape_markdown(&clip(&article.keywords, SUMMARY_FIELD_CHARS)),
        saved_path,
        escape_markdown(&article.public_url),
    );
    if text.chars().count() <= MESSAGE_CHAR_LIMIT {
        return MessageTemplate::markdown(text);
    }

    // The article is on disk either way; keep only what locates it.
    let fallback = format!(
        "✅ Article generated!\n\n📁 Saved to: {saved_path}\n🌐 URL: {}",
        article.public_url
    );
    MessageTemplate::plain(clip(&fallback, MESSAGE_CHAR_LIMIT))
}

/// Cuts `text` to at most `max_chars` characters, marking the cut with `…`.
fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

/// Escapes the characters legacy Telegram Markdown treats as entity markers.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
