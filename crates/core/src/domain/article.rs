use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Field names every generation response must carry, in canonical order.
pub const REQUIRED_FIELDS: [&str; 5] = ["title", "slug", "meta_description", "keywords", "html_content"];

const META_DESCRIPTION_CHARS: std::ops::RangeInclusive<usize> = 150..=160;
const KEYWORD_COUNT: std::ops::RangeInclusive<usize> = 5..=8;

/// A user's request for a single article.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRequest {
    topic: String,
}

impl ArticleRequest {
    /// Builds a request from raw chat text. Returns `None` for blank input.
    pub fn from_text(text: &str) -> Option<Self> {
        let topic = text.trim();
        if topic.is_empty() {
            None
        } else {
            Some(Self { topic: topic.to_string() })
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Structured article returned by the generation backend.
///
/// All five fields are guaranteed present once a record exists; their
/// contents are whatever the backend produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub slug: String,
    pub meta_description: String,
    pub keywords: String,
    pub html_content: String,
}

impl ArticleRecord {
    /// Soft checks against the length hints given to the backend.
    ///
    /// These never reject a record; callers log them.
    pub fn advisories(&self) -> Vec<String> {
        let mut notes = Vec::new();

        let meta_chars = self.meta_description.chars().count();
        if !META_DESCRIPTION_CHARS.contains(&meta_chars) {
            notes.push(format!(
                "meta_description is {meta_chars} characters (expected {}-{})",
                META_DESCRIPTION_CHARS.start(),
                META_DESCRIPTION_CHARS.end()
            ));
        }

        let keyword_count =
            self.keywords.split(',').filter(|keyword| !keyword.trim().is_empty()).count();
        if !KEYWORD_COUNT.contains(&keyword_count) {
            notes.push(format!(
                "keywords lists {keyword_count} terms (expected {}-{})",
                KEYWORD_COUNT.start(),
                KEYWORD_COUNT.end()
            ));
        }

        notes
    }
}

/// Summary of an article after it has been written to disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PublishedArticle {
    pub title: String,
    pub meta_description: String,
    pub keywords: String,
    pub slug: String,
    pub saved_path: PathBuf,
    pub public_url: String,
}
