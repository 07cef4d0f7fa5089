//! Literal placeholder substitution into the article HTML template.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::domain::ArticleRecord;
use crate::errors::PipelineError;

pub const TITLE: &str = "{{ title }}";
pub const SLUG: &str = "{{ slug }}";
pub const META_DESCRIPTION: &str = "{{ meta_description }}";
pub const KEYWORDS: &str = "{{ keywords }}";
pub const CONTENT: &str = "{{ content }}";
pub const DATE: &str = "{{ date }}";
pub const YEAR: &str = "{{ year }}";

pub const PLACEHOLDERS: [&str; 7] = [TITLE, SLUG, META_DESCRIPTION, KEYWORDS, CONTENT, DATE, YEAR];

/// Renders articles into the template file found at `template_path`.
///
/// The template is read from disk on every render so edits show up without
/// a restart.
#[derive(Clone, Debug)]
pub struct TemplateRenderer {
    template_path: PathBuf,
}

impl TemplateRenderer {
    pub fn new(template_path: impl Into<PathBuf>) -> Self {
        Self { template_path: template_path.into() }
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn render(&self, record: &ArticleRecord, now: DateTime<Utc>) -> Result<String, PipelineError> {
        let template = fs::read_to_string(&self.template_path).map_err(|source| {
            PipelineError::Template { path: self.template_path.clone(), message: source.to_string() }
        })?;
        Ok(render_template(&template, record, now))
    }
}

/// Substitutes every placeholder occurrence in a single pass.
///
/// Injected values are never rescanned, so a title that happens to contain
/// `{{ slug }}` stays literal. No HTML escaping is applied.
pub fn render_template(template: &str, record: &ArticleRecord, now: DateTime<Utc>) -> String {
    let date = now.format("%B %d, %Y").to_string();
    let year = now.format("%Y").to_string();
    let values: [(&str, &str); 7] = [
        (TITLE, record.title.as_str()),
        (SLUG, record.slug.as_str()),
        (META_DESCRIPTION, record.meta_description.as_str()),
        (KEYWORDS, record.keywords.as_str()),
        (CONTENT, record.html_content.as_str()),
        (DATE, date.as_str()),
        (YEAR, year.as_str()),
    ];

    let mut output = String::with_capacity(template.len() + record.html_content.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match values.iter().find(|(placeholder, _)| candidate.starts_with(placeholder)) {
            Some((placeholder, value)) => {
                output.push_str(value);
                rest = &candidate[placeholder.len()..];
            }
            None => {
                output.push_str("{{");
                rest = &candidate[2..];
            }
        }
    }
    output.push_str(rest);
    output
}
