//! Writes rendered articles to the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::domain::{ArticleRecord, PublishedArticle};
use crate::errors::PipelineError;
use crate::render::TemplateRenderer;
use crate::slug::sanitize_slug;

/// Persists articles as `<output_dir>/<slug>.html`.
///
/// Existing files with the same slug are overwritten without warning. There
/// is no locking: concurrent writers to one slug race and the last one wins.
#[derive(Clone, Debug)]
pub struct ArticlePublisher {
    renderer: TemplateRenderer,
    output_dir: PathBuf,
    public_base_url: String,
}

impl ArticlePublisher {
    pub fn new(
        renderer: TemplateRenderer,
        output_dir: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self { renderer, output_dir: output_dir.into(), public_base_url: public_base_url.into() }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    pub fn publish(
        &self,
        record: &ArticleRecord,
        now: DateTime<Utc>,
    ) -> Result<PublishedArticle, PipelineError> {
        let slug = sanitize_slug(&record.slug);
        let saved_path = self.output_dir.join(format!("{slug}.html"));

        fs::create_dir_all(&self.output_dir).map_err(|source| PipelineError::Persist {
            path: self.output_dir.clone(),
            message: source.to_string(),
        })?;

        // The page sees the slug exactly as generated; only the file name and URL are sanitized.
        let html = self.renderer.render(record, now)?;

        fs::write(&saved_path, html).map_err(|source| PipelineError::Persist {
            path: saved_path.clone(),
            message: source.to_string(),
        })?;

        Ok(PublishedArticle {
            title: record.title.clone(),
            meta_description: record.meta_description.clone(),
            keywords: record.keywords.clone(),
            public_url: public_url(&self.public_base_url, &slug),
            slug,
            saved_path,
        })
    }
}

/// Joins the public base URL and the article file name. Not validated
/// against the actual hosting.
pub fn public_url(base_url: &str, slug: &str) -> String {
    format!("{}/{slug}.html", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use super::{public_url, ArticlePublisher};
    use crate::domain::ArticleRecord;
    use crate::errors::PipelineError;
    use crate::render::TemplateRenderer;

    const BASE_URL: &str = "https://example.github.io/site/blog";

    fn record(title: &str, slug: &str) -> ArticleRecord {
        ArticleRecord {
            title: title.to_string(),
            slug: slug.to_string(),
            meta_description: "meta".to_string(),
            keywords: "a, b, c".to_string(),
            html_content: "<p>body</p>".to_string(),
        }
    }

    fn publisher(dir: &TempDir) -> ArticlePublisher {
        let template = dir.path().join("template.html");
        fs::write(&template, "<title>{{ title }}</title><a href=\"{{ slug }}.html\"></a>")
            .expect("write template");
        ArticlePublisher::new(TemplateRenderer::new(template), dir.path().join("blog/nested"), BASE_URL)
    }

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).single().expect("valid timestamp")
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = TempDir::new().expect("temp dir");
        let publisher = publisher(&dir);
        assert!(!publisher.output_dir().exists());

        let published = publisher.publish(&record("First", "first"), now()).expect("publish");

        assert!(publisher.output_dir().is_dir());
        assert_eq!(published.saved_path, publisher.output_dir().join("first.html"));
        assert!(published.saved_path.is_file());
    }

    #[test]
    fn same_slug_overwrites_in_place() {
        let dir = TempDir::new().expect("temp dir");
        let publisher = publisher(&dir);

        let first = publisher.publish(&record("Old title", "story"), now()).expect("first");
        let second = publisher.publish(&record("New title", "story"), now()).expect("second");

        assert_eq!(first.saved_path, second.saved_path);
        let html = fs::read_to_string(&second.saved_path).expect("read article");
        assert!(html.contains("New title"));
        assert!(!html.contains("Old title"));
        assert_eq!(fs::read_dir(publisher.output_dir()).expect("list").count(), 1);
    }

    #[test]
    fn different_slugs_produce_distinct_files() {
        let dir = TempDir::new().expect("temp dir");
        let publisher = publisher(&dir);

        let one = publisher.publish(&record("One", "one"), now()).expect("one");
        let two = publisher.publish(&record("Two", "two"), now()).expect("two");

        assert_ne!(one.saved_path, two.saved_path);
        assert_eq!(fs::read_dir(publisher.output_dir()).expect("list").count(), 2);
    }

    #[test]
    fn slug_is_sanitized_for_path_and_url_only() {
        let dir = TempDir::new().expect("temp dir");
        let publisher = publisher(&dir);

        let published =
            publisher.publish(&record("Title", "../Breaking News!!"), now()).expect("publish");

        assert_eq!(published.slug, "breaking-news");
        assert_eq!(published.saved_path, publisher.output_dir().join("breaking-news.html"));
        assert_eq!(published.public_url, format!("{BASE_URL}/breaking-news.html"));
        let html = fs::read_to_string(&published.saved_path).expect("read article");
        assert!(html.contains("href=\"../Breaking News!!.html\""));
    }

    #[test]
    fn page_receives_generated_slug_verbatim() {
        let dir = TempDir::new().expect("temp dir");
        let template = dir.path().join("slug.html");
        fs::write(&template, "{{ slug }}").expect("write template");
        let publisher =
            ArticlePublisher::new(TemplateRenderer::new(template), dir.path().join("blog"), BASE_URL);

        let published = publisher.publish(&record("Hi", "Hello World"), now()).expect("publish");

        assert_eq!(published.saved_path, dir.path().join("blog/hello-world.html"));
        assert_eq!(fs::read_to_string(&published.saved_path).expect("read article"), "Hello World");
    }

    #[test]
    fn missing_template_surfaces_as_template_error() {
        let dir = TempDir::new().expect("temp dir");
        let publisher = ArticlePublisher::new(
            TemplateRenderer::new(dir.path().join("absent.html")),
            dir.path().join("blog"),
            BASE_URL,
        );

        let error = publisher.publish(&record("x", "x"), now()).expect_err("no template");
        assert!(matches!(error, PipelineError::Template { .. }));
    }

    #[test]
    fn public_url_tolerates_trailing_slash() {
        assert_eq!(public_url("https://host/blog/", "a"), "https://host/blog/a.html");
        assert_eq!(public_url("https://host/blog", "a"), "https://host/blog/a.html");
    }
}
