pub mod article;

pub use article::{ArticleRecord, ArticleRequest, PublishedArticle, REQUIRED_FIELDS};
