pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod prompt;
pub mod publish;
pub mod readiness;
pub mod render;
pub mod response;
pub mod slug;

pub use domain::{ArticleRecord, ArticleRequest, PublishedArticle};
pub use errors::{FailureKind, PipelineError};
pub use flows::{
    FlowAction, FlowEngine, FlowReply, FlowTransitionError, SessionEvent, SessionKey,
    SessionState, TransitionOutcome,
};
pub use prompt::build_prompt;
pub use publish::ArticlePublisher;
pub use readiness::{check_output_dir, check_template, ReadinessCheck};
pub use render::TemplateRenderer;
pub use response::{parse_article_response, ResponseError};
pub use slug::sanitize_slug;
