use std::path::PathBuf;

use thiserror::Error;

use crate::{flows::FlowReply, response::ResponseError};

/// Failures of a single article generation run.
///
/// Every variant is recoverable: the session is reset and the user sees a
/// short fixed message, never the error text itself.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("generation backend failure: {0}")]
    Backend(String),
    #[error("could not parse generation response: {0}")]
    Parse(String),
    #[error("generation response failed validation; missing fields: {}", missing.join(", "))]
    Validation { missing: Vec<String> },
    #[error("could not read template `{path}`: {message}")]
    Template { path: PathBuf, message: String },
    #[error("could not write article `{path}`: {message}")]
    Persist { path: PathBuf, message: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Parse,
    Validation,
    Backend,
    Template,
    Persist,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Validation => "validation",
            Self::Backend => "backend",
            Self::Template => "template",
            Self::Persist => "persist",
        }
    }
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Backend(_) => FailureKind::Backend,
            Self::Parse(_) => FailureKind::Parse,
            Self::Validation { .. } => FailureKind::Validation,
            Self::Template { .. } => FailureKind::Template,
            Self::Persist { .. } => FailureKind::Persist,
        }
    }

    /// The reply shown to the user. Only parse failures get their own message.
    pub fn user_reply(&self) -> FlowReply {
        match self {
            Self::Parse(_) => FlowReply::ParseFailure,
            _ => FlowReply::GenerationFailure,
        }
    }
}

impl From<ResponseError> for PipelineError {
    fn from(value: ResponseError) -> Self {
        match value {
            ResponseError::Parse(message) => Self::Parse(message),
            ResponseError::MissingFields { missing } => Self::Validation { missing },
        }
    }
}
