use crate::Rule;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid Bril JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid Bril text:\n{0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: literal `{literal}` is not valid for `{op}`")]
    UnexpectedLiteral {
        line: usize,
        op: String,
        literal: String,
    },

    #[error("Line {line}: `const` needs a value")]
    MissingValue { line: usize },
}

pub type Result<T> = std::result::Result<T, ParseError>;
