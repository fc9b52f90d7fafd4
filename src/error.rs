use thiserror::Error;

pub type PostMortemResult<T> = Result<T, PostMortemError>;

#[derive(Debug, Error)]
pub enum PostMortemError {
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("invalid dashboard config: {0}")]
    InvalidConfig(String),

    #[error("warehouse script `{script}` failed: {reason}")]
    UpstreamQuery { script: String, reason: String },

    #[error("malformed result from `{script}` in column `{column}`: {reason}")]
    MalformedResult {
        script: String,
        column: String,
        reason: String,
    },

    #[error("visibility vector does not match layer list: expected {expected} layers, got {actual}")]
    VisibilityMismatch { expected: usize, actual: usize },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl PostMortemError {
    pub(crate) fn malformed(
        script: &str,
        column: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedResult {
            script: script.to_owned(),
            column: column.to_owned(),
            reason: reason.into(),
        }
    }
}
