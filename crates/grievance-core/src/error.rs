use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrievanceError {
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unexpected: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl GrievanceError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Forbidden(_) => 403,
            Self::InvalidArgument(_) => 400,
            Self::NotFound(_) => 404,
            Self::Unexpected(_) => 500,
        }
    }

    /// Stable machine-readable kind, used as the `error` field on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "forbidden",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound(_) => "not_found",
            Self::Unexpected(_) => "unexpected",
        }
    }

    pub fn grievance_not_found(id: i64) -> Self {
        Self::NotFound(format!("grievance {id} not found"))
    }
}

pub type Result<T> = std::result::Result<T, GrievanceError>;
