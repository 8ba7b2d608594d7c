use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DischargeError {
    #[error("data file not found: {}", path.display())]
    MissingFile { path: PathBuf },
    #[error("malformed data in {}:{line}: {reason}", path.display())]
    MalformedData {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("invalid channel name {name:?}: {reason}")]
    InvalidChannelName { name: String, reason: String },
    #[error("no sample of {channel} exceeds the discharge threshold {threshold}")]
    NoDischargeDetected { channel: String, threshold: f64 },
    #[error("summary value {0} is undefined; load its source channel first")]
    UndefinedSummary(&'static str),
    #[error("shot {shot} has no channel {channel}")]
    MissingChannel { shot: u32, channel: String },
    #[error("nothing to plot: {0}")]
    EmptySelection(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to render plot: {0}")]
    Plot(String),
}

pub type DischargeResult<T> = Result<T, DischargeError>;

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for DischargeError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        DischargeError::Plot(format!("{value:?}"))
    }
}

impl From<image::ImageError> for DischargeError {
    fn from(value: image::ImageError) -> Self {
        DischargeError::Plot(value.to_string())
    }
}
