use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid dataType: {0}")]
    UnknownDataType(String),

    #[error("invalid reportType: {0}")]
    UnknownReportType(String),

    #[error("invalid bucket interval: {0}")]
    InvalidBucketInterval(String),
}
