use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("Invalid CSS selector '{0}'")]
    InvalidSelector(String),
    #[error("Embedded data is missing key: {0}")]
    EmbeddedDataMissingKey(String),
    #[error("Embedded data has wrong shape: {0}")]
    EmbeddedDataInvalidShape(String),
    #[error("Failed to decode embedded data: {0}")]
    InvalidEmbeddedData(#[from] serde_json::Error),
    #[error("Page {0} was not rendered by a browser")]
    PageNotRendered(String),
}
