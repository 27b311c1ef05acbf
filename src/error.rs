use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Corpus load error, the manifest may be missing or does not match the expected format: {0}")]
    CorpusLoad(String),

    #[error("No frames found for sample: {0}")]
    MissingFrames(String),

    #[error("Token not found in vocabulary: {0}")]
    UnknownToken(String),

    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),

    #[error("Invalid frame drop rate: {0}")]
    InvalidDropRate(String),

    #[error("Invalid dataset configuration: {0}")]
    InvalidConfig(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
