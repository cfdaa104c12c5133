use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("acquisition failed: {0}")]
    Acquisition(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("type coercion failed: {0}")]
    Coercion(String),

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("database error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EtlError>;
