use thiserror::Error;

/// Failures surfaced by the data-fusion core.
///
/// Join misses and unparsable counts are not errors: they are absorbed into the
/// data model as an absent record or a zero count.
#[derive(Debug, Error)]
pub enum Error {
    /// The statistics payload lacks the dimension/index/value structure, or its
    /// value array does not match the declared region layout.
    #[error("malformed statistics response: {0}")]
    MalformedResponse(String),

    /// The geometry payload is not a GeoJSON FeatureCollection.
    #[error("malformed geometry collection: {0}")]
    MalformedGeometry(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
