use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("expected latitude in [-90, 90] and longitude in [-180, 180] but got: ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("no {kind} with id {id}")]
    NotFound { kind: &'static str, id: i64 },
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("poi search failed with code {code}")]
    PoiSearch { code: i32 },
}
