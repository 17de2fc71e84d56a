use serde::de::DeserializeOwned;
use serde_json::Value;

/// A serde failure plus the JSON path where it happened.
#[derive(Debug, thiserror::Error)]
#[error("at JSON path {path} → {inner}")]
pub struct PathError {
    pub path: String,
    pub inner: serde_json::Error,
}

/// Deserialize with JSON-path context in error messages.
pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PathError> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de).map_err(into_path_error)
}

/// Same as [`from_slice_with_path`] for an already parsed value.
pub fn from_value_with_path<T: DeserializeOwned>(value: &Value) -> Result<T, PathError> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(into_path_error)
}

fn into_path_error(err: serde_path_to_error::Error<serde_json::Error>) -> PathError {
    let path = err.path().to_string();
    PathError { path, inner: err.into_inner() }
}
