use std::error::Error;
use std::fmt::{Display, Formatter};

/// Common error type for neuroatlas data operations.
///
/// Covers construction of concepts from their JSON specifications, registry
/// lookups and volume handling.
///
/// # Examples
/// ```
/// use neuroatlas_structures::AtlasDataError;
///
/// fn validate_threshold(threshold: f32) -> Result<(), AtlasDataError> {
///     if !(0.0..=1.0).contains(&threshold) {
///         return Err(AtlasDataError::BadParameters("threshold must be in [0, 1]".into()));
///     }
///     Ok(())
/// }
///
/// assert!(validate_threshold(2.0).is_err());
/// assert!(validate_threshold(0.2).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum AtlasDataError {
    /// A JSON specification is malformed or misses a required field
    DeserializationError(String),
    /// No builder is registered for a type tag
    UnknownType {
        type_id: String,
        candidates: Vec<String>,
    },
    /// Nothing in a registry or tree matches a spec
    NotFound { kind: &'static str, spec: String },
    /// More than one entry matches a spec that must be unique
    Ambiguous {
        kind: &'static str,
        spec: String,
        candidates: Vec<String>,
    },
    /// Requested data does not exist for the given space or region
    NotAvailable(String),
    /// Invalid parameters provided to a function
    BadParameters(String),
    /// The volume loader failed to provide an image
    VolumeLoadError(String),
    /// Internal error indicating a bug
    InternalError(String),
}

impl Display for AtlasDataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AtlasDataError::DeserializationError(msg) => {
                write!(f, "Failed to deserialize specification: {}", msg)
            }
            AtlasDataError::UnknownType {
                type_id,
                candidates,
            } => write!(
                f,
                "No builder available for type '{}'. Candidates were: {}",
                type_id,
                candidates.join(", ")
            ),
            AtlasDataError::NotFound { kind, spec } => {
                write!(f, "No {} matches '{}'", kind, spec)
            }
            AtlasDataError::Ambiguous {
                kind,
                spec,
                candidates,
            } => write!(
                f,
                "Spec '{}' is not unique among {}s. It matches: {}",
                spec,
                kind,
                candidates.join(", ")
            ),
            AtlasDataError::NotAvailable(msg) => write!(f, "Not available: {}", msg),
            AtlasDataError::BadParameters(msg) => write!(f, "Bad Parameters: {}", msg),
            AtlasDataError::VolumeLoadError(msg) => write!(f, "Failed to load volume: {}", msg),
            AtlasDataError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl Error for AtlasDataError {}

impl From<serde_json::Error> for AtlasDataError {
    fn from(err: serde_json::Error) -> Self {
        AtlasDataError::DeserializationError(err.to_string())
    }
}

/// Result type for data operations
pub type AtlasDataResult<T> = Result<T, AtlasDataError>;
