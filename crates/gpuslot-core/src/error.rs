//! Error types for gpuslot

use crate::gpu::ResourceId;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Main error type for gpuslot
#[derive(Error, Debug)]
pub enum SlotError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// Unknown resource id
    #[error("Resource not found: {0}")]
    ResourceNotFound(ResourceId),

    /// Unknown or already cancelled reservation id
    #[error("Reservation not found: {0}")]
    ReservationNotFound(Uuid),

    /// Identifier that cannot name any resource or reservation
    #[error("{0}")]
    NotFound(String),

    /// Requested interval overlaps an active reservation
    #[error("Resource already reserved for that interval: resource {resource_id}, [{start}, {end})")]
    Conflict {
        resource_id: ResourceId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SlotError {
    /// Error kind as reported across the API boundary
    pub fn kind(&self) -> &'static str {
        match self {
            SlotError::Validation(_) => "ValidationError",
            SlotError::ResourceNotFound(_)
            | SlotError::ReservationNotFound(_)
            | SlotError::NotFound(_) => "NotFound",
            SlotError::Conflict { .. } => "ConflictError",
            SlotError::Config(_) | SlotError::Io(_) | SlotError::Internal(_) => "InternalError",
        }
    }
}

/// Result type for gpuslot operations
pub type SlotResult<T> = Result<T, SlotError>;

impl From<toml::de::Error> for SlotError {
    fn from(err: toml::de::Error) -> Self {
        SlotError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SlotError::Config("invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: invalid config");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SlotError = io_err.into();
        assert!(matches!(err, SlotError::Io(_)));
        assert_eq!(err.kind(), "InternalError");
    }

    #[test]
    fn test_error_from_toml() {
        let err: SlotError = toml::from_str::<toml::Value>("port = ").unwrap_err().into();
        assert!(matches!(err, SlotError::Config(_)));
        assert!(err.to_string().starts_with("Configuration error: "));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            SlotError::Validation("bad".to_string()).kind(),
            "ValidationError"
        );
        assert_eq!(SlotError::ResourceNotFound(3).kind(), "NotFound");
        assert_eq!(SlotError::ReservationNotFound(Uuid::nil()).kind(), "NotFound");
        assert_eq!(SlotError::NotFound("abc".to_string()).kind(), "NotFound");

        let now = Utc::now();
        let conflict = SlotError::Conflict {
            resource_id: 1,
            start: now,
            end: now,
        };
        assert_eq!(conflict.kind(), "ConflictError");
        assert!(conflict
            .to_string()
            .starts_with("Resource already reserved for that interval"));
    }
}
