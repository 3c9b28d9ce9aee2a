//! Error types for the try-on pipeline.

/// Errors that can occur during intake, request building, or generation.
#[derive(Debug, thiserror::Error)]
pub enum TryOnError {
    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The generation service returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Content was blocked by the service's safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// A user-supplied file was rejected at intake.
    #[error("invalid image file: {0}")]
    InvalidInput(String),

    /// The request could not be assembled from the given inputs.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The service responded, but no inline image part was found.
    #[error("no image was produced")]
    NoImage,

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for try-on operations.
pub type Result<T> = std::result::Result<T, TryOnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TryOnError::Api {
            status: 503,
            message: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "API error: 503 - overloaded");

        let err = TryOnError::InvalidInput("text/plain is not an image".into());
        assert_eq!(
            err.to_string(),
            "invalid image file: text/plain is not an image"
        );

        assert_eq!(TryOnError::NoImage.to_string(), "no image was produced");
    }
}
