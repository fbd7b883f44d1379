//! Error types for the WMTS map viewer.

use thiserror::Error;

/// Result type alias using WmtsError.
pub type WmtsResult<T> = Result<T, WmtsError>;

/// Primary error type for WMTS client operations.
#[derive(Debug, Error)]
pub enum WmtsError {
    // === Request Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid BBOX: {0}")]
    InvalidBbox(String),

    // === Capabilities Errors ===
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("TileMatrixSet not found: {0}")]
    TileMatrixSetNotFound(String),

    #[error("TileMatrix not found: {0}")]
    TileMatrixNotFound(String),

    #[error("Invalid CRS: {0}")]
    InvalidCrs(String),

    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Malformed capabilities document: {0}")]
    XmlError(String),

    #[error("Service exception [{code}]: {text}")]
    ServiceException { code: String, text: String },

    // === Transport Errors ===
    /// Connection-level failure; worth retrying
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// A request that cannot succeed as sent (bad URL, redirect loop, ...)
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Unexpected HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Request timeout")]
    Timeout,

    // === Data Errors ===
    #[error("Failed to decode data: {0}")]
    DecodeError(String),

    #[error("Projection error: {0}")]
    ProjectionError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl WmtsError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            WmtsError::Timeout | WmtsError::HttpError(_) => true,
            WmtsError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<std::io::Error> for WmtsError {
    fn from(err: std::io::Error) -> Self {
        WmtsError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for WmtsError {
    fn from(err: serde_json::Error) -> Self {
        WmtsError::DecodeError(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(WmtsError::Timeout.is_transient());
        assert!(WmtsError::HttpStatus {
            status: 503,
            url: "http://example.com".to_string()
        }
        .is_transient());
        assert!(!WmtsError::HttpStatus {
            status: 404,
            url: "http://example.com".to_string()
        }
        .is_transient());
        assert!(!WmtsError::LayerNotFound("x".to_string()).is_transient());
        assert!(WmtsError::HttpError("connection refused".to_string()).is_transient());
        assert!(!WmtsError::RequestFailed("relative URL without a base".to_string()).is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = WmtsError::LayerNotFound("MODIS_Terra".to_string());
        assert_eq!(err.to_string(), "Layer not found: MODIS_Terra");
    }
}
