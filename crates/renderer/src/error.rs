use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid raster dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("Invalid color '{0}' (expected #rrggbb, #rrggbbaa or a basic color name)")]
    InvalidColor(String),
}

impl From<RenderError> for wmts_common::WmtsError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Decode(msg) => wmts_common::WmtsError::DecodeError(msg),
            other => wmts_common::WmtsError::InternalError(other.to_string()),
        }
    }
}
