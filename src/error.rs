use thiserror::Error;

/// A color string that could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("malformed hex color `{0}`")]
    InvalidHex(String),
}

/// Raster allocation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("cannot allocate a {width}x{height} pixel buffer")]
    Allocation { width: u32, height: u32 },
    #[error("pixel data does not match a {width}x{height} buffer")]
    PixelData { width: u32, height: u32 },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

/// Saving or restoring the session state failed.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("corrupt settings record: {0}")]
    Settings(#[from] serde_json::Error),
    #[error("corrupt document image: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}
