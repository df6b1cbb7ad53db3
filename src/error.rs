use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("GIF encode error: {0}")]
    GifEncode(#[from] gif::EncodingError),
    #[error("GIF decode error: {0}")]
    GifDecode(#[from] gif::DecodingError),
    #[error("PNG encode error: {0}")]
    PngEncode(#[from] png::EncodingError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("canvas side {0} is out of range (1..={max})", max = crate::document::MAX_SIDE)]
    InvalidSide(u32),
    #[error("invalid color: {0:?}")]
    InvalidColor(String),
    #[error("invalid palette: {0}")]
    InvalidPalette(String),
    #[error("invalid project: {0}")]
    InvalidProject(String),
    #[error("unsupported file extension: {0:?}")]
    UnsupportedFormat(String),
    #[error("frame {index} out of range ({count} frames)")]
    FrameOutOfRange { index: usize, count: usize },
    #[error("{0}")]
    Empty(&'static str),
}

pub type Result<T> = std::result::Result<T, EditorError>;
