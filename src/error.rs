use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    /// The reconciler has shut down and no longer accepts events
    #[error("overlay pipeline is shut down")]
    Disconnected,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
