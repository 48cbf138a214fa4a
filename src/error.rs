// Every variant states *where* things went wrong.
// The per-frame core never produces these; they only come out of setup
// (window, camera, font file, config file).
use std::path::PathBuf;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Creating the window failed.
    #[error("window init error: {0}")]
    WindowInit(String),
    /// Pushing a frame to the window failed.
    #[error("window update error: {0}")]
    WindowUpdate(String),
    /// Opening/starting the camera failed.
    #[error("camera init error: {0}")]
    CameraInit(String),
    /// Grabbing/decoding a frame failed.
    #[error("camera frame error: {0}")]
    CameraFrame(String),
    /// A font file exists but could not be used.
    #[error("font error ({path}): {reason}")]
    Font { path: PathBuf, reason: String },
    /// The config file is not valid JSON for `AppConfig`.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}
