use std::path::PathBuf;

/// Errors surfaced by the image generation pipeline.
///
/// All variants are fatal for the run that produced them; nothing in the
/// rasterization core recovers from an error by substituting defaults.
#[derive(Debug)]
pub enum ImageGenError {
    /// Invalid run parameters (non-positive sizes, empty worker blocks, ...).
    Configuration(String),
    /// A rotation was requested with a quaternion that is not unit length.
    NonUnitQuaternion { norm: f64 },
    /// Writing the artifact for image `index` failed.
    Io {
        index: usize,
        path: PathBuf,
        source: std::io::Error,
    },
    /// An input document could not be read or decoded.
    Parse { path: PathBuf, message: String },
}

impl ImageGenError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        ImageGenError::Configuration(msg.into())
    }
}

impl std::fmt::Display for ImageGenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageGenError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            ImageGenError::NonUnitQuaternion { norm } => {
                write!(f, "rotation requires a unit quaternion (|q| = {norm:.9})")
            }
            ImageGenError::Io {
                index,
                path,
                source,
            } => write!(
                f,
                "failed to write image {index} to {}: {source}",
                path.display()
            ),
            ImageGenError::Parse { path, message } => {
                write!(f, "failed to parse {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for ImageGenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImageGenError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ImageGenError>;
