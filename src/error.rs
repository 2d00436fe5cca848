use std::path::PathBuf;

/// Errors returned by the panel analysis.
///
/// Finding nothing is not an error: empty detections come back as empty
/// vectors or `None` inside the report.
#[derive(thiserror::Error, Debug)]
pub enum PanelError {
    #[error("failed to load image {}: {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to read layout {}: {source}", path.display())]
    LayoutRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse layout {}: {source}", path.display())]
    LayoutParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid layout: {0}")]
    InvalidLayout(String),
    #[error("debug directory is not empty: {}", .0.display())]
    DebugDirNotEmpty(PathBuf),
    #[error("failed to save debug image {}: {source}", path.display())]
    DebugImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PanelError>;
