pub mod debug;
pub mod detection;
pub mod error;
pub mod layout;
pub mod models;
pub mod report;

pub use detection::PanelDetector;
pub use detection::preprocessing::load_image;
pub use error::PanelError;
pub use layout::{LabelStrategy, PanelLayout};
pub use models::{BoundingBox, Circle, DetectedFeature, FeatureKind, Geometry, KnobName, Region};
pub use report::{KnobDetection, LabelDetection, PanelReport, RegionSource};
