use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::detection::classify::MeterCandidate;
use crate::models::{BoundingBox, Circle, DetectedFeature, FeatureKind, Geometry, KnobName, Region};

/// A knob candidate and the name the rule table gave it (`None` = Unknown).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnobDetection {
    pub circle: Circle,
    pub name: Option<KnobName>,
}

impl KnobDetection {
    pub fn display_name(&self) -> &'static str {
        self.name.map_or("Unknown", |n| n.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSource {
    Calibrated,
    Knob,
}

/// Outcome of one label search. `bbox` is `None` when nothing was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelDetection {
    pub name: KnobName,
    pub region: Region,
    pub source: RegionSource,
    pub bbox: Option<BoundingBox>,
}

/// Everything found on one panel image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelReport {
    pub image_width: u32,
    pub image_height: u32,
    /// Sorted left to right.
    pub knobs: Vec<KnobDetection>,
    pub labels: Vec<LabelDetection>,
    /// Best candidate first.
    pub meters: Vec<MeterCandidate>,
}

impl PanelReport {
    pub fn unknown_knobs(&self) -> impl Iterator<Item = &KnobDetection> {
        self.knobs.iter().filter(|k| k.name.is_none())
    }

    /// Knob names no candidate was classified as.
    pub fn missing_knobs(&self) -> Vec<KnobName> {
        KnobName::ALL
            .into_iter()
            .filter(|n| !self.knobs.iter().any(|k| k.name == Some(*n)))
            .collect()
    }

    /// Named features only: unknown knobs and missing labels are left out.
    pub fn features(&self) -> Vec<DetectedFeature> {
        let knobs = self.knobs.iter().filter_map(|k| {
            k.name.map(|n| DetectedFeature {
                name: n.to_string(),
                kind: FeatureKind::Knob,
                geometry: Geometry::Circle(k.circle),
            })
        });
        let labels = self.labels.iter().filter_map(|l| {
            l.bbox.map(|b| DetectedFeature {
                name: l.name.to_string(),
                kind: FeatureKind::Label,
                geometry: Geometry::BoundingBox(b),
            })
        });
        let meters = self.meters.iter().map(|m| DetectedFeature {
            name: "Meter".to_string(),
            kind: FeatureKind::Meter,
            geometry: Geometry::BoundingBox(m.bbox),
        });
        knobs.chain(labels).chain(meters).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable console report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "IMAGE_RES: {} x {}", self.image_width, self.image_height)?;

        writeln!(out, "\n--- DETECTED KNOB CANDIDATES ---")?;
        for k in &self.knobs {
            let c = &k.circle;
            writeln!(
                out,
                "Knob ({}): Center=({}, {}), Diameter={}, Radius={}",
                k.display_name(),
                c.center_x,
                c.center_y,
                c.diameter(),
                c.radius
            )?;
        }
        for name in self.missing_knobs() {
            writeln!(out, "Knob ({name}): not found")?;
        }

        writeln!(out, "\n--- DETECTED LABELS ---")?;
        for l in &self.labels {
            match l.bbox {
                Some(b) => writeln!(
                    out,
                    "Label ({}): x={}, y={}, w={}, h={}, center_x={}",
                    l.name,
                    b.x,
                    b.y,
                    b.width,
                    b.height,
                    b.center_x()
                )?,
                None => writeln!(out, "Label ({}): not found in {}", l.name, l.region)?,
            }
        }

        writeln!(out, "\n--- METER CANDIDATES ---")?;
        for m in &self.meters {
            let b = &m.bbox;
            writeln!(
                out,
                "Meter #{}: x={}, y={}, w={}, h={}, center_error={:.1}",
                m.rank, b.x, b.y, b.width, b.height, m.center_error
            )?;
        }
        if self.meters.is_empty() {
            writeln!(out, "Meter: not found")?;
        }
        Ok(())
    }
}
