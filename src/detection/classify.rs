//! Positional heuristics that name raw geometry.
//!
//! Knob naming is an ordered rule table evaluated first-match-wins, so the
//! rules are data and can be recalibrated per panel. Meter candidates are all
//! kept and ranked; picking one is left to the reader of the report.

use serde::{Deserialize, Serialize};

use crate::models::{BoundingBox, Circle, KnobName, Region};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    Large,
    Small,
}

/// Horizontal band of the image a knob center must fall into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Band {
    /// `x < fraction * width`
    LeftOf { fraction: f32 },
    /// `x > fraction * width`
    RightOf { fraction: f32 },
    /// `|x - width / 2| < tolerance_px`
    NearCenter { tolerance_px: f32 },
}

impl Band {
    pub fn contains(&self, x: f32, image_width: u32) -> bool {
        let w = image_width as f32;
        match *self {
            Band::LeftOf { fraction } => x < w * fraction,
            Band::RightOf { fraction } => x > w * fraction,
            Band::NearCenter { tolerance_px } => (x - w / 2.0).abs() < tolerance_px,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnobRule {
    pub name: KnobName,
    pub size: SizeClass,
    pub band: Band,
}

/// Ordered knob naming rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnobRules {
    /// Diameters strictly above this are `Large`.
    pub large_diameter: u32,
    pub rules: Vec<KnobRule>,
}

impl Default for KnobRules {
    fn default() -> Self {
        use KnobName::*;
        let rule = |name, size, band| KnobRule { name, size, band };
        Self {
            large_diameter: 120,
            rules: vec![
                rule(Threshold, SizeClass::Large, Band::LeftOf { fraction: 1.0 / 3.0 }),
                rule(Gain, SizeClass::Large, Band::RightOf { fraction: 2.0 / 3.0 }),
                rule(Ratio, SizeClass::Small, Band::NearCenter { tolerance_px: 50.0 }),
                rule(Attack, SizeClass::Small, Band::LeftOf { fraction: 0.5 }),
                rule(Release, SizeClass::Small, Band::RightOf { fraction: 0.5 }),
            ],
        }
    }
}

impl KnobRules {
    pub fn size_class(&self, diameter: u32) -> SizeClass {
        if diameter > self.large_diameter {
            SizeClass::Large
        } else {
            SizeClass::Small
        }
    }

    /// Name a knob from its geometry alone. `None` is "Unknown".
    pub fn classify(&self, x: u32, diameter: u32, image_width: u32) -> Option<KnobName> {
        let size = self.size_class(diameter);
        self.rules
            .iter()
            .find(|r| r.size == size && r.band.contains(x as f32, image_width))
            .map(|r| r.name)
    }

    pub fn classify_circle(&self, circle: &Circle, image_width: u32) -> Option<KnobName> {
        self.classify(circle.center_x, circle.diameter(), image_width)
    }
}

/// Size and position gate for the meter display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterRule {
    /// Binarization cutoff for the dark screen.
    pub cutoff: u8,
    pub min_width: u32,
    pub min_height: u32,
    /// Max distance of the box center from the image center line.
    pub center_tolerance: f32,
    /// Box top must lie in the upper half of the image.
    pub require_upper_half: bool,
}

impl Default for MeterRule {
    fn default() -> Self {
        Self::strict()
    }
}

impl MeterRule {
    pub fn strict() -> Self {
        Self {
            cutoff: 60,
            min_width: 100,
            min_height: 50,
            center_tolerance: 100.0,
            require_upper_half: true,
        }
    }

    pub fn lenient() -> Self {
        Self {
            cutoff: 50,
            min_width: 200,
            min_height: 100,
            center_tolerance: 50.0,
            require_upper_half: false,
        }
    }

    /// Horizontal distance from the image center, if the box qualifies.
    pub fn evaluate(&self, bbox: &BoundingBox, image_width: u32, image_height: u32) -> Option<f32> {
        if bbox.width <= self.min_width || bbox.height <= self.min_height {
            return None;
        }
        if self.require_upper_half && bbox.y as f32 >= image_height as f32 * 0.5 {
            return None;
        }
        let err = (bbox.center_x() - image_width as f32 / 2.0).abs();
        (err < self.center_tolerance).then_some(err)
    }
}

/// A box that passed the meter rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterCandidate {
    /// 1-based, best first.
    pub rank: usize,
    pub bbox: BoundingBox,
    pub center_error: f32,
}

/// Every qualifying box, ranked by center error then by area.
pub fn rank_meters(
    boxes: &[BoundingBox],
    rule: &MeterRule,
    image_width: u32,
    image_height: u32,
) -> Vec<MeterCandidate> {
    let mut hits: Vec<(BoundingBox, f32)> = boxes
        .iter()
        .filter_map(|b| rule.evaluate(b, image_width, image_height).map(|e| (*b, e)))
        .collect();
    hits.sort_by(|a, b| {
        a.1.total_cmp(&b.1)
            .then(b.0.area().cmp(&a.0.area()))
            .then((a.0.y, a.0.x).cmp(&(b.0.y, b.0.x)))
    });
    hits.into_iter()
        .enumerate()
        .map(|(i, (bbox, center_error))| MeterCandidate {
            rank: i + 1,
            bbox,
            center_error,
        })
        .collect()
}

/// Label search window relative to the knob it captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnobAnchor {
    pub dx_min: i32,
    pub dx_max: i32,
    /// Gap between the bottom of the knob rim and the window top.
    pub dy_from_rim: i32,
    pub height: u32,
}

impl KnobAnchor {
    /// Window under `knob`, clamped at the origin. May still extend past the
    /// right or bottom edge; callers clamp to the image.
    pub fn region_for(&self, knob: &Circle) -> Region {
        let cx = knob.center_x as i64;
        let top = knob.center_y as i64 + knob.radius as i64 + self.dy_from_rim as i64;
        let clamp = |v: i64| v.max(0) as u32;
        Region {
            x1: clamp(cx + self.dx_min as i64),
            x2: clamp(cx + self.dx_max as i64),
            y1: clamp(top),
            y2: clamp(top + self.height as i64),
        }
    }
}

/// Of several knobs sharing a name, the one nearest the calibrated region.
pub fn nearest_knob<'a>(candidates: &[&'a Circle], calibrated: &Region) -> Option<&'a Circle> {
    let (rx, ry) = calibrated.center();
    candidates.iter().copied().min_by(|a, b| {
        let da = (a.center_x as f32 - rx).powi(2) + (a.center_y as f32 - ry).powi(2);
        let db = (b.center_x as f32 - rx).powi(2) + (b.center_y as f32 - ry).powi(2);
        da.total_cmp(&db)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 1024;

    #[test]
    fn default_rules_name_each_knob() {
        let rules = KnobRules::default();
        assert_eq!(rules.classify(206, 166, W), Some(KnobName::Threshold));
        assert_eq!(rules.classify(818, 166, W), Some(KnobName::Gain));
        assert_eq!(rules.classify(512, 64, W), Some(KnobName::Ratio));
        assert_eq!(rules.classify(410, 66, W), Some(KnobName::Attack));
        assert_eq!(rules.classify(614, 66, W), Some(KnobName::Release));
    }

    #[test]
    fn large_knob_in_middle_third_is_unknown() {
        let rules = KnobRules::default();
        assert_eq!(rules.classify(512, 166, W), None);
    }

    #[test]
    fn size_cutoff_is_exclusive() {
        let rules = KnobRules::default();
        assert_eq!(rules.size_class(120), SizeClass::Small);
        assert_eq!(rules.size_class(121), SizeClass::Large);
    }

    #[test]
    fn classification_is_repeatable() {
        let rules = KnobRules::default();
        for x in (0..W).step_by(37) {
            for d in [40, 120, 122, 300] {
                assert_eq!(rules.classify(x, d, W), rules.classify(x, d, W));
            }
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = KnobRules {
            large_diameter: 120,
            rules: vec![
                KnobRule {
                    name: KnobName::Ratio,
                    size: SizeClass::Small,
                    band: Band::LeftOf { fraction: 1.0 },
                },
                KnobRule {
                    name: KnobName::Attack,
                    size: SizeClass::Small,
                    band: Band::LeftOf { fraction: 1.0 },
                },
            ],
        };
        assert_eq!(rules.classify(10, 40, W), Some(KnobName::Ratio));
    }

    #[test]
    fn overlapping_meter_boxes_are_all_kept() {
        let a = BoundingBox { x: 400, y: 100, width: 220, height: 120 };
        let b = BoundingBox { x: 420, y: 110, width: 160, height: 80 };
        let off_center = BoundingBox { x: 20, y: 100, width: 220, height: 120 };

        let ranked = rank_meters(&[b, off_center, a], &MeterRule::strict(), 1000, 700);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
        // a is 10px off center, b is exactly centered
        assert_eq!(ranked[0].bbox, b);
        assert_eq!(ranked[1].bbox, a);
    }

    #[test]
    fn strict_rule_rejects_lower_half() {
        let low = BoundingBox { x: 400, y: 400, width: 200, height: 100 };
        assert!(MeterRule::strict().evaluate(&low, 1000, 700).is_none());
        assert!(MeterRule::lenient().evaluate(&low, 1000, 700).is_none());

        let big_low = BoundingBox { x: 350, y: 400, width: 300, height: 150 };
        assert!(MeterRule::strict().evaluate(&big_low, 1000, 700).is_none());
        assert_eq!(MeterRule::lenient().evaluate(&big_low, 1000, 700), Some(0.0));
    }

    #[test]
    fn anchor_region_sits_under_the_knob() {
        let knob = Circle { center_x: 206, center_y: 436, radius: 83 };
        let anchor = KnobAnchor { dx_min: -56, dx_max: 54, dy_from_rim: 1, height: 80 };
        assert_eq!(anchor.region_for(&knob), Region::new(150, 260, 520, 600));
    }

    #[test]
    fn anchor_region_clamps_at_origin() {
        let knob = Circle { center_x: 10, center_y: 10, radius: 5 };
        let anchor = KnobAnchor { dx_min: -30, dx_max: 30, dy_from_rim: -40, height: 50 };
        let r = anchor.region_for(&knob);
        assert_eq!((r.x1, r.y1), (0, 0));
        assert_eq!((r.x2, r.y2), (40, 25));
    }
}
