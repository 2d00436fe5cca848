//! Gradient circular Hough transform.
//!
//! Edge pixels vote along their gradient direction at every distance in the
//! radius range. Knob rims produce accumulator peaks at their centers because
//! the gradient of a circle boundary points radially. Each accepted center
//! then gets a radius from the edge pixels around it, and is kept only if
//! those pixels surround it. Straight edges meeting at a corner vote into the
//! same cells but never close a ring.

use image::GrayImage;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::Circle;

/// Parameters of the Hough transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughConfig {
    /// Inverse accumulator resolution (1 = one cell per pixel).
    pub dp: f32,
    /// Minimum distance between accepted centers (pixels).
    pub min_dist: f32,
    /// Upper Canny threshold; the lower one is half of it.
    pub param1: f32,
    /// Minimum accumulator votes for a center.
    pub param2: u32,
    pub min_radius: u32,
    pub max_radius: u32,
    /// Fraction of the rim, by angle, that edge pixels must cover.
    pub min_coverage: f32,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            dp: 1.0,
            min_dist: 80.0,
            param1: 50.0,
            param2: 30,
            min_radius: 20,
            max_radius: 200,
            min_coverage: 0.5,
        }
    }
}

/// Post-detection policy for knob candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnobFilter {
    /// Centers above this fraction of the image height are dropped (screws).
    pub top_exclusion_fraction: f32,
    /// Candidates with a larger radius are dropped (background curves).
    pub max_plausible_radius: u32,
}

impl Default for KnobFilter {
    fn default() -> Self {
        Self {
            top_exclusion_fraction: 0.3,
            max_plausible_radius: 100,
        }
    }
}

struct EdgePoint {
    x: u32,
    y: u32,
    // unit gradient
    ux: f32,
    uy: f32,
}

fn collect_edge_points(gray: &GrayImage, config: &HoughConfig) -> Vec<EdgePoint> {
    let edges = canny(gray, (config.param1 / 2.0).max(1.0), config.param1);
    // Directions from a lightly smoothed copy; raw Sobel on a staircase rim
    // is off by several degrees.
    let smooth = gaussian_blur_f32(gray, 1.0);
    let gx = horizontal_sobel(&smooth);
    let gy = vertical_sobel(&smooth);

    let mut points = Vec::new();
    for (x, y, px) in edges.enumerate_pixels() {
        if px[0] == 0 {
            continue;
        }
        let vx = gx.get_pixel(x, y)[0] as f32;
        let vy = gy.get_pixel(x, y)[0] as f32;
        let mag = (vx * vx + vy * vy).sqrt();
        if mag < 1e-6 {
            continue;
        }
        points.push(EdgePoint {
            x,
            y,
            ux: vx / mag,
            uy: vy / mag,
        });
    }
    points
}

const SECTORS: usize = 36;

/// Pick the radius whose ring around the center is best covered by edges.
///
/// Each radius bin (with its two neighbours) is scored by how many of the
/// angular sectors around the center contain a supporting edge point, ties
/// broken by edge count. Returns `(radius, sectors)` for the best bin.
fn estimate_radius(
    cx: f32,
    cy: f32,
    points: &[EdgePoint],
    config: &HoughConfig,
) -> Option<(u32, usize)> {
    let (min_r, max_r) = (config.min_radius, config.max_radius);
    let bins = (max_r - min_r + 1) as usize;
    let mut hist = vec![0u32; bins];
    let mut sectors = vec![0u64; bins];

    for p in points {
        let dx = p.x as f32 - cx;
        let dy = p.y as f32 - cy;
        let d = (dx * dx + dy * dy).sqrt().round();
        if d < min_r as f32 || d > max_r as f32 {
            continue;
        }
        let bin = (d as u32 - min_r) as usize;
        let angle = dy.atan2(dx) + std::f32::consts::PI;
        let sector = ((angle / std::f32::consts::TAU * SECTORS as f32) as usize).min(SECTORS - 1);
        hist[bin] += 1;
        sectors[bin] |= 1u64 << sector;
    }

    let mut best: Option<(u32, usize, u32)> = None;
    for i in 0..bins {
        let lo = i.saturating_sub(1);
        let hi = (i + 1).min(bins - 1);
        let support: u32 = hist[lo..=hi].iter().sum();
        if support == 0 {
            continue;
        }
        let covered = sectors[lo..=hi].iter().fold(0u64, |acc, m| acc | m).count_ones() as usize;
        let better = best.is_none_or(|(_, c, s)| (covered, support) > (c, s));
        if better {
            best = Some((min_r + i as u32, covered, support));
        }
    }
    best.map(|(r, covered, _)| (r, covered))
}

/// Run the circle Hough transform over a smoothed intensity image.
///
/// Candidates are returned strongest first. Every returned radius lies in
/// `[min_radius, max_radius]`; an image without edges yields an empty vector.
pub fn detect_circles(gray: &GrayImage, config: &HoughConfig) -> Vec<Circle> {
    let (w, h) = gray.dimensions();
    if w < 3 || h < 3 || config.min_radius > config.max_radius {
        return Vec::new();
    }

    let points = collect_edge_points(gray, config);
    debug!("Hough: {} edge points", points.len());
    if points.is_empty() {
        return Vec::new();
    }

    let dp = config.dp.max(1.0);
    let aw = (w as f32 / dp).ceil() as usize + 1;
    let ah = (h as f32 / dp).ceil() as usize + 1;
    let mut accum = vec![0u32; aw * ah];

    for p in &points {
        for sign in [1.0f32, -1.0] {
            // One vote per cell per direction
            let mut last = usize::MAX;
            for r in config.min_radius..=config.max_radius {
                let vx = (p.x as f32 + sign * p.ux * r as f32) / dp;
                let vy = (p.y as f32 + sign * p.uy * r as f32) / dp;
                let (ax, ay) = (vx.round(), vy.round());
                if ax < 0.0 || ay < 0.0 || ax >= aw as f32 || ay >= ah as f32 {
                    break;
                }
                let idx = ay as usize * aw + ax as usize;
                if idx != last {
                    accum[idx] += 1;
                    last = idx;
                }
            }
        }
    }

    // Local maxima above the vote threshold
    let mut centers = Vec::new();
    for ay in 1..ah.saturating_sub(1) {
        for ax in 1..aw.saturating_sub(1) {
            let idx = ay * aw + ax;
            let v = accum[idx];
            if v <= config.param2 {
                continue;
            }
            let peak = v > accum[idx - 1]
                && v >= accum[idx + 1]
                && v > accum[idx - aw]
                && v >= accum[idx + aw];
            if peak {
                centers.push((ax, ay, v));
            }
        }
    }
    centers.sort_by(|a, b| b.2.cmp(&a.2).then(a.1.cmp(&b.1)).then(a.0.cmp(&b.0)));
    debug!("Hough: {} accumulator peaks", centers.len());

    let min_dist_sq = config.min_dist * config.min_dist;
    let min_sectors = (config.min_coverage * SECTORS as f32).ceil() as usize;
    let mut accepted: Vec<(f32, f32)> = Vec::new();
    let mut circles = Vec::new();

    for (ax, ay, votes) in centers {
        let cx = ax as f32 * dp;
        let cy = ay as f32 * dp;
        let too_close = accepted.iter().any(|&(px, py)| {
            let dx = px - cx;
            let dy = py - cy;
            dx * dx + dy * dy < min_dist_sq
        });
        if too_close {
            continue;
        }
        let Some((radius, covered)) = estimate_radius(cx, cy, &points, config) else {
            continue;
        };
        if covered < min_sectors {
            debug!(
                "Hough: drop ({cx}, {cy}), {votes} votes, {covered}/{SECTORS} sectors"
            );
            continue;
        }
        accepted.push((cx, cy));
        circles.push(Circle {
            center_x: (cx.round() as u32).min(w - 1),
            center_y: (cy.round() as u32).min(h - 1),
            radius,
        });
    }

    circles
}

/// Detect knob candidates: raw circles filtered by the knob policy and
/// sorted left to right.
pub fn find_knob_candidates(
    gray: &GrayImage,
    hough: &HoughConfig,
    filter: &KnobFilter,
) -> Vec<Circle> {
    let top_limit = gray.height() as f32 * filter.top_exclusion_fraction;

    let raw = detect_circles(gray, hough);
    let mut knobs: Vec<Circle> = raw
        .iter()
        .filter(|c| (c.center_y as f32) >= top_limit)
        .filter(|c| c.radius <= filter.max_plausible_radius)
        .copied()
        .collect();
    knobs.sort_by_key(|c| (c.center_x, c.center_y));

    debug!(
        "Knob candidates: {} of {} raw circles survive filtering",
        knobs.len(),
        raw.len()
    );
    knobs
}
