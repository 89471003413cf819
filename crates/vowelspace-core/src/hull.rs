//! Vowel-space polygons.
//!
//! The vowel space of a group is the convex hull of its per-vowel mean
//! (F2, F1) points. Plots draw the hull; its area is a coarse dispersion
//! measure that complements the token-level distances.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::types::{Condition, DerivedToken, Gender};

/// A point in the F2 × F1 plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormantPoint {
    /// Second formant (horizontal axis).
    pub f2: f64,
    /// First formant (vertical axis).
    pub f1: f64,
}

fn cross(o: FormantPoint, a: FormantPoint, b: FormantPoint) -> f64 {
    (a.f2 - o.f2) * (b.f1 - o.f1) - (a.f1 - o.f1) * (b.f2 - o.f2)
}

/// Convex hull by Andrew's monotone chain.
///
/// Returns the hull vertices counter-clockwise, starting from the point with
/// the smallest F2 (ties broken by F1), without repeating the first vertex.
/// Collinear boundary points are dropped. Inputs with fewer than three
/// distinct points are returned deduplicated and sorted.
pub fn convex_hull(points: &[FormantPoint]) -> Vec<FormantPoint> {
    let mut pts: Vec<FormantPoint> = points
        .iter()
        .copied()
        .filter(|p| p.f1.is_finite() && p.f2.is_finite())
        .collect();
    pts.sort_by(|a, b| a.f2.total_cmp(&b.f2).then(a.f1.total_cmp(&b.f1)));
    pts.dedup();

    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<FormantPoint> = Vec::with_capacity(2 * pts.len());

    // Lower chain
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }

    // Upper chain
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }

    hull.pop();
    hull
}

/// Polygon area by the shoelace formula (Hz²).
pub fn polygon_area(vertices: &[FormantPoint]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let twice: f64 = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| a.f2 * b.f1 - b.f2 * a.f1)
        .sum();
    crate::math::abs(twice) / 2.0
}

/// Mean (F2, F1) of one vowel within one condition × gender cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VowelMean {
    /// Speech register.
    pub condition: Condition,
    /// Speaker gender.
    pub gender: Gender,
    /// Vowel category.
    pub vowel: String,
    /// Number of tokens averaged.
    pub n: usize,
    /// Mean position.
    pub point: FormantPoint,
}

/// Vowel-space hull of one condition × gender cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VowelSpace {
    /// Speech register.
    pub condition: Condition,
    /// Speaker gender.
    pub gender: Gender,
    /// Hull vertices, counter-clockwise.
    pub hull: Vec<FormantPoint>,
    /// Hull area in Hz².
    pub area: f64,
}

/// Per-vowel means for every condition × gender cell, sorted by cell then vowel.
pub fn vowel_means(tokens: &[DerivedToken]) -> Vec<VowelMean> {
    let mut cells: BTreeMap<(Condition, Gender, &str), (f64, f64, usize)> = BTreeMap::new();
    for t in tokens {
        let key = (t.token.condition, t.token.gender, t.token.vowel.as_str());
        let e = cells.entry(key).or_insert((0.0, 0.0, 0));
        e.0 += t.token.f2_hz;
        e.1 += t.token.f1_hz;
        e.2 += 1;
    }

    cells
        .into_iter()
        .map(|((condition, gender, vowel), (f2, f1, n))| VowelMean {
            condition,
            gender,
            vowel: vowel.to_string(),
            n,
            point: FormantPoint {
                f2: f2 / n as f64,
                f1: f1 / n as f64,
            },
        })
        .collect()
}

/// Hull and area of the vowel means in each condition × gender cell.
pub fn vowel_spaces(means: &[VowelMean]) -> Vec<VowelSpace> {
    let mut cells: BTreeMap<(Condition, Gender), Vec<FormantPoint>> = BTreeMap::new();
    for m in means {
        cells.entry((m.condition, m.gender)).or_default().push(m.point);
    }

    cells
        .into_iter()
        .map(|((condition, gender), points)| {
            let hull = convex_hull(&points);
            let area = polygon_area(&hull);
            VowelSpace {
                condition,
                gender,
                hull,
                area,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn p(f2: f64, f1: f64) -> FormantPoint {
        FormantPoint { f2, f1 }
    }

    #[test]
    fn test_square_with_interior_point() {
        let pts = vec![
            p(0.0, 0.0),
            p(10.0, 0.0),
            p(10.0, 10.0),
            p(0.0, 10.0),
            p(5.0, 5.0),
        ];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&p(5.0, 5.0)));
        assert_eq!(polygon_area(&hull), 100.0);
    }

    #[test]
    fn test_collinear_points_dropped() {
        let pts = vec![p(0.0, 0.0), p(5.0, 0.0), p(10.0, 0.0), p(5.0, 8.0)];
        let hull = convex_hull(&pts);
        assert_eq!(hull, vec![p(0.0, 0.0), p(10.0, 0.0), p(5.0, 8.0)]);
        assert_eq!(polygon_area(&hull), 40.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(convex_hull(&[]).is_empty());
        let two = convex_hull(&[p(1.0, 1.0), p(1.0, 1.0), p(0.0, 2.0)]);
        assert_eq!(two, vec![p(0.0, 2.0), p(1.0, 1.0)]);
        assert_eq!(polygon_area(&two), 0.0);
    }

    #[test]
    fn test_triangle_vowel_space() {
        // Corner vowels /i a u/ in a typical F2 × F1 layout.
        let pts = vec![p(2300.0, 300.0), p(1300.0, 750.0), p(800.0, 320.0)];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 3);
        let twice: f64 =
            (2300.0 * (750.0 - 320.0)) + (1300.0 * (320.0 - 300.0)) + (800.0 * (300.0 - 750.0));
        let expected = 0.5 * twice.abs();
        assert!((polygon_area(&hull) - expected).abs() < 1e-6);
    }
}
