//! Spatial interference between mining structures.
//!
//! Each mining structure extracts from a sphere of radius `range` around
//! it. Two structures whose spheres overlap share the overlapping volume,
//! so together they should mine at a rate proportional to the volume of
//! the union. Only pairwise overlap is modelled; with three or more
//! structures the product of pairwise modifiers over-penalises clusters.

/// Maximum normalised separation at which two structures still interact.
pub const MAX_INTERACTION_RATIO: f32 = 2.0;

/// Efficiency multiplier for one structure when another sits `distance` away.
///
/// Returns a value in `[0.5, 1.0]`: `0.5` for coincident structures, `1.0`
/// at `2 * range` and beyond. A non-positive `range` disables interference.
#[must_use]
pub fn interference_modifier(distance: f32, range: f32) -> f32 {
    if range <= 0.0 || range.is_nan() {
        return 1.0;
    }

    let dr = if distance.is_nan() {
        0.0
    } else {
        (distance / range).clamp(0.0, MAX_INTERACTION_RATIO)
    };

    // q is the fraction of one sphere's volume that lies inside the other
    let q = (dr * dr * dr - 12.0 * dr + 16.0) / 16.0;

    (1.0 - q) + 0.5 * q
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE: f32 = 1000.0;

    #[test]
    fn test_coincident_structures_split_evenly() {
        assert!((interference_modifier(0.0, RANGE) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_no_interference_at_twice_range() {
        assert!((interference_modifier(2.0 * RANGE, RANGE) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_beyond_range_is_clamped() {
        assert!((interference_modifier(10.0 * RANGE, RANGE) - 1.0).abs() < f32::EPSILON);
        assert!((interference_modifier(-5.0, RANGE) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_disabled_range() {
        assert!((interference_modifier(0.0, 0.0) - 1.0).abs() < f32::EPSILON);
        assert!((interference_modifier(50.0, -1.0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_half_range_value() {
        // dr = 0.5: q = (0.125 - 6 + 16) / 16 = 0.6328125
        let expected = 1.0 - 0.5 * 0.632_812_5;
        assert!((interference_modifier(500.0, RANGE) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_monotonic_over_interaction_range() {
        let mut previous = interference_modifier(0.0, RANGE);
        for step in 1..=200 {
            let d = step as f32 * 10.0;
            let m = interference_modifier(d, RANGE);
            assert!(m >= previous, "modifier decreased at d={d}: {previous} -> {m}");
            assert!((0.5..=1.0).contains(&m));
            previous = m;
        }
    }

    #[test]
    fn test_nan_distance_treated_as_coincident() {
        assert!((interference_modifier(f32::NAN, RANGE) - 0.5).abs() < f32::EPSILON);
    }
}
