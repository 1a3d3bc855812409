//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale `source` down so neither edge exceeds `max_size`, keeping aspect ratio.
///
/// The longer edge lands exactly on `max_size`; the shorter edge is truncated
/// and never drops below 1px. Images already within bounds, and `max_size == 0`
/// (resizing disabled), are returned unchanged.
///
/// # Examples
/// ```
/// # use pose_manifest::imaging::calculate_bounded_dimensions;
/// // 4000x3000 landscape bounded to 1200 → 1200x900
/// assert_eq!(calculate_bounded_dimensions((4000, 3000), 1200), (1200, 900));
///
/// // Already small enough → unchanged
/// assert_eq!(calculate_bounded_dimensions((800, 600), 1200), (800, 600));
/// ```
pub fn calculate_bounded_dimensions(source: (u32, u32), max_size: u32) -> (u32, u32) {
    let (w, h) = source;
    if max_size == 0 || (w <= max_size && h <= max_size) {
        return source;
    }

    // Integer math keeps the long edge exact (no 1199.999 → 1199).
    let scale = |edge: u32, long: u32| -> u32 {
        ((edge as u64 * max_size as u64) / long as u64).max(1) as u32
    };

    if w >= h {
        (max_size, scale(h, w))
    } else {
        (scale(w, h), max_size)
    }
}

/// Whether a recompress at `target` also needs resampling.
pub fn needs_resize(source: (u32, u32), target: (u32, u32)) -> bool {
    source != target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_bounded_by_width() {
        assert_eq!(calculate_bounded_dimensions((4000, 3000), 1200), (1200, 900));
    }

    #[test]
    fn portrait_bounded_by_height() {
        assert_eq!(calculate_bounded_dimensions((3000, 4000), 1200), (900, 1200));
    }

    #[test]
    fn square_bounded() {
        assert_eq!(calculate_bounded_dimensions((2000, 2000), 1200), (1200, 1200));
    }

    #[test]
    fn one_edge_over_limit() {
        assert_eq!(calculate_bounded_dimensions((1300, 500), 1200), (1200, 461));
    }

    #[test]
    fn within_bounds_unchanged() {
        assert_eq!(calculate_bounded_dimensions((1200, 800), 1200), (1200, 800));
        assert_eq!(calculate_bounded_dimensions((10, 10), 1200), (10, 10));
    }

    #[test]
    fn zero_max_disables_resize() {
        assert_eq!(calculate_bounded_dimensions((8000, 6000), 0), (8000, 6000));
    }

    #[test]
    fn extreme_aspect_never_reaches_zero() {
        assert_eq!(calculate_bounded_dimensions((10000, 5), 1200), (1200, 1));
        assert_eq!(calculate_bounded_dimensions((5, 10000), 1200), (1, 1200));
    }

    #[test]
    fn long_edge_is_exact_for_awkward_ratios() {
        for w in [1201, 2999, 3001, 4095, 7777] {
            let (out_w, _) = calculate_bounded_dimensions((w, 1000), 1200);
            assert_eq!(out_w, 1200, "width {w}");
        }
    }

    #[test]
    fn needs_resize_compares_dimensions() {
        assert!(needs_resize((4000, 3000), (1200, 900)));
        assert!(!needs_resize((800, 600), (800, 600)));
    }
}
