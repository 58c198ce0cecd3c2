//! Spatial grid indexing: snap a (lat, lon) point to the south-west corner of
//! its fixed-size cell and derive a canonical `"lat_lon"` identifier.
//! All coordinate math uses f64.

use serde::{Deserialize, Serialize};

/// Default cell edge in degrees.
pub const DEFAULT_CELL_SIZE: f64 = 0.1;

/// Tolerance applied in cell-index space before flooring. Without it a cell
/// corner such as 36.6 divides to 365.99999… and would index into its
/// southern neighbour, breaking idempotence.
const SNAP_EPS: f64 = 1e-9;

/// A grid cell keyed by its south-west corner, rounded to 3 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub cell_lat: f64,
    pub cell_lon: f64,
    pub cell_id: String,
}

impl GridCell {
    /// Snap `(lat, lon)` to its cell.
    ///
    /// Returns `None` for non-finite coordinates or a non-positive cell size;
    /// such rows have no meaningful cell and are rejected by the loaders.
    pub fn from_coords(lat: f64, lon: f64, cell_size: f64) -> Option<Self> {
        if !lat.is_finite() || !lon.is_finite() || !(cell_size > 0.0) {
            return None;
        }
        let cell_lat = snap(lat, cell_size);
        let cell_lon = snap(lon, cell_size);
        Some(Self {
            cell_lat,
            cell_lon,
            cell_id: format_cell_id(cell_lat, cell_lon),
        })
    }
}

/// Shorthand for [`GridCell::from_coords`].
pub fn cell(lat: f64, lon: f64, cell_size: f64) -> Option<GridCell> {
    GridCell::from_coords(lat, lon, cell_size)
}

#[inline]
fn snap(v: f64, cell_size: f64) -> f64 {
    let idx = (v / cell_size + SNAP_EPS).floor();
    round3(idx * cell_size)
}

#[inline]
fn round3(v: f64) -> f64 {
    let r = (v * 1000.0).round() / 1000.0;
    // -0.0 would otherwise format as "-0.000".
    if r == 0.0 { 0.0 } else { r }
}

fn format_cell_id(cell_lat: f64, cell_lon: f64) -> String {
    format!("{cell_lat:.3}_{cell_lon:.3}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn snaps_to_south_west_corner() {
        let c = cell(36.75, -119.43, 0.1).unwrap();
        assert_abs_diff_eq!(c.cell_lat, 36.7, epsilon = 1e-12);
        assert_abs_diff_eq!(c.cell_lon, -119.5, epsilon = 1e-12);
        assert_eq!(c.cell_id, "36.700_-119.500");
    }

    #[test]
    fn exact_corner_maps_to_itself() {
        let c = cell(36.7, -119.4, 0.1).unwrap();
        assert_eq!(c.cell_id, "36.700_-119.400");
    }

    #[test]
    fn idempotent_over_many_points() {
        let mut rng_state: u64 = 7;
        for _ in 0..20_000 {
            // LCG for deterministic pseudo-random
            rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let lat = (rng_state as f64 / u64::MAX as f64) * 180.0 - 90.0;
            rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let lon = (rng_state as f64 / u64::MAX as f64) * 360.0 - 180.0;

            let first = cell(lat, lon, DEFAULT_CELL_SIZE).unwrap();
            let again = cell(first.cell_lat, first.cell_lon, DEFAULT_CELL_SIZE).unwrap();
            assert_eq!(first.cell_id, again.cell_id, "lat={lat} lon={lon}");
        }
    }

    #[test]
    fn idempotent_on_decimal_grid() {
        for i in -1800..1800 {
            let v = i as f64 / 10.0;
            let first = cell(v / 2.0, v, DEFAULT_CELL_SIZE).unwrap();
            let again = cell(first.cell_lat, first.cell_lon, DEFAULT_CELL_SIZE).unwrap();
            assert_eq!(first.cell_id, again.cell_id);
        }
    }

    #[test]
    fn negative_zero_formats_unsigned() {
        let c = cell(-0.0, 0.05, 0.1).unwrap();
        assert_eq!(c.cell_id, "0.000_0.000");
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        assert!(cell(f64::NAN, 10.0, 0.1).is_none());
        assert!(cell(10.0, f64::INFINITY, 0.1).is_none());
        assert!(cell(10.0, 10.0, 0.0).is_none());
    }

    #[test]
    fn coarser_cell_size() {
        let c = cell(1.3, 2.9, 0.5).unwrap();
        assert_eq!(c.cell_id, "1.000_2.500");
    }
}
