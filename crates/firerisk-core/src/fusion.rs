//! Fire/meteo fusion: bin both datasets to (date, cell), aggregate, and
//! left-join on the meteo side.
//!
//! Pipeline:
//!   1. Date extraction (time-of-day dropped)
//!   2. Grid indexing of every row
//!   3. Fire aggregate: max FRP per (date, cell)
//!   4. Meteo aggregate: NaN-skipping mean per feature per (date, cell)
//!   5. Left join meteo ⋈ fire, unmatched FRP filled with 0
//!   6. Labeling

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::grid::GridCell;
use crate::label::classify;
use crate::records::{DailyCellRecord, FireDetection, FusedTable, MeteoObservation};
use crate::schema::FeatureSchema;

type CellDay = (NaiveDate, String);

/// Row and group counts from a fusion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FusionStats {
    /// Fire rows dropped for non-finite coordinates or missing/negative FRP.
    pub fire_rows_rejected: usize,
    /// Meteo rows dropped for non-finite coordinates.
    pub meteo_rows_rejected: usize,
    pub fire_groups: usize,
    pub meteo_groups: usize,
    /// Fire (date, cell) groups with no meteo counterpart.
    pub fire_only_groups: usize,
}

/// Running per-feature sums for the NaN-skipping mean.
struct MeanAccumulator {
    sums: Vec<f64>,
    counts: Vec<usize>,
}

impl MeanAccumulator {
    fn new(n: usize) -> Self {
        Self { sums: vec![0.0; n], counts: vec![0; n] }
    }

    fn push(&mut self, values: &[f64]) {
        for ((s, c), &v) in self.sums.iter_mut().zip(self.counts.iter_mut()).zip(values) {
            if !v.is_nan() {
                *s += v;
                *c += 1;
            }
        }
    }

    fn finish(self) -> Vec<f64> {
        self.sums
            .into_iter()
            .zip(self.counts)
            .map(|(s, c)| if c == 0 { f64::NAN } else { s / c as f64 })
            .collect()
    }
}

/// Max FRP per (date, cell).
fn aggregate_fire(fires: &[FireDetection], cell_size: f64, stats: &mut FusionStats) -> BTreeMap<CellDay, f64> {
    let mut groups: BTreeMap<CellDay, f64> = BTreeMap::new();
    for f in fires {
        let cell = match GridCell::from_coords(f.latitude, f.longitude, cell_size) {
            Some(c) if f.frp >= 0.0 => c,
            _ => {
                stats.fire_rows_rejected += 1;
                continue;
            }
        };
        let entry = groups.entry((f.acq_date, cell.cell_id)).or_insert(0.0);
        *entry = entry.max(f.frp);
    }
    groups
}

/// Mean of every feature per (date, cell).
fn aggregate_meteo<'a, I>(
    meteo: I,
    n_features: usize,
    cell_size: f64,
    stats: &mut FusionStats,
) -> BTreeMap<CellDay, Vec<f64>>
where
    I: IntoIterator<Item = &'a MeteoObservation>,
{
    let mut groups: BTreeMap<CellDay, MeanAccumulator> = BTreeMap::new();
    for m in meteo {
        let Some(cell) = GridCell::from_coords(m.latitude, m.longitude, cell_size) else {
            stats.meteo_rows_rejected += 1;
            continue;
        };
        groups
            .entry((m.time.date(), cell.cell_id))
            .or_insert_with(|| MeanAccumulator::new(n_features))
            .push(&m.features);
    }
    groups.into_iter().map(|(k, acc)| (k, acc.finish())).collect()
}

/// Fuse fire detections and meteo observations into one labelled record per
/// (date, cell) present in the meteo data. Records come out sorted by
/// (date, cell_id).
pub fn fuse<'a, I>(
    fires: &[FireDetection],
    meteo: I,
    schema: &FeatureSchema,
    cell_size: f64,
) -> (FusedTable, FusionStats)
where
    I: IntoIterator<Item = &'a MeteoObservation>,
{
    let mut stats = FusionStats::default();

    let fire_groups = aggregate_fire(fires, cell_size, &mut stats);
    let meteo_groups = aggregate_meteo(meteo, schema.len(), cell_size, &mut stats);
    stats.fire_groups = fire_groups.len();
    stats.meteo_groups = meteo_groups.len();
    stats.fire_only_groups = fire_groups.keys().filter(|k| !meteo_groups.contains_key(*k)).count();

    let records: Vec<DailyCellRecord> = meteo_groups
        .into_iter()
        .map(|(key, features)| {
            // No detection means zero FRP, not missing data.
            let frp_max = fire_groups.get(&key).copied().unwrap_or(0.0);
            let (date, cell_id) = key;
            DailyCellRecord { date, cell_id, frp_max, fire_class: classify(frp_max), features }
        })
        .collect();

    if stats.fire_rows_rejected + stats.meteo_rows_rejected > 0 {
        warn!(
            fire = stats.fire_rows_rejected,
            meteo = stats.meteo_rows_rejected,
            "rejected rows without a grid cell or valid FRP"
        );
    }
    info!(
        records = records.len(),
        fire_groups = stats.fire_groups,
        fire_only_dropped = stats.fire_only_groups,
        "fused fire and meteo data"
    );

    (FusedTable { schema: schema.clone(), records }, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::FireClass;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDateTime;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn fire(lat: f64, lon: f64, d: &str, frp: f64) -> FireDetection {
        FireDetection { latitude: lat, longitude: lon, acq_date: date(d), frp }
    }

    fn obs(lat: f64, lon: f64, t: &str, features: Vec<f64>) -> MeteoObservation {
        MeteoObservation { latitude: lat, longitude: lon, time: ts(t), features }
    }

    fn schema2() -> FeatureSchema {
        FeatureSchema::new(["a", "b"])
    }

    #[test]
    fn max_frp_and_mean_features_per_cell_day() {
        let fires = vec![
            fire(36.71, -119.39, "2023-08-01", 4.0),
            fire(36.75, -119.35, "2023-08-01", 12.5),
        ];
        let meteo = vec![
            obs(36.72, -119.38, "2023-08-01 00:00:00", vec![1.0, 10.0]),
            obs(36.78, -119.32, "2023-08-01 18:00:00", vec![3.0, f64::NAN]),
        ];
        let (table, stats) = fuse(&fires, &meteo, &schema2(), 0.1);
        assert_eq!(table.len(), 1);
        let r = &table.records[0];
        assert_eq!(r.cell_id, "36.700_-119.400");
        assert_eq!(r.frp_max, 12.5);
        assert_eq!(r.fire_class, FireClass::High);
        assert_abs_diff_eq!(r.features[0], 2.0);
        // NaN is skipped, not propagated.
        assert_abs_diff_eq!(r.features[1], 10.0);
        assert_eq!(stats.fire_only_groups, 0);
    }

    #[test]
    fn cell_without_detection_is_class_zero() {
        let meteo = vec![obs(10.05, 20.05, "2023-08-02 06:00:00", vec![1.0, 2.0])];
        let (table, _) = fuse(&[], &meteo, &schema2(), 0.1);
        assert_eq!(table.records[0].frp_max, 0.0);
        assert_eq!(table.records[0].fire_class, FireClass::None);
    }

    #[test]
    fn fire_only_cells_are_dropped() {
        let fires = vec![fire(50.0, 50.0, "2023-08-01", 30.0)];
        let meteo = vec![obs(10.0, 10.0, "2023-08-01 00:00:00", vec![1.0, 1.0])];
        let (table, stats) = fuse(&fires, &meteo, &schema2(), 0.1);
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].fire_class, FireClass::None);
        assert_eq!(stats.fire_only_groups, 1);
    }

    #[test]
    fn different_days_are_separate_rows() {
        let fires = vec![fire(1.0, 1.0, "2023-08-02", 5.0)];
        let meteo = vec![
            obs(1.0, 1.0, "2023-08-01 00:00:00", vec![1.0, 1.0]),
            obs(1.0, 1.0, "2023-08-02 00:00:00", vec![1.0, 1.0]),
        ];
        let (table, _) = fuse(&fires, &meteo, &schema2(), 0.1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].fire_class, FireClass::None);
        assert_eq!(table.records[1].fire_class, FireClass::Low);
    }

    #[test]
    fn at_most_one_row_per_key_and_frp_non_negative() {
        let mut meteo = Vec::new();
        let mut fires = Vec::new();
        for i in 0..200 {
            let lat = (i % 7) as f64 * 0.03;
            let lon = (i % 5) as f64 * 0.04;
            let day = format!("2023-08-0{}", 1 + i % 3);
            meteo.push(obs(lat, lon, &format!("{day} 12:00:00"), vec![i as f64, 1.0]));
            if i % 4 == 0 {
                fires.push(fire(lat, lon, &day, (i % 13) as f64));
            }
        }
        let (table, _) = fuse(&fires, &meteo, &schema2(), 0.1);
        let mut keys: Vec<_> = table.records.iter().map(|r| (r.date, r.cell_id.clone())).collect();
        let n = keys.len();
        keys.dedup();
        assert_eq!(keys.len(), n, "records must be unique and sorted by key");
        assert!(table.records.iter().all(|r| r.frp_max >= 0.0));
    }

    #[test]
    fn invalid_rows_are_rejected() {
        let fires = vec![
            fire(f64::NAN, 1.0, "2023-08-01", 5.0),
            fire(1.0, 1.0, "2023-08-01", f64::NAN),
            fire(1.0, 1.0, "2023-08-01", -3.0),
        ];
        let meteo = vec![
            obs(1.0, f64::NAN, "2023-08-01 00:00:00", vec![1.0, 1.0]),
            obs(1.0, 1.0, "2023-08-01 00:00:00", vec![1.0, 1.0]),
        ];
        let (table, stats) = fuse(&fires, &meteo, &schema2(), 0.1);
        assert_eq!(stats.fire_rows_rejected, 3);
        assert_eq!(stats.meteo_rows_rejected, 1);
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].frp_max, 0.0);
    }
}
