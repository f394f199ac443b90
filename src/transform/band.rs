use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::table::{SnapshotTable, StrikeRow};

/// Symmetric inclusion range around a reference price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Band {
    /// Percentage offset, 0–100 (1.5 means ±1.5%).
    Percent { value: f64 },
    /// Absolute offset in price points.
    Points { value: f64 },
}

impl Band {
    /// Cut points computed once from the reference price.
    pub fn bounds(&self, reference: f64) -> BandBounds {
        match *self {
            Band::Percent { value } => {
                let offset = reference * value / 100.0;
                BandBounds {
                    min: reference - offset,
                    max: reference + offset,
                }
            }
            Band::Points { value } => BandBounds {
                min: reference - value,
                max: reference + value,
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        match *self {
            Band::Percent { value } => value.is_finite() && value > 0.0 && value < 100.0,
            Band::Points { value } => value.is_finite() && value > 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandBounds {
    pub min: f64,
    pub max: f64,
}

impl BandBounds {
    pub fn contains(&self, x: f64) -> bool {
        self.min <= x && x <= self.max
    }
}

/// Row picked for annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremum {
    pub strike: f64,
    pub total: f64,
}

/// Snapshot rows inside the band with their derived totals.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredSnapshot {
    pub bounds: BandBounds,
    pub rows: Vec<StrikeRow>,
    /// Per-row sum of the volume buckets, parallel to `rows`.
    pub totals: Vec<f64>,
    /// Row with the largest positive total, if any total is positive.
    pub max_positive: Option<Extremum>,
    /// Row with the most negative total, if any total is negative.
    pub max_negative: Option<Extremum>,
}

impl FilteredSnapshot {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Keep rows whose strike lies inside the band around the spot price.
pub fn filter_band(table: &SnapshotTable, band: Band) -> FilteredSnapshot {
    let bounds = band.bounds(table.reference.spot());
    let rows: Vec<StrikeRow> = table
        .rows
        .iter()
        .filter(|r| bounds.contains(r.strike))
        .cloned()
        .collect();
    let totals: Vec<f64> = rows.iter().map(StrikeRow::total).collect();
    let (max_positive, max_negative) = extrema(&rows, &totals);
    FilteredSnapshot {
        bounds,
        rows,
        totals,
        max_positive,
        max_negative,
    }
}

/// Largest positive and most negative totals. Ties go to the lowest strike.
pub fn extrema(rows: &[StrikeRow], totals: &[f64]) -> (Option<Extremum>, Option<Extremum>) {
    let mut max_positive: Option<Extremum> = None;
    let mut max_negative: Option<Extremum> = None;
    for (row, &total) in rows.iter().zip(totals) {
        if total > 0.0 && max_positive.is_none_or(|m| total > m.total) {
            max_positive = Some(Extremum {
                strike: row.strike,
                total,
            });
        }
        if total < 0.0 && max_negative.is_none_or(|m| total < m.total) {
            max_negative = Some(Extremum {
                strike: row.strike,
                total,
            });
        }
    }
    (max_positive, max_negative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::table::ReferencePrices;

    fn snapshot(spot: f64, rows: &[(f64, &[f64])]) -> SnapshotTable {
        SnapshotTable {
            reference: ReferencePrices::new(vec![spot]).unwrap(),
            volume_columns: vec!["A".into(), "B".into(), "C".into()],
            rows: rows
                .iter()
                .map(|(strike, v)| StrikeRow {
                    strike: *strike,
                    volumes: v.to_vec(),
                })
                .collect(),
            rejected: 0,
        }
    }

    #[test]
    fn percent_band_matches_reference_scenario() {
        let b = Band::Percent { value: 1.5 }.bounds(4800.0);
        assert!((b.min - 4728.0).abs() < 1e-9);
        assert!((b.max - 4872.0).abs() < 1e-9);
    }

    #[test]
    fn retained_rows_stay_inside_band() {
        let t = snapshot(
            4800.0,
            &[
                (4700.0, &[1.0, 0.0, 0.0]),
                (4750.0, &[120.0, -30.0, 10.0]),
                (4800.0, &[5.0, 5.0, 5.0]),
                (4880.0, &[9.0, 9.0, 9.0]),
            ],
        );
        let f = filter_band(&t, Band::Percent { value: 1.5 });
        assert_eq!(f.rows.len(), 2);
        assert!(f.rows.iter().all(|r| f.bounds.contains(r.strike)));
        assert_eq!(f.totals[0], 100.0);
    }

    #[test]
    fn points_band() {
        let b = Band::Points { value: 150.0 }.bounds(4800.0);
        assert_eq!((b.min, b.max), (4650.0, 4950.0));
    }

    #[test]
    fn extrema_pick_largest_positive_and_most_negative() {
        let t = snapshot(
            100.0,
            &[
                (99.0, &[10.0, 0.0, 0.0]),
                (100.0, &[-40.0, 0.0, 0.0]),
                (101.0, &[30.0, 0.0, 0.0]),
                (102.0, &[-5.0, 0.0, 0.0]),
            ],
        );
        let f = filter_band(&t, Band::Percent { value: 5.0 });
        assert_eq!(
            f.max_positive,
            Some(Extremum {
                strike: 101.0,
                total: 30.0
            })
        );
        assert_eq!(
            f.max_negative,
            Some(Extremum {
                strike: 100.0,
                total: -40.0
            })
        );
    }

    #[test]
    fn no_extrema_without_signed_totals() {
        let t = snapshot(100.0, &[(100.0, &[0.0, 0.0, 0.0])]);
        let f = filter_band(&t, Band::Percent { value: 1.0 });
        assert_eq!(f.max_positive, None);
        assert_eq!(f.max_negative, None);
    }

    #[test]
    fn empty_band_yields_no_rows() {
        let t = snapshot(100.0, &[(200.0, &[1.0, 1.0, 1.0])]);
        let f = filter_band(&t, Band::Points { value: 10.0 });
        assert!(f.is_empty());
        assert_eq!(f.max_positive, None);
    }
}
