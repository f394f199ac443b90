use chrono::NaiveDateTime;

/// One timestamped sample; `values` follows the table's value columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRow {
    pub timestamp: NaiveDateTime,
    pub values: Vec<f64>,
}

/// All rows of one time-series file, unique and ascending by timestamp.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesTable {
    /// Value column names (the timestamp column is not included).
    pub columns: Vec<String>,
    pub rows: Vec<ObservationRow>,
    /// Rows dropped while loading (wrong width or non-numeric cells).
    pub rejected: usize,
}

impl SeriesTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.rows.iter().map(|r| r.timestamp).collect()
    }

    /// Values of one column in row order.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }
}

/// Scalar prices carried on the first row of a snapshot file, in file order:
/// index spot, correlated future, ETF.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePrices {
    values: Vec<f64>,
}

impl ReferencePrices {
    /// `None` when no price was given.
    pub fn new(values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            None
        } else {
            Some(ReferencePrices { values })
        }
    }

    /// The underlying's spot price; band filtering is centred on it.
    pub fn spot(&self) -> f64 {
        self.values[0]
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// One strike with its volume buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct StrikeRow {
    pub strike: f64,
    pub volumes: Vec<f64>,
}

impl StrikeRow {
    /// Sum of every volume bucket.
    pub fn total(&self) -> f64 {
        self.volumes.iter().sum()
    }
}

/// A volume-by-strike snapshot, unique and ascending by strike.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotTable {
    pub reference: ReferencePrices,
    /// Volume column names (the strike column is not included).
    pub volume_columns: Vec<String>,
    pub rows: Vec<StrikeRow>,
    pub rejected: usize,
}
