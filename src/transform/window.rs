use chrono::{NaiveTime, Timelike};

use crate::model::table::SeriesTable;

/// Inclusive time-of-day window, e.g. the regular session 08:30–15:15.
/// A window whose end is before its start wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        TimeWindow { start, end }
    }

    /// Parse `HH:MM` or `HH:MM:SS` bounds.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        Some(TimeWindow {
            start: parse_time(start)?,
            end: parse_time(end)?,
        })
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        // Sub-second precision never moves a row across a bound.
        let t = t.with_nanosecond(0).unwrap_or(t);
        if self.start <= self.end {
            self.start <= t && t <= self.end
        } else {
            t >= self.start || t <= self.end
        }
    }

    /// Keep rows whose time of day falls inside the window, preserving order.
    pub fn apply(&self, table: &mut SeriesTable) {
        table.rows.retain(|r| self.contains(r.timestamp.time()));
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::table::ObservationRow;
    use chrono::NaiveDate;

    fn table(times: &[(u32, u32)]) -> SeriesTable {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        SeriesTable {
            columns: vec!["SPOT".to_string()],
            rows: times
                .iter()
                .map(|&(h, m)| ObservationRow {
                    timestamp: day.and_hms_opt(h, m, 0).unwrap(),
                    values: vec![100.0],
                })
                .collect(),
            rejected: 0,
        }
    }

    fn session() -> TimeWindow {
        TimeWindow::parse("08:30", "15:15").unwrap()
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut t = table(&[(8, 29), (8, 30), (12, 0), (15, 15), (15, 16)]);
        session().apply(&mut t);
        let kept: Vec<_> = t.rows.iter().map(|r| r.timestamp.time()).collect();
        assert_eq!(
            kept,
            vec![
                NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
                NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(15, 15, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let mut once = table(&[(7, 0), (8, 30), (9, 45), (16, 0), (15, 15)]);
        session().apply(&mut once);
        let mut twice = once.clone();
        session().apply(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn overnight_window_wraps() {
        let w = TimeWindow::parse("22:00", "02:00").unwrap();
        assert!(w.contains(NaiveTime::from_hms_opt(23, 0, 0).unwrap()));
        assert!(w.contains(NaiveTime::from_hms_opt(1, 0, 0).unwrap()));
        assert!(!w.contains(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
    }

    #[test]
    fn parse_accepts_seconds_and_rejects_garbage() {
        assert!(TimeWindow::parse("08:30:00", "15:15:30").is_some());
        assert!(TimeWindow::parse("8h30", "15:15").is_none());
    }
}
