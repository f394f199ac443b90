use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Formats tried in order when none are configured. The first is primary.
pub const DEFAULT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d",
];

/// Priority-ordered timestamp parsing: the primary format first, then each
/// fallback in turn. The first format that consumes the whole cell wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampParser {
    formats: Vec<String>,
}

impl Default for TimestampParser {
    fn default() -> Self {
        TimestampParser {
            formats: DEFAULT_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl TimestampParser {
    /// An empty list falls back to [`DEFAULT_FORMATS`].
    pub fn new(formats: Vec<String>) -> Self {
        if formats.is_empty() {
            Self::default()
        } else {
            TimestampParser { formats }
        }
    }

    pub fn primary(&self) -> &str {
        &self.formats[0]
    }

    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    pub fn parse(&self, raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        self.formats.iter().find_map(|fmt| parse_with(raw, fmt))
    }
}

/// Date-only formats resolve to midnight.
fn parse_with(raw: &str, fmt: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, fmt)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, fmt)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn primary_format() {
        let p = TimestampParser::default();
        assert_eq!(p.parse("2024-01-02 08:30:00"), Some(at(2024, 1, 2, 8, 30, 0)));
    }

    #[test]
    fn primary_match_is_never_reinterpreted() {
        // Every value the primary format accepts parses identically with only
        // the primary format configured.
        let full = TimestampParser::default();
        let primary_only = TimestampParser::new(vec![full.primary().to_string()]);
        for raw in ["2024-01-02 08:30:00", "1999-12-31 23:59:59", " 2024-03-10 02:00:01 "] {
            assert_eq!(full.parse(raw), primary_only.parse(raw));
            assert!(full.parse(raw).is_some());
        }
    }

    #[test]
    fn fallbacks_in_order() {
        let p = TimestampParser::default();
        assert_eq!(p.parse("2024-01-02 08:30"), Some(at(2024, 1, 2, 8, 30, 0)));
        assert_eq!(p.parse("2024-01-02T08:30:15"), Some(at(2024, 1, 2, 8, 30, 15)));
        assert_eq!(p.parse("02/01/2024 08:30:00"), Some(at(2024, 1, 2, 8, 30, 0)));
        assert_eq!(p.parse("2024-01-02"), Some(at(2024, 1, 2, 0, 0, 0)));
    }

    #[test]
    fn garbage_is_rejected() {
        let p = TimestampParser::default();
        assert_eq!(p.parse("yesterday"), None);
        assert_eq!(p.parse(""), None);
    }

    #[test]
    fn empty_list_uses_defaults() {
        assert_eq!(TimestampParser::new(Vec::new()), TimestampParser::default());
    }
}
