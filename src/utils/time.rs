use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Sortable, filesystem-safe stamp with millisecond resolution: `20241124_093005_123`.
pub fn file_stamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%d_%H%M%S_%3f").to_string()
}
