use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Wall-clock label shown next to generated quizzes.
pub fn clock_label(dt: DateTime<Utc>) -> String {
    dt.format("%H:%M:%S").to_string()
}

pub fn to_rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_clock_label() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(clock_label(dt), "09:05:07");
        assert_eq!(to_rfc3339(dt), "2024-03-01T09:05:07+00:00");
    }
}
