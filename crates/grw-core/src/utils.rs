use chrono::Utc;

/// RFC3339 timestamp in UTC (records, notices, logs).
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

/// Clip long payload excerpts before they reach a log line.
pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_text_adds_ellipsis() {
        let s = "a".repeat(300);
        let t = truncate_text(&s, 200);
        assert!(t.ends_with("..."));
        assert_eq!(t.len(), 203);
    }

    #[test]
    fn truncate_text_leaves_short_input_alone() {
        assert_eq!(truncate_text("short", 200), "short");
    }

    #[test]
    fn iso_timestamp_is_rfc3339() {
        let ts = iso_timestamp_utc();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
