//! Parsing of user-typed tag lists and due dates.

use chrono::{Datelike, Local, NaiveDate, TimeDelta};

/// Normalize a single tag: trimmed and lowercased.
pub fn normalise_tag(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Normalize whole tags, dropping empty ones and later duplicates.
pub fn normalise_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in tags {
        let tag = normalise_tag(raw.as_ref());
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Split raw tag inputs on commas and whitespace and normalize each tag.
///
/// Empty pieces are dropped and duplicates removed; the first occurrence keeps
/// its position, so the result preserves the order the user typed.
pub fn split_and_normalise_tags<S: AsRef<str>>(inputs: &[S]) -> Vec<String> {
    let parts: Vec<&str> = inputs
        .iter()
        .flat_map(|raw| raw.as_ref().split(|c: char| c == ',' || c.is_whitespace()))
        .collect();
    normalise_tags(&parts)
}

/// Parse a due date relative to the local calendar day.
pub fn parse_due_input(s: &str) -> Option<NaiveDate> {
    parse_due_input_from(s, Local::now().date_naive())
}

/// Parse human-readable due date input against a fixed `today`.
///
/// Supports:
/// - "today", "tomorrow"
/// - "in 3d", "in 2w"
/// - weekday names ("friday", "next monday")
/// - "YYYY-MM-DD"
pub fn parse_due_input_from(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "" => return None,
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return today.checked_add_signed(TimeDelta::try_days(days)?);
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return today.checked_add_signed(TimeDelta::try_weeks(weeks)?);
            }
        }
        return None;
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];

    let (next_week, name) = match s.strip_prefix("next ") {
        Some(rest) => (true, rest),
        None => (false, s.as_str()),
    };
    if let Some(&(_, target)) = weekdays.iter().find(|(day, _)| *day == name) {
        let current = today.weekday().num_days_from_monday() as i64;
        let mut ahead = (target + 7 - current) % 7;
        if next_week {
            ahead += 7;
        }
        return today.checked_add_signed(TimeDelta::try_days(ahead)?);
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_split_and_normalise_tags() {
        let tags = split_and_normalise_tags(&["Home, urgent", "  HOME errands ", ",,"]);
        assert_eq!(tags, vec!["home", "urgent", "errands"]);
        assert!(split_and_normalise_tags::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_normalise_tags_keeps_multi_word_tags() {
        let tags = normalise_tags(&[" New York ", "new york", "", "Work"]);
        assert_eq!(tags, vec!["new york", "work"]);
    }

    #[test]
    fn test_parse_due_keywords() {
        // 2026-10-16 is a Friday.
        let today = day(2026, 10, 16);
        assert_eq!(parse_due_input_from("today", today), Some(today));
        assert_eq!(parse_due_input_from("Tomorrow", today), Some(day(2026, 10, 17)));
        assert_eq!(parse_due_input_from("in 3d", today), Some(day(2026, 10, 19)));
        assert_eq!(parse_due_input_from("in 2w", today), Some(day(2026, 10, 30)));
        assert_eq!(parse_due_input_from("monday", today), Some(day(2026, 10, 19)));
        assert_eq!(parse_due_input_from("friday", today), Some(today));
        assert_eq!(parse_due_input_from("next fri", today), Some(day(2026, 10, 23)));
    }

    #[test]
    fn test_parse_due_iso_and_garbage() {
        let today = day(2026, 10, 16);
        assert_eq!(parse_due_input_from("2027-01-02", today), Some(day(2027, 1, 2)));
        assert_eq!(parse_due_input_from("   ", today), None);
        assert_eq!(parse_due_input_from("someday", today), None);
        assert_eq!(parse_due_input_from("in xd", today), None);
    }

    #[test]
    fn test_parse_due_out_of_range_offsets() {
        let today = day(2026, 10, 16);
        assert_eq!(parse_due_input_from("in 100000000d", today), None);
        assert_eq!(parse_due_input_from("in -100000000d", today), None);
        assert_eq!(parse_due_input_from(&format!("in {}d", i64::MAX), today), None);
        assert_eq!(parse_due_input_from(&format!("in {}w", i64::MAX), today), None);
        assert_eq!(parse_due_input_from("tomorrow", NaiveDate::MAX), None);
        assert!(parse_due_input("in 100000000d").is_none());
    }
}
