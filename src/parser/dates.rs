use chrono::NaiveDate;
use tracing::error;

/// Parse the date text found in `<time>` tags.
/// Missing day or month fall back to the 1st / January.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let t = text.trim();

    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return Some(d);
    }
    // "March 2, 2014" / "Mar 2, 2014"
    for fmt in ["%B %d, %Y", "%b %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return Some(d);
        }
    }
    // "March 2014" / "Mar 2014"
    let first_of_month = format!("1 {}", t);
    for fmt in ["%d %B %Y", "%d %b %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(&first_of_month, fmt) {
            return Some(d);
        }
    }
    if t.len() == 4 && t.chars().all(|c| c.is_ascii_digit()) {
        if let Some(d) = t.parse().ok().and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)) {
            return Some(d);
        }
    }

    error!("[Date range] unrecognised date: {:?}", t);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn accepted_formats() {
        assert_eq!(parse_date("2014-03-02"), ymd(2014, 3, 2));
        assert_eq!(parse_date("March 2, 2014"), ymd(2014, 3, 2));
        assert_eq!(parse_date("Mar 2, 2014"), ymd(2014, 3, 2));
        assert_eq!(parse_date(" March 2014 "), ymd(2014, 3, 1));
        assert_eq!(parse_date("Sep 2011"), ymd(2011, 9, 1));
        assert_eq!(parse_date("2009"), ymd(2009, 1, 1));
    }

    #[test]
    fn full_month_names() {
        assert_eq!(parse_date("June 2016"), ymd(2016, 6, 1));
        assert_eq!(parse_date("January 2013"), ymd(2013, 1, 1));
        assert_eq!(parse_date("September 30, 2015"), ymd(2015, 9, 30));
    }

    #[test]
    fn rejects_open_ended_and_garbage() {
        assert_eq!(parse_date("Present"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("13/45/2010"), None);
    }
}
