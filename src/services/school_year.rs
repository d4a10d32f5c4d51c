use chrono::{Datelike, NaiveDate};

/// School year containing `today`, formatted `"N-(N+1)"`.
/// September starts a new school year.
pub fn current_school_year(today: NaiveDate) -> String {
    let year = today.year();
    if today.month() < 9 {
        format!("{}-{}", year - 1, year)
    } else {
        format!("{}-{}", year, year + 1)
    }
}

/// Accepts `"YYYY-YYYY"` where the second year follows the first.
pub fn is_school_year(raw: &str) -> bool {
    let Some((start, end)) = raw.split_once('-') else { return false };
    if start.len() != 4 || end.len() != 4 {
        return false;
    }
    match (start.parse::<i32>(), end.parse::<i32>()) {
        (Ok(start), Ok(end)) => end == start + 1,
        _ => false,
    }
}
