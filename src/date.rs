use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

// Return true if `text` is a calendar date in yyyy-mm-dd form.
pub fn is_valid_date(text: &str) -> bool {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).is_ok()
}

pub fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .with_context(|| format!("Invalid date (expected yyyy-mm-dd): {text}"))
}

// The default for a blank date prompt.
pub fn tomorrow() -> NaiveDate {
    let today = Local::now().date_naive();
    today.succ_opt().unwrap_or(today)
}
