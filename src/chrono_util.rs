use chrono::{Local, NaiveDate, NaiveDateTime};

pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// `YYYYMMDD_HHMMSS`, shared by every file of one run.
pub fn run_stamp(at: NaiveDateTime) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

pub fn log_file_name(date: NaiveDate) -> String {
    format!("bgmafia_scraper_{}.log", date.format("%Y%m%d"))
}
