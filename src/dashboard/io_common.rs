use std::path::{Path, PathBuf};

use chrono::Datelike;
use editor_risk::YearMonth;

/// The current calendar month, in local time.
pub fn current_month() -> YearMonth {
    let today = chrono::Local::now().date_naive();
    // chrono months are always in 1..=12.
    match YearMonth::new(today.year(), today.month()) {
        Ok(m) => m,
        Err(e) => unreachable!("invalid calendar month from chrono: {}", e),
    }
}

/// All the months from `first` to `today` included.
pub fn available_months(first: YearMonth, today: YearMonth) -> Vec<YearMonth> {
    YearMonth::range_inclusive(first, today)
}

pub fn month_file_name(month: YearMonth) -> String {
    format!("{}.tsv", month)
}

pub fn month_file_path(data_dir: &Path, month: YearMonth) -> PathBuf {
    data_dir.join(month_file_name(month))
}

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
