use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::dashboard::io_common::month_file_path;
use crate::dashboard::io_tsv::read_month_file;
use crate::dashboard::*;

/// Where the editor rows come from.
pub trait RowSource {
    /// The rows of one month for an activity level and a project.
    fn month_rows(
        &self,
        month: YearMonth,
        activity_level: &str,
        project: &str,
    ) -> GeoResult<Vec<EditorCountRow>>;

    /// All the rows of the given countries for an activity level and a project,
    /// ordered by month.
    fn trend_rows(
        &self,
        activity_level: &str,
        project: &str,
        country_codes: &[String],
    ) -> GeoResult<Vec<EditorCountRow>>;

    /// The distinct (country, country code) pairs, sorted by country name.
    fn countries(&self) -> GeoResult<Vec<(String, String)>>;
}

/// A directory with one TSV file per month.
#[derive(Debug, Clone)]
pub struct TsvDirectory {
    data_dir: PathBuf,
    months: Vec<YearMonth>,
}

impl TsvDirectory {
    /// Only the listed months are ever read.
    pub fn new(data_dir: &Path, months: Vec<YearMonth>) -> TsvDirectory {
        let mut months = months;
        months.sort();
        months.dedup();
        TsvDirectory {
            data_dir: data_dir.to_path_buf(),
            months,
        }
    }

    /// The rows of a month, `None` if the month has not been ingested.
    pub fn read_month(&self, month: YearMonth) -> GeoResult<Option<Vec<EditorCountRow>>> {
        let p = month_file_path(&self.data_dir, month);
        if !p.exists() {
            debug!("read_month: no file for {} at {:?}", month, p);
            return Ok(None);
        }
        read_month_file(&p).map(Some)
    }
}

impl RowSource for TsvDirectory {
    fn month_rows(
        &self,
        month: YearMonth,
        activity_level: &str,
        project: &str,
    ) -> GeoResult<Vec<EditorCountRow>> {
        let rows = self.read_month(month)?.unwrap_or_default();
        let res: Vec<EditorCountRow> = rows
            .into_iter()
            .filter(|r| r.month == month && r.activity_level == activity_level && r.project == project)
            .collect();
        info!(
            "month_rows: month={} activity_level={} project={}: {} rows",
            month,
            activity_level,
            project,
            res.len()
        );
        Ok(res)
    }

    fn trend_rows(
        &self,
        activity_level: &str,
        project: &str,
        country_codes: &[String],
    ) -> GeoResult<Vec<EditorCountRow>> {
        let codes: HashSet<&str> = country_codes.iter().map(|s| s.as_str()).collect();
        let mut res: Vec<EditorCountRow> = Vec::new();
        for month in self.months.iter() {
            if let Some(rows) = self.read_month(*month)? {
                res.extend(rows.into_iter().filter(|r| {
                    r.activity_level == activity_level
                        && r.project == project
                        && codes.contains(r.country_code.as_str())
                }));
            }
        }
        // Files are read in month order, but a file may hold several months.
        res.sort_by_key(|r| r.month);
        info!(
            "trend_rows: activity_level={} project={} countries={:?}: {} rows",
            activity_level,
            project,
            country_codes,
            res.len()
        );
        Ok(res)
    }

    fn countries(&self) -> GeoResult<Vec<(String, String)>> {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        for month in self.months.iter() {
            if let Some(rows) = self.read_month(*month)? {
                for r in rows {
                    if !r.country.is_empty() && !r.country_code.is_empty() {
                        seen.insert((r.country, r.country_code));
                    }
                }
            }
        }
        let mut res: Vec<(String, String)> = seen.into_iter().collect();
        res.sort();
        Ok(res)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dashboard::io_tsv::write_month_file;

    pub(crate) fn row(
        country: &str,
        code: &str,
        project: &str,
        activity_level: &str,
        editors: EditorCount,
        month: &str,
    ) -> EditorCountRow {
        EditorCountRow {
            wiki_db: project.split('.').next().unwrap().to_string(),
            project: project.to_string(),
            country: country.to_string(),
            country_code: code.to_string(),
            activity_level: activity_level.to_string(),
            count_eps: Some(1),
            sum_eps: Some(1.0),
            count_release_thresh: Some(1),
            editors,
            edits: Some(1),
            month: month.parse().unwrap(),
        }
    }

    /// A data directory with three months, the middle one missing. Germany has
    /// a non-numeric editors value in 2024-02.
    pub(crate) fn sample_directory(dir: &Path) -> TsvDirectory {
        let en = "en.wikipedia";
        let low = "1 to 4";
        write_month_file(
            &dir.join("2023-12.tsv"),
            &[
                row("United States", "US", en, low, EditorCount::Count(9000), "2023-12"),
                row("India", "IN", en, low, EditorCount::Count(3000), "2023-12"),
                row("Russia", "RU", en, low, EditorCount::Withheld, "2023-12"),
                row("France", "FR", "fr.wikipedia", low, EditorCount::Count(4000), "2023-12"),
            ],
        )
        .unwrap();
        write_month_file(
            &dir.join("2024-02.tsv"),
            &[
                row("United States", "US", en, low, EditorCount::Count(9500), "2024-02"),
                row("India", "IN", en, low, EditorCount::Count(2500), "2024-02"),
                row("Russia", "RU", en, low, EditorCount::Count(800), "2024-02"),
                row("China", "CN", en, low, EditorCount::Withheld, "2024-02"),
                row("Germany", "DE", en, low, EditorCount::Missing, "2024-02"),
                row("United States", "US", en, "5 to 99", EditorCount::Count(700), "2024-02"),
            ],
        )
        .unwrap();
        let months = YearMonth::range_inclusive("2023-12".parse().unwrap(), "2024-02".parse().unwrap());
        TsvDirectory::new(dir, months)
    }

    #[test]
    fn month_rows_filters() {
        let dir = tempfile::tempdir().unwrap();
        let source = sample_directory(dir.path());
        let rows = source
            .month_rows("2024-02".parse().unwrap(), "1 to 4", "en.wikipedia")
            .unwrap();
        let codes: Vec<&str> = rows.iter().map(|r| r.country_code.as_str()).collect();
        assert_eq!(codes, vec!["US", "IN", "RU", "CN", "DE"]);
        assert_eq!(rows[4].editors, EditorCount::Missing);
        // Not ingested.
        let none = source
            .month_rows("2024-01".parse().unwrap(), "1 to 4", "en.wikipedia")
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn trend_rows_are_ordered_by_month() {
        let dir = tempfile::tempdir().unwrap();
        let source = sample_directory(dir.path());
        let rows = source
            .trend_rows("1 to 4", "en.wikipedia", &["RU".to_string(), "US".to_string()])
            .unwrap();
        let got: Vec<(String, String)> = rows
            .iter()
            .map(|r| (r.month.to_string(), r.country_code.clone()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("2023-12".to_string(), "US".to_string()),
                ("2023-12".to_string(), "RU".to_string()),
                ("2024-02".to_string(), "US".to_string()),
                ("2024-02".to_string(), "RU".to_string()),
            ]
        );
    }

    #[test]
    fn distinct_countries() {
        let dir = tempfile::tempdir().unwrap();
        let source = sample_directory(dir.path());
        let countries = source.countries().unwrap();
        let names: Vec<&str> = countries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["China", "France", "Germany", "India", "Russia", "United States"]
        );
    }
}
