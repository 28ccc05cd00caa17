// The monthly ingestion job.

use std::fs;
use std::path::Path;

use editor_risk::policy::UnpublishedPolicy;
use log::{debug, error, info};
use serde_json::{json, Value as JSValue};
use snafu::prelude::*;

use crate::dashboard::config_reader::Settings;
use crate::dashboard::io_common::{month_file_path, simplify_file_name};
use crate::dashboard::io_tsv::{read_rows, write_month_file};
use crate::dashboard::*;

/// Where the remote files come from.
pub trait DatasetFetcher {
    /// The raw TSV content of a month.
    fn fetch_month(&self, month: YearMonth) -> GeoResult<String>;
    /// The raw content of the country boundaries file.
    fn fetch_geojson(&self) -> GeoResult<Vec<u8>>;
}

/// Fetches the files over HTTP.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    dataset_url: String,
    geojson_url: String,
}

impl HttpFetcher {
    pub fn new(dataset_url: &str, geojson_url: &str) -> GeoResult<HttpFetcher> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("geoeditors/", env!("CARGO_PKG_VERSION")))
            .build()
            .context(DownloadSnafu { url: dataset_url })?;
        Ok(HttpFetcher {
            client,
            dataset_url: dataset_url.to_string(),
            geojson_url: geojson_url.to_string(),
        })
    }

    pub fn month_url(&self, month: YearMonth) -> String {
        format!("{}/{}.tsv", self.dataset_url, month)
    }

    fn get(&self, url: &str) -> GeoResult<reqwest::blocking::Response> {
        info!("Attempting to download {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .context(DownloadSnafu { url })?;
        let status = response.status();
        ensure!(
            status.is_success(),
            DownloadStatusSnafu {
                url,
                status: status.as_u16(),
            }
        );
        Ok(response)
    }
}

impl DatasetFetcher for HttpFetcher {
    fn fetch_month(&self, month: YearMonth) -> GeoResult<String> {
        let url = self.month_url(month);
        let response = self.get(&url)?;
        response.text().context(DownloadSnafu { url })
    }

    fn fetch_geojson(&self) -> GeoResult<Vec<u8>> {
        let response = self.get(&self.geojson_url)?;
        let bytes = response.bytes().context(DownloadSnafu {
            url: self.geojson_url.clone(),
        })?;
        Ok(bytes.to_vec())
    }
}

/// The outcome of one update run.
#[derive(Debug, Default)]
pub struct UpdateSummary {
    pub downloaded: Vec<YearMonth>,
    /// Months that were already in the data directory.
    pub present: Vec<YearMonth>,
    pub failed: Vec<(YearMonth, String)>,
    pub geojson_downloaded: bool,
    pub geojson_error: Option<String>,
}

/// Parses the raw content of a month and adds the withheld rows.
pub fn ingest_month(
    raw: &str,
    month: YearMonth,
    policy: &UnpublishedPolicy,
) -> GeoResult<Vec<EditorCountRow>> {
    let organic = read_rows(raw.as_bytes(), &month.to_string())?;
    debug!("ingest_month: {}: {} organic rows", month, organic.len());
    Ok(policy.apply(organic, month))
}

/// Downloads, processes and saves one month.
pub fn download_monthly_data(
    data_dir: &Path,
    month: YearMonth,
    fetcher: &dyn DatasetFetcher,
    policy: &UnpublishedPolicy,
) -> GeoResult<usize> {
    let raw = fetcher.fetch_month(month)?;
    let rows = ingest_month(&raw, month, policy)?;
    let p = month_file_path(data_dir, month);
    write_month_file(&p, &rows)?;
    Ok(rows.len())
}

/// Downloads the boundaries file if it is not there yet. Returns true if it
/// was downloaded.
pub fn ensure_geojson(path: &Path, fetcher: &dyn DatasetFetcher) -> GeoResult<bool> {
    if path.exists() {
        debug!("ensure_geojson: {:?} already present", path);
        return Ok(false);
    }
    let content = fetcher.fetch_geojson()?;
    // Checked before writing, a broken file would be kept forever.
    let js: JSValue = serde_json::from_slice(&content).context(ParsingJsonSnafu {
        path: simplify_file_name(path),
    })?;
    geojson::CountryFeatures::from_json(&js, &simplify_file_name(path))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context(WritingFileSnafu {
            path: parent.display().to_string(),
        })?;
    }
    fs::write(path, &content).context(WritingFileSnafu {
        path: path.display().to_string(),
    })?;
    info!("Downloaded the country boundaries to {:?}", path);
    Ok(true)
}

/// Fetches every month of `months` that has no file yet. A month that fails
/// is logged and the other ones are still processed.
pub fn run_update(
    settings: &Settings,
    months: &[YearMonth],
    fetcher: &dyn DatasetFetcher,
    policy: &UnpublishedPolicy,
) -> GeoResult<UpdateSummary> {
    info!("Starting data update process");
    fs::create_dir_all(&settings.data_directory).context(WritingFileSnafu {
        path: settings.data_directory.display().to_string(),
    })?;
    let mut summary = UpdateSummary::default();
    match ensure_geojson(&settings.geojson_path, fetcher) {
        Ok(downloaded) => summary.geojson_downloaded = downloaded,
        Err(e) => {
            error!("Error downloading the country boundaries: {}", e);
            summary.geojson_error = Some(e.to_string());
        }
    }

    for month in months.iter() {
        let p = month_file_path(&settings.data_directory, *month);
        if p.exists() {
            debug!("run_update: {} already present", month);
            summary.present.push(*month);
            continue;
        }
        match download_monthly_data(&settings.data_directory, *month, fetcher, policy) {
            Ok(num_rows) => {
                info!(
                    "Successfully downloaded and processed data for {} ({} rows)",
                    month, num_rows
                );
                summary.downloaded.push(*month);
            }
            Err(e) => {
                error!("Error downloading data for {}: {}", month, e);
                summary.failed.push((*month, e.to_string()));
            }
        }
    }
    Ok(summary)
}

fn month_names(l: &[YearMonth]) -> Vec<String> {
    l.iter().map(|m| m.to_string()).collect()
}

pub fn summary_to_json(summary: &UpdateSummary) -> JSValue {
    let failed: Vec<JSValue> = summary
        .failed
        .iter()
        .map(|(m, msg)| json!({"month": m.to_string(), "error": msg}))
        .collect();
    json!({
        "downloaded": month_names(&summary.downloaded),
        "present": month_names(&summary.present),
        "failed": failed,
        "geojsonDownloaded": summary.geojson_downloaded,
        "geojsonError": summary.geojson_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::config_reader::GeoConfig;
    use crate::dashboard::io_tsv::read_month_file;
    use std::collections::HashMap;

    struct FakeFetcher {
        months: HashMap<String, String>,
        geojson_status: Option<u16>,
    }

    impl DatasetFetcher for FakeFetcher {
        fn fetch_month(&self, month: YearMonth) -> GeoResult<String> {
            match self.months.get(&month.to_string()) {
                Some(s) => Ok(s.clone()),
                None => DownloadStatusSnafu {
                    url: format!("fake://{}.tsv", month),
                    status: 404u16,
                }
                .fail(),
            }
        }

        fn fetch_geojson(&self) -> GeoResult<Vec<u8>> {
            if let Some(status) = self.geojson_status {
                return DownloadStatusSnafu {
                    url: "fake://countries.geojson",
                    status,
                }
                .fail();
            }
            Ok(br#"{"type": "FeatureCollection", "features": [{"type": "Feature", "id": "USA", "properties": {}, "geometry": null}]}"#.to_vec())
        }
    }

    const DEC: &str = "enwiki\ten.wikipedia\tUnited States\tUS\t1 to 4\t10\t5.5\t3\t12345\t40000\t2023-12\n\
enwiki\ten.wikipedia\tUnited States\tUS\t5 to 99\t10\t5.5\t3\t2345\t80000\t2023-12\n\
frwiki\tfr.wikipedia\tFrance\tFR\t1 to 4\t10\t5.5\t3\t4000\t9000\t2023-12\n";

    const FEB: &str = "enwiki\ten.wikipedia\tUnited States\tUS\t1 to 4\t10\t5.5\t3\t12000\t40000\t2024-02\n";

    fn settings(dir: &Path) -> Settings {
        Settings::resolve(&GeoConfig::default(), dir, None).unwrap()
    }

    #[test]
    fn ingest_legacy_month() {
        let policy = UnpublishedPolicy::builtin();
        let rows = ingest_month(DEC, "2023-12".parse().unwrap(), &policy).unwrap();
        // 2 projects x 2 activity levels
        assert_eq!(rows.len(), 3 + 2 * 2 * 35);
        let synthetic: Vec<&EditorCountRow> = rows[3..].iter().collect();
        assert!(synthetic.iter().all(|r| r.editors == EditorCount::Withheld));
        assert!(synthetic.iter().any(|r| r.country_code == "TH"));
    }

    #[test]
    fn ingest_current_month() {
        let policy = UnpublishedPolicy::builtin();
        let rows = ingest_month(FEB, "2024-02".parse().unwrap(), &policy).unwrap();
        assert_eq!(rows.len(), 1 + 9);
        assert!(!rows.iter().any(|r| r.country_code == "TH"));
    }

    #[test]
    fn update_skips_present_and_continues_after_failures() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(dir.path());
        let fetcher = FakeFetcher {
            months: HashMap::from([
                ("2023-12".to_string(), DEC.to_string()),
                ("2024-02".to_string(), FEB.to_string()),
            ]),
            geojson_status: None,
        };
        let policy = UnpublishedPolicy::builtin();
        let months = YearMonth::range_inclusive("2023-12".parse().unwrap(), "2024-02".parse().unwrap());

        let summary = run_update(&s, &months, &fetcher, &policy).unwrap();
        assert!(summary.geojson_downloaded);
        assert_eq!(summary.downloaded.len(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0.to_string(), "2024-01");
        assert!(s.geojson_path.exists());

        let dec = read_month_file(&month_file_path(&s.data_directory, months[0])).unwrap();
        assert_eq!(dec.len(), 3 + 2 * 2 * 35);

        let again = run_update(&s, &months, &fetcher, &policy).unwrap();
        assert!(!again.geojson_downloaded);
        assert_eq!(again.present.len(), 2);
        assert!(again.downloaded.is_empty());
        assert_eq!(again.failed.len(), 1);

        let js = summary_to_json(&again);
        assert_eq!(js["present"], json!(["2023-12", "2024-02"]));
        assert_eq!(js["failed"][0]["month"], "2024-01");
    }

    #[test]
    fn boundaries_failure_does_not_stop_the_months() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(dir.path());
        let fetcher = FakeFetcher {
            months: HashMap::from([("2024-02".to_string(), FEB.to_string())]),
            geojson_status: Some(503),
        };
        let policy = UnpublishedPolicy::builtin();
        let months: Vec<YearMonth> = vec!["2024-02".parse().unwrap()];

        let summary = run_update(&s, &months, &fetcher, &policy).unwrap();
        assert!(!summary.geojson_downloaded);
        assert!(summary.geojson_error.is_some());
        assert!(!s.geojson_path.exists());
        assert_eq!(summary.downloaded, months);
        assert!(month_file_path(&s.data_directory, months[0]).exists());

        let js = summary_to_json(&summary);
        assert!(js["geojsonError"].as_str().unwrap().contains("503"));
    }
}
