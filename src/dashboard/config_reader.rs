use crate::dashboard::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_DATA_DIRECTORY: &str = "data";
pub const DEFAULT_DATASET_URL: &str =
    "https://analytics.wikimedia.org/published/datasets/geoeditors_monthly";
pub const DEFAULT_GEOJSON_URL: &str =
    "https://raw.githubusercontent.com/python-visualization/folium/master/examples/data/world-countries.json";
pub const DEFAULT_GEOJSON_FILE: &str = "countries.geojson";
pub const DEFAULT_FIRST_MONTH: &str = "2023-07";
pub const DEFAULT_PROJECT: &str = "en.wikipedia";
pub const DEFAULT_ACTIVITY_LEVEL: &str = "1 to 4";

/// The configuration file, as written by the user. All the fields are
/// optional.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoConfig {
    #[serde(rename = "dataDirectory")]
    pub data_directory: Option<String>,
    #[serde(rename = "datasetUrl")]
    pub dataset_url: Option<String>,
    #[serde(rename = "geojsonUrl")]
    pub geojson_url: Option<String>,
    /// Relative to the data directory.
    #[serde(rename = "geojsonFile")]
    pub geojson_file: Option<String>,
    #[serde(rename = "firstMonth")]
    pub first_month: Option<String>,
    #[serde(rename = "defaultProject")]
    pub default_project: Option<String>,
    #[serde(rename = "defaultActivityLevel")]
    pub default_activity_level: Option<String>,
}

/// The configuration with all the defaults filled in and the paths resolved.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub data_directory: PathBuf,
    pub dataset_url: String,
    pub geojson_url: String,
    pub geojson_path: PathBuf,
    pub first_month: YearMonth,
    pub default_project: String,
    pub default_activity_level: String,
}

impl Settings {
    /// Relative paths are resolved against `root_p`, the directory of the
    /// configuration file. A data directory passed on the command line is
    /// taken as is.
    pub fn resolve(
        config: &GeoConfig,
        root_p: &Path,
        data_dir_override: Option<&str>,
    ) -> GeoResult<Settings> {
        let data_directory: PathBuf = match data_dir_override {
            Some(d) => PathBuf::from(d),
            None => root_p.join(
                config
                    .data_directory
                    .as_deref()
                    .unwrap_or(DEFAULT_DATA_DIRECTORY),
            ),
        };
        let geojson_path = data_directory.join(
            config
                .geojson_file
                .as_deref()
                .unwrap_or(DEFAULT_GEOJSON_FILE),
        );
        let first_month_s = config
            .first_month
            .clone()
            .unwrap_or_else(|| DEFAULT_FIRST_MONTH.to_string());
        let first_month = first_month_s
            .parse::<YearMonth>()
            .context(InvalidMonthSnafu {
                value: first_month_s.clone(),
            })?;
        Ok(Settings {
            data_directory,
            dataset_url: config
                .dataset_url
                .clone()
                .unwrap_or_else(|| DEFAULT_DATASET_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            geojson_url: config
                .geojson_url
                .clone()
                .unwrap_or_else(|| DEFAULT_GEOJSON_URL.to_string()),
            geojson_path,
            first_month,
            default_project: config
                .default_project
                .clone()
                .unwrap_or_else(|| DEFAULT_PROJECT.to_string()),
            default_activity_level: config
                .default_activity_level
                .clone()
                .unwrap_or_else(|| DEFAULT_ACTIVITY_LEVEL.to_string()),
        })
    }

    /// The months from the first configured month up to `today` included.
    pub fn available_months(&self, today: YearMonth) -> GeoResult<Vec<YearMonth>> {
        let months = io_common::available_months(self.first_month, today);
        if months.is_empty() {
            return NoMonthsSnafu { today }.fail();
        }
        Ok(months)
    }
}

pub fn read_config(path: &str) -> GeoResult<GeoConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: GeoConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}
