use log::{debug, info, warn};

use editor_risk::policy::UnpublishedPolicy;
use editor_risk::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::{Args, Command};
use crate::dashboard::config_reader::*;
use crate::dashboard::geojson::CountryFeatures;
use crate::dashboard::ingest::HttpFetcher;
use crate::dashboard::source::TsvDirectory;

pub mod config_reader;
pub mod geojson;
pub mod ingest;
pub mod io_common;
pub mod io_tsv;
pub mod map_view;
pub mod source;
pub mod trends_view;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum GeoError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the output"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Invalid GeoJSON in {path}: {message}"))]
    InvalidGeojson { path: String, message: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    TsvRead {
        source: csv::Error,
        path: String,
        lineno: u64,
    },
    #[snafu(display("Line {lineno} of {path} has {found} fields, expected {expected}"))]
    TsvLineTooShort {
        path: String,
        lineno: u64,
        found: usize,
        expected: usize,
    },
    #[snafu(display("Invalid month on line {lineno} of {path}"))]
    TsvMonth {
        source: RiskErrors,
        path: String,
        lineno: u64,
    },
    #[snafu(display("Error writing {path}"))]
    TsvWrite { source: csv::Error, path: String },
    #[snafu(display("Invalid month {value:?}"))]
    InvalidMonth { source: RiskErrors, value: String },
    #[snafu(display("Error downloading {url}"))]
    Download { source: reqwest::Error, url: String },
    #[snafu(display("Downloading {url} failed with status {status}"))]
    DownloadStatus { url: String, status: u16 },
    #[snafu(display(
        "No data found for month={month}, activity_level={activity_level}, project={project}"
    ))]
    NoData {
        month: YearMonth,
        activity_level: String,
        project: String,
    },
    #[snafu(display("No month available before {today}"))]
    NoMonths { today: YearMonth },
    #[snafu(display("Difference detected between the output and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type GeoResult<T> = Result<T, GeoError>;

/// Runs the command passed on the command line.
pub fn run(args: &Args) -> GeoResult<()> {
    let settings = load_settings(args)?;
    info!("settings: {:?}", settings);
    let table = RiskTable::builtin();
    let months = settings.available_months(io_common::current_month())?;
    debug!(
        "run: {} available months: {:?} to {:?}",
        months.len(),
        months.first(),
        months.last()
    );

    match &args.command {
        Command::Update => {
            let policy = UnpublishedPolicy::builtin();
            let fetcher = HttpFetcher::new(&settings.dataset_url, &settings.geojson_url)?;
            let summary = ingest::run_update(&settings, &months, &fetcher, &policy)?;
            info!(
                "Data update process completed: {} downloaded, {} already present, {} failed",
                summary.downloaded.len(),
                summary.present.len(),
                summary.failed.len()
            );
            let js = ingest::summary_to_json(&summary);
            write_output(&js, args.out.clone(), args.reference.clone())
        }
        Command::Map {
            month,
            activity_level,
            project,
        } => {
            let source = TsvDirectory::new(&settings.data_directory, months.clone());
            let features = CountryFeatures::load(&settings.geojson_path)?;
            let request = map_view::MapRequest {
                month: map_view::resolve_month(month.as_deref(), &months)?,
                activity_level: activity_level
                    .clone()
                    .unwrap_or_else(|| settings.default_activity_level.clone()),
                project: project
                    .clone()
                    .unwrap_or_else(|| settings.default_project.clone()),
            };
            let js = map_view::build_map(&source, &table, &features, &request)?;
            write_output(&js, args.out.clone(), args.reference.clone())
        }
        Command::Trends {
            countries,
            activity_level,
            project,
        } => {
            let source = TsvDirectory::new(&settings.data_directory, months);
            let project = project
                .clone()
                .unwrap_or_else(|| settings.default_project.clone());
            let request = trends_view::TrendRequest {
                activity_level: activity_level
                    .clone()
                    .unwrap_or_else(|| settings.default_activity_level.clone()),
                countries: trends_view::default_countries(&project, countries),
                project,
            };
            let js = trends_view::build_trends(&source, &table, &request)?;
            write_output(&js, args.out.clone(), args.reference.clone())
        }
    }
}

fn load_settings(args: &Args) -> GeoResult<Settings> {
    match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            info!("config: {:?}", config);
            let root_p = Path::new(config_path.as_str())
                .parent()
                .unwrap_or_else(|| Path::new("."));
            Settings::resolve(&config, root_p, args.data_dir.as_deref())
        }
        None => Settings::resolve(&GeoConfig::default(), Path::new("."), args.data_dir.as_deref()),
    }
}

/// Writes the output and checks it against the reference, if one is provided.
pub fn write_output(
    js: &JSValue,
    out: Option<String>,
    check_reference_path: Option<String>,
) -> GeoResult<()> {
    let pretty_js = serde_json::to_string_pretty(js).context(SerializingJsonSnafu {})?;
    match out.as_deref() {
        None | Some("stdout") | Some("") => {
            println!("{}", pretty_js);
        }
        Some(path) => {
            info!("Writing output to {:?}", path);
            fs::write(path, &pretty_js).context(WritingFileSnafu { path })?;
        }
    }

    if let Some(reference_p) = check_reference_path {
        check_reference(&pretty_js, &reference_p)?;
    }
    Ok(())
}

fn check_reference(pretty_js: &str, reference_p: &str) -> GeoResult<()> {
    let contents = fs::read_to_string(reference_p).context(OpeningFileSnafu { path: reference_p })?;
    let reference: JSValue =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path: reference_p })?;
    let pretty_reference =
        serde_json::to_string_pretty(&reference).context(SerializingJsonSnafu {})?;
    if pretty_reference != pretty_js {
        warn!("Found differences with the reference file {}", reference_p);
        print_diff(pretty_reference.as_str(), pretty_js, "\n");
        return ReferenceMismatchSnafu { path: reference_p }.fail();
    }
    info!("Output matches the reference {}", reference_p);
    Ok(())
}
