use clap::{Parser, Subcommand};

/// Editors per country for the Wikimedia projects: ingestion of the monthly
/// dataset and generation of the map and trend data.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. For more information about the file format, read the
    /// manual of the editor_risk crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference file in JSON format. If provided, geoeditors will check that the output matches
    /// the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) Where the JSON output is written. Defaults to the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (directory, optional) The directory of the monthly files. Overrides the dataDirectory option of the
    /// configuration.
    #[clap(long, value_parser)]
    pub data_dir: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Downloads the months that are not in the data directory yet.
    Update,
    /// The choropleth of one month, as a GeoJSON feature collection.
    Map {
        /// (YYYY-MM) The month to show. Defaults to the second most recent month.
        #[clap(long, value_parser)]
        month: Option<String>,
        /// The activity level, for example '1 to 4'.
        #[clap(long, value_parser)]
        activity_level: Option<String>,
        /// The project, for example 'en.wikipedia'.
        #[clap(long, value_parser)]
        project: Option<String>,
    },
    /// The editor counts over time of a selection of countries.
    Trends {
        /// (ISO alpha-2 code, repeated) The countries to show.
        #[clap(long, value_parser)]
        countries: Vec<String>,
        /// The activity level, for example '1 to 4'.
        #[clap(long, value_parser)]
        activity_level: Option<String>,
        /// The project, for example 'en.wikipedia'.
        #[clap(long, value_parser)]
        project: Option<String>,
    },
}
