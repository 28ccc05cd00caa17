use editor_risk::display::trend_hover_text;
use log::{debug, info};
use serde_json::{json, Value as JSValue};

use crate::dashboard::source::RowSource;
use crate::dashboard::*;

pub const SELECT_COUNTRIES_MESSAGE: &str = "Select one or more countries to view trends.";
pub const NO_DATA_MESSAGE: &str = "No data available for the selected parameters.";

const DEFAULT_PROJECT_COUNTRIES: [&str; 3] = ["US", "GB", "IN"];
const DEFAULT_COUNTRIES_PROJECT: &str = "en.wikipedia";

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TrendRequest {
    pub activity_level: String,
    pub project: String,
    pub countries: Vec<String>,
}

/// The countries to show when none were selected.
pub fn default_countries(project: &str, selected: &[String]) -> Vec<String> {
    if selected.is_empty() && project == DEFAULT_COUNTRIES_PROJECT {
        DEFAULT_PROJECT_COUNTRIES
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        selected.to_vec()
    }
}

/// One line of the chart.
#[derive(PartialEq, Debug, Clone)]
struct Series {
    name: String,
    country_code: String,
    published: bool,
    months: Vec<String>,
    editors: Vec<i64>,
    hover_text: Vec<String>,
    error_y: f64,
}

impl Series {
    fn new(name: String, country_code: &str, published: bool, error_y: f64) -> Series {
        Series {
            name,
            country_code: country_code.to_string(),
            published,
            months: vec![],
            editors: vec![],
            hover_text: vec![],
            error_y,
        }
    }

    fn to_json(&self) -> JSValue {
        json!({
            "name": self.name,
            "countryCode": self.country_code,
            "kind": if self.published { "published" } else { "unpublished" },
            "months": self.months,
            "editors": self.editors,
            "hoverText": self.hover_text,
            "errorY": self.error_y,
            "showLegend": self.published,
        })
    }
}

/// Splits the rows of one country, ordered by month, into its published and
/// unpublished series. Returns the most recent value with the series.
fn country_series(rows: &[&ClassifiedRow]) -> (i64, Vec<Series>) {
    let (name, code) = match rows.first() {
        Some(c) => (c.row.country.clone(), c.row.country_code.as_str()),
        None => return (0, vec![]),
    };
    let radius = rows[0].confidence_interval;
    let mut published = Series::new(name.clone(), code, true, radius.unwrap_or(0.0));
    let mut unpublished = Series::new(format!("{} (unpublished)", name), code, false, 0.0);
    for c in rows.iter() {
        let month = c.row.month.to_string();
        let hover = trend_hover_text(code, &c.payload(), c.confidence_interval);
        match c.display_editors {
            DisplayEditors::Count(x) => {
                published.months.push(month);
                published.editors.push(x as i64);
                published.hover_text.push(hover);
            }
            DisplayEditors::Withheld(_) => {
                unpublished.months.push(month);
                unpublished.editors.push(0);
                unpublished.hover_text.push(hover);
            }
        }
    }
    let most_recent = rows
        .last()
        .map(|c| c.display_editors.plot_value())
        .unwrap_or(0);
    let res: Vec<Series> = [published, unpublished]
        .into_iter()
        .filter(|s| !s.months.is_empty())
        .collect();
    (most_recent, res)
}

fn trends_json(request: &TrendRequest, countries: &[(String, String)]) -> JSValue {
    let countries_js: Vec<JSValue> = countries
        .iter()
        .map(|(name, code)| json!({"country": name, "country_code": code}))
        .collect();
    json!({
        "title": format!(
            "Editor Count Trends - {} - {} edits",
            request.project, request.activity_level
        ),
        "project": request.project,
        "activityLevel": request.activity_level,
        "countries": countries_js,
        "selectedCountries": request.countries,
        "message": JSValue::Null,
        "series": [],
    })
}

/// The trend chart of the selected countries.
///
/// Each country has up to two series: the published points with the error
/// bar of its level, and the withheld points drawn at zero. The series are
/// ordered by the most recent value of their country, largest first.
pub fn build_trends(
    source: &dyn RowSource,
    table: &RiskTable,
    request: &TrendRequest,
) -> GeoResult<JSValue> {
    let countries = source.countries()?;
    let mut res = trends_json(request, &countries);
    if request.countries.is_empty() {
        res["message"] = json!(SELECT_COUNTRIES_MESSAGE);
        return Ok(res);
    }

    let rows = source.trend_rows(&request.activity_level, &request.project, &request.countries)?;
    if rows.is_empty() {
        info!(
            "build_trends: no rows for activity_level={} project={} countries={:?}",
            request.activity_level, request.project, request.countries
        );
        res["message"] = json!(NO_DATA_MESSAGE);
        return Ok(res);
    }
    let classified = classify_rows(table, &rows);

    // Countries in the order they first appear.
    let mut names: Vec<&str> = Vec::new();
    for c in classified.iter() {
        if !names.contains(&c.row.country.as_str()) {
            names.push(c.row.country.as_str());
        }
    }

    let mut ranked: Vec<(i64, Series)> = Vec::new();
    for name in names.iter() {
        let country_rows: Vec<&ClassifiedRow> = classified
            .iter()
            .filter(|c| c.row.country == *name)
            .collect();
        let (most_recent, series) = country_series(&country_rows);
        debug!(
            "build_trends: {}: most recent {}, {} series",
            name,
            most_recent,
            series.len()
        );
        ranked.extend(series.into_iter().map(|s| (most_recent, s)));
    }
    // Stable: ties keep the order of appearance.
    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    let series_js: Vec<JSValue> = ranked.iter().map(|(_, s)| s.to_json()).collect();
    res["series"] = JSValue::Array(series_js);
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::source::tests::sample_directory;
    use editor_risk::display::WITHHELD_MESSAGE;

    fn request(countries: &[&str]) -> TrendRequest {
        TrendRequest {
            activity_level: "1 to 4".to_string(),
            project: "en.wikipedia".to_string(),
            countries: countries.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn names(js: &JSValue) -> Vec<String> {
        js["series"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn defaults() {
        assert_eq!(default_countries("en.wikipedia", &[]), vec!["US", "GB", "IN"]);
        assert!(default_countries("fr.wikipedia", &[]).is_empty());
        let chosen = vec!["FR".to_string()];
        assert_eq!(default_countries("en.wikipedia", &chosen), vec!["FR"]);
    }

    #[test]
    fn series_are_ordered_by_most_recent_value() {
        let dir = tempfile::tempdir().unwrap();
        let source = sample_directory(dir.path());
        let table = RiskTable::builtin();
        let js = build_trends(&source, &table, &request(&["RU", "IN", "US"])).unwrap();

        assert_eq!(js["title"], "Editor Count Trends - en.wikipedia - 1 to 4 edits");
        assert_eq!(js["message"], JSValue::Null);
        assert_eq!(
            names(&js),
            vec!["United States", "India", "Russia", "Russia (unpublished)"]
        );

        let us = &js["series"][0];
        assert_eq!(us["months"], json!(["2023-12", "2024-02"]));
        assert_eq!(us["editors"], json!([9000, 9500]));
        assert_eq!(us["hoverText"][1], "US: 9,500 ± 2.72");
        assert_eq!(us["errorY"], 2.72);
        assert_eq!(us["showLegend"], true);

        let ru = &js["series"][2];
        assert_eq!(ru["months"], json!(["2024-02"]));
        assert_eq!(ru["hoverText"][0], "RU: 800 ± 29.96");
        let ru_unpublished = &js["series"][3];
        assert_eq!(ru_unpublished["kind"], "unpublished");
        assert_eq!(ru_unpublished["months"], json!(["2023-12"]));
        assert_eq!(ru_unpublished["editors"], json!([0]));
        assert_eq!(ru_unpublished["hoverText"][0], WITHHELD_MESSAGE);
        assert_eq!(ru_unpublished["showLegend"], false);
    }

    #[test]
    fn not_published_country_only_has_an_unpublished_series() {
        let dir = tempfile::tempdir().unwrap();
        let source = sample_directory(dir.path());
        let table = RiskTable::builtin();
        let js = build_trends(&source, &table, &request(&["CN", "IN"])).unwrap();
        assert_eq!(names(&js), vec!["India", "China (unpublished)"]);
        assert_eq!(js["series"][1]["editors"], json!([0]));
    }

    #[test]
    fn non_numeric_editors_are_unpublished() {
        let dir = tempfile::tempdir().unwrap();
        let source = sample_directory(dir.path());
        let table = RiskTable::builtin();
        let js = build_trends(&source, &table, &request(&["DE", "US"])).unwrap();
        assert_eq!(names(&js), vec!["United States", "Germany (unpublished)"]);
        let de = &js["series"][1];
        assert_eq!(de["kind"], "unpublished");
        assert_eq!(de["months"], json!(["2024-02"]));
        assert_eq!(de["editors"], json!([0]));
        assert_eq!(de["hoverText"][0], WITHHELD_MESSAGE);
        assert_eq!(de["showLegend"], false);
    }

    #[test]
    fn messages() {
        let dir = tempfile::tempdir().unwrap();
        let source = sample_directory(dir.path());
        let table = RiskTable::builtin();

        let js = build_trends(&source, &table, &request(&[])).unwrap();
        assert_eq!(js["message"], SELECT_COUNTRIES_MESSAGE);
        assert_eq!(js["series"], json!([]));
        assert_eq!(js["countries"].as_array().unwrap().len(), 6);
        assert_eq!(js["countries"][0]["country_code"], "CN");

        let js = build_trends(&source, &table, &request(&["GB"])).unwrap();
        assert_eq!(js["message"], NO_DATA_MESSAGE);
        assert_eq!(js["selectedCountries"], json!(["GB"]));
    }
}
