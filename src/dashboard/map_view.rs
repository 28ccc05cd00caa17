use editor_risk::color::{LogColorScale, GRADIENT};
use editor_risk::country_codes::alpha2_to_alpha3;
use log::{debug, warn};
use serde_json::{json, Map as JSMap, Value as JSValue};
use snafu::prelude::*;

use crate::dashboard::geojson::CountryFeatures;
use crate::dashboard::source::RowSource;
use crate::dashboard::*;

/// The number of ticks of the legend.
const LEGEND_TICKS: usize = 6;

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MapRequest {
    pub month: YearMonth,
    pub activity_level: String,
    pub project: String,
}

/// The month to show. A missing or unknown month falls back to the second
/// most recent month: the current month is usually not published yet.
pub fn resolve_month(requested: Option<&str>, months: &[YearMonth]) -> GeoResult<YearMonth> {
    if let Some(s) = requested {
        match s.parse::<YearMonth>() {
            Ok(m) if months.contains(&m) => return Ok(m),
            _ => warn!("resolve_month: month {:?} not available, using the default", s),
        }
    }
    let idx = months.len().saturating_sub(2);
    months
        .get(idx)
        .cloned()
        .whatever_context("No month available")
}

fn editors_value(d: &DisplayEditors, raw: &EditorCount) -> JSValue {
    match (d, raw) {
        (DisplayEditors::Count(x), _) => json!(x),
        // The value is gone, not withheld: keep the distinction visible.
        (DisplayEditors::Withheld(WithheldReason::NonNumeric), EditorCount::Missing) => JSValue::Null,
        (DisplayEditors::Withheld(_), _) => json!(EditorCount::WITHHELD_SENTINEL),
    }
}

/// The choropleth of one month, as a GeoJSON feature collection.
///
/// Each feature of a country with a row gets the properties `name`, `editors`,
/// `hover_text`, `risk_level` and `style`. The countries without a boundary
/// are left out.
pub fn build_map(
    source: &dyn RowSource,
    table: &RiskTable,
    features: &CountryFeatures,
    request: &MapRequest,
) -> GeoResult<JSValue> {
    let rows = source.month_rows(request.month, &request.activity_level, &request.project)?;
    if rows.is_empty() {
        warn!(
            "No data found for month={}, activity_level={}, project={}",
            request.month, request.activity_level, request.project
        );
        return NoDataSnafu {
            month: request.month,
            activity_level: request.activity_level.clone(),
            project: request.project.clone(),
        }
        .fail();
    }

    let classified = classify_rows(table, &rows);
    let scale = LogColorScale::for_counts(classified.iter().map(|c| &c.display_editors));

    let mut out_features: Vec<JSValue> = Vec::new();
    for c in classified.iter() {
        let alpha3 = match alpha2_to_alpha3(&c.row.country_code) {
            Some(x) => x,
            None => {
                debug!(
                    "build_map: no alpha-3 code for {:?} ({})",
                    c.row.country_code, c.row.country
                );
                continue;
            }
        };
        let mut feature = match features.get(alpha3) {
            Some(f) => f.clone(),
            None => {
                debug!("build_map: no boundary for {} ({})", alpha3, c.row.country);
                continue;
            }
        };
        let hover_text = c.payload().map_tooltip(&c.row.country);
        let style = json!({
            "fillColor": scale.color(&c.display_editors),
            "color": scale.outline(&c.display_editors),
            "weight": 1,
            "fillOpacity": 0.7,
        });

        let mut properties: JSMap<String, JSValue> = feature
            .get("properties")
            .and_then(|p| p.as_object())
            .cloned()
            .unwrap_or_default();
        properties.insert("name".to_string(), json!(c.row.country));
        properties.insert(
            "editors".to_string(),
            editors_value(&c.display_editors, &c.row.editors),
        );
        properties.insert("hover_text".to_string(), json!(hover_text));
        properties.insert("risk_level".to_string(), json!(c.risk_level.as_str()));
        properties.insert("style".to_string(), style);
        feature["properties"] = JSValue::Object(properties);
        out_features.push(feature);
    }
    debug!(
        "build_map: {} rows, {} features, scale max {}",
        classified.len(),
        out_features.len(),
        scale.max_editors()
    );

    Ok(json!({
        "type": "FeatureCollection",
        "title": format!(
            "Editor Activity Map - {} - {} edits - {}",
            request.project, request.activity_level, request.month
        ),
        "month": request.month.to_string(),
        "activityLevel": request.activity_level,
        "project": request.project,
        "legend": {
            "title": "Number of Editors",
            "min": scale.min_editors(),
            "max": scale.max_editors(),
            "colors": GRADIENT,
            "ticks": scale.ticks(LEGEND_TICKS),
            "withheldColor": editor_risk::color::WITHHELD_COLOR,
            "withheldLabel": "Dark grey countries: data not published for safety reasons",
        },
        "features": out_features,
    }))
}
