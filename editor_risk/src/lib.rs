/*!
Risk classification and redaction of the Wikipedia editor counts per country.

The published geoeditors dataset counts, for every country, project, month
and activity level, the number of active editors. Before any of these counts
is shown, it goes through the function of this crate:

* every country code is assigned a [`RiskLevel`] by a frozen [`RiskTable`],
* the counts of the `not_published` countries, and the counts the source
  already marked as withheld (`-1`), are never displayed,
* the other counts are displayed with a fixed confidence interval per level.

The [`policy`] module holds the list of countries withheld over time, which is
used when ingesting a month. The [`color`] module maps displayed counts to the
colors of a choropleth map.

```
use editor_risk::*;

let table = RiskTable::builtin();
let row = EditorCountRow {
    wiki_db: "en".to_string(),
    project: "en.wikipedia".to_string(),
    country: "Pakistan".to_string(),
    country_code: "PK".to_string(),
    activity_level: "1 to 4".to_string(),
    count_eps: None,
    sum_eps: None,
    count_release_thresh: None,
    editors: EditorCount::Count(1000),
    edits: None,
    month: "2024-02".parse()?,
};
let classified = classify_row(&table, &row);
assert_eq!(classified.risk_level, RiskLevel::Medium);
assert_eq!(classified.confidence_interval, Some(14.98));

let payload = format_for_display(&table, &row, classified.risk_level);
assert_eq!(payload.map_tooltip(&row.country),
    "<b>Pakistan</b><br>Editors: 1,000<br>95% CI: 985 to 1,014<br>");
# Ok::<(), RiskErrors>(())
```
*/

mod config;
pub mod color;
pub mod country_codes;
pub mod display;
pub mod manual;
pub mod policy;
mod risk_table;

use log::{debug, warn};

pub use crate::config::*;
pub use crate::display::{ConfidenceRange, DisplayPayload};
pub use crate::risk_table::*;

/// The risk level of a country code. See [`RiskTable::classify`].
pub fn classify(table: &RiskTable, country_code: &str) -> RiskLevel {
    table.classify(country_code)
}

/// Classifies one row and computes the value that is safe to display.
///
/// The input row is left untouched and copied into the result.
pub fn classify_row(table: &RiskTable, row: &EditorCountRow) -> ClassifiedRow {
    let risk_level = table.classify(&row.country_code);
    let display_editors = match (risk_level, row.editors) {
        (RiskLevel::NotPublished, _) => DisplayEditors::Withheld(WithheldReason::CountryPolicy),
        (_, EditorCount::Withheld) => {
            debug!(
                "classify_row: {} {} {}: withheld in source",
                row.month, row.country_code, row.activity_level
            );
            DisplayEditors::Withheld(WithheldReason::SourceSentinel)
        }
        (_, EditorCount::Missing) => {
            warn!(
                "classify_row: {} {} {}: editors value is not a number, treating it as withheld",
                row.month, row.country_code, row.activity_level
            );
            DisplayEditors::Withheld(WithheldReason::NonNumeric)
        }
        (_, EditorCount::Count(x)) => DisplayEditors::Count(x),
    };
    let confidence_interval = match risk_level {
        RiskLevel::NotPublished => None,
        level => table.info(level).ci_radius,
    };
    ClassifiedRow {
        row: row.clone(),
        risk_level,
        display_editors,
        confidence_interval,
    }
}

pub fn classify_rows(table: &RiskTable, rows: &[EditorCountRow]) -> Vec<ClassifiedRow> {
    rows.iter().map(|r| classify_row(table, r)).collect()
}

/// What can be shown for a row at the given risk level.
///
/// Not published countries and withheld or non-numeric counts produce
/// [`DisplayPayload::Withheld`]; everything else shows the count, with its
/// confidence range when the level has one.
pub fn format_for_display(
    table: &RiskTable,
    row: &EditorCountRow,
    risk_level: RiskLevel,
) -> DisplayPayload {
    if risk_level == RiskLevel::NotPublished {
        return DisplayPayload::Withheld;
    }
    match row.editors {
        EditorCount::Count(editors) => DisplayPayload::Published {
            editors,
            interval: table
                .info(risk_level)
                .ci_radius
                .map(|r| display::confidence_range(editors, r)),
        },
        EditorCount::Withheld | EditorCount::Missing => DisplayPayload::Withheld,
    }
}

impl ClassifiedRow {
    /// The display payload of this row.
    pub fn payload(&self) -> DisplayPayload {
        match self.display_editors {
            DisplayEditors::Withheld(_) => DisplayPayload::Withheld,
            DisplayEditors::Count(editors) => DisplayPayload::Published {
                editors,
                interval: self
                    .confidence_interval
                    .map(|r| display::confidence_range(editors, r)),
            },
        }
    }
}
