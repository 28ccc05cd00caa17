// Display payloads for the editor counts.

pub const WITHHELD_MESSAGE: &str = "Data not published for safety reasons";

/// The range shown around a published count.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ConfidenceRange {
    pub lower: u64,
    pub upper: u64,
}

/// Computes the display range of a count. Both bounds are truncated and the
/// lower bound never goes below zero.
pub fn confidence_range(editors: u64, radius: f64) -> ConfidenceRange {
    let e = editors as f64;
    let lower = (e - radius).trunc().max(0.0) as u64;
    let upper = (e + radius).trunc().max(0.0) as u64;
    ConfidenceRange { lower, upper }
}

/// What can be shown for one row.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum DisplayPayload {
    Withheld,
    Published {
        editors: u64,
        interval: Option<ConfidenceRange>,
    },
}

impl DisplayPayload {
    pub fn is_withheld(&self) -> bool {
        matches!(self, DisplayPayload::Withheld)
    }

    /// The body of the map tooltip, without the country name.
    pub fn summary(&self) -> String {
        match self {
            DisplayPayload::Withheld => WITHHELD_MESSAGE.to_string(),
            DisplayPayload::Published { editors, interval } => {
                let mut s = format!("Editors: {}<br>", group_thousands(*editors));
                if let Some(ci) = interval {
                    s.push_str(&format!(
                        "95% CI: {} to {}<br>",
                        group_thousands(ci.lower),
                        group_thousands(ci.upper)
                    ));
                }
                s
            }
        }
    }

    /// The full map tooltip for a country.
    pub fn map_tooltip(&self, country: &str) -> String {
        format!("<b>{}</b><br>{}", country, self.summary())
    }
}

/// The hover text of one point on a trend line.
pub fn trend_hover_text(country_code: &str, payload: &DisplayPayload, radius: Option<f64>) -> String {
    match (payload, radius) {
        (DisplayPayload::Withheld, _) => WITHHELD_MESSAGE.to_string(),
        (DisplayPayload::Published { editors, .. }, Some(r)) => {
            format!("{}: {} ± {}", country_code, group_thousands(*editors), r)
        }
        (DisplayPayload::Published { editors, .. }, None) => {
            format!("{}: {}", country_code, group_thousands(*editors))
        }
    }
}

/// Formats an integer with `,` between groups of three digits.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut res = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            res.push(',');
        }
        res.push(c);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(123456), "123,456");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn medium_interval_is_truncated() {
        assert_eq!(
            confidence_range(1000, 14.98),
            ConfidenceRange {
                lower: 985,
                upper: 1014
            }
        );
    }

    #[test]
    fn lower_bound_clamps_at_zero() {
        assert_eq!(confidence_range(2, 2.72).lower, 0);
        assert_eq!(confidence_range(0, 29.96).lower, 0);
        assert_eq!(confidence_range(2, 2.72).upper, 4);
    }

    #[test]
    fn tooltip() {
        let p = DisplayPayload::Published {
            editors: 12345,
            interval: Some(confidence_range(12345, 2.72)),
        };
        assert_eq!(
            p.map_tooltip("France"),
            "<b>France</b><br>Editors: 12,345<br>95% CI: 12,342 to 12,347<br>"
        );
        assert_eq!(
            DisplayPayload::Withheld.map_tooltip("Cuba"),
            "<b>Cuba</b><br>Data not published for safety reasons"
        );
    }

    #[test]
    fn trend_hover() {
        let p = DisplayPayload::Published {
            editors: 1500,
            interval: None,
        };
        assert_eq!(trend_hover_text("US", &p, Some(2.72)), "US: 1,500 ± 2.72");
        assert_eq!(
            trend_hover_text("US", &DisplayPayload::Withheld, Some(2.72)),
            WITHHELD_MESSAGE
        );
    }
}
