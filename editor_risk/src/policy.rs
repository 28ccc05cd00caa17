use std::collections::HashSet;

use log::{debug, info};

use crate::config::*;

/// A country withheld from publication.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct WithheldCountry {
    pub name: String,
    pub code: String,
}

/// The withheld countries in effect from a given month on.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PolicyEpoch {
    /// `None` covers all the months before the first dated epoch.
    pub effective_from: Option<YearMonth>,
    pub countries: Vec<WithheldCountry>,
}

/// The month the published list of withheld countries was last changed.
pub const CURRENT_CUTOVER: YearMonth = YearMonth::new_unchecked(2024, 1);

/// Countries withheld before [`CURRENT_CUTOVER`].
pub const LEGACY_UNPUBLISHED: [(&str, &str); 35] = [
    ("Afghanistan", "AF"),
    ("Azerbaijan", "AZ"),
    ("Bahrain", "BH"),
    ("Bangladesh", "BD"),
    ("Belarus", "BY"),
    ("China", "CN"),
    ("Cuba", "CU"),
    ("Djibouti", "DJ"),
    ("Egypt", "EG"),
    ("Eritrea", "ER"),
    ("Ethiopia", "ET"),
    ("Honduras", "HN"),
    ("Iran", "IR"),
    ("Iraq", "IQ"),
    ("Kazakhstan", "KZ"),
    ("Kuwait", "KW"),
    ("Laos", "LA"),
    ("Myanmar", "MM"),
    ("Nicaragua", "NI"),
    ("North Korea", "KP"),
    ("Oman", "OM"),
    ("Pakistan", "PK"),
    ("Russia", "RU"),
    ("Rwanda", "RW"),
    ("Saudi Arabia", "SA"),
    ("Sudan", "SD"),
    ("Syria", "SY"),
    ("Thailand", "TH"),
    ("Turkey", "TR"),
    ("Turkmenistan", "TM"),
    ("United Arab Emirates", "AE"),
    ("Uzbekistan", "UZ"),
    ("Venezuela", "VE"),
    ("Vietnam", "VN"),
    ("Yemen", "YE"),
];

/// Countries withheld from [`CURRENT_CUTOVER`] on.
pub const CURRENT_UNPUBLISHED: [(&str, &str); 9] = [
    ("China", "CN"),
    ("Hong Kong", "HK"),
    ("Cuba", "CU"),
    ("Iran", "IR"),
    ("Macau", "MO"),
    ("Myanmar", "MM"),
    ("North Korea", "KP"),
    ("Syria", "SY"),
    ("Vietnam", "VN"),
];

fn to_countries(l: &[(&str, &str)]) -> Vec<WithheldCountry> {
    l.iter()
        .map(|(name, code)| WithheldCountry {
            name: name.to_string(),
            code: code.to_string(),
        })
        .collect()
}

/// The list of withheld countries over time.
///
/// The source dataset simply omits the withheld countries. During ingestion
/// they are added back as explicit withheld rows, so that the map and the
/// trends can show them as such.
///
/// ```
/// use editor_risk::policy::UnpublishedPolicy;
/// use editor_risk::YearMonth;
///
/// let policy = UnpublishedPolicy::builtin();
/// let before: YearMonth = "2023-12".parse()?;
/// let after: YearMonth = "2024-01".parse()?;
/// assert_eq!(policy.withheld_for(before).len(), 35);
/// assert_eq!(policy.withheld_for(after).len(), 9);
/// # Ok::<(), editor_risk::RiskErrors>(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct UnpublishedPolicy {
    // Sorted by start, the undated epoch first.
    epochs: Vec<PolicyEpoch>,
}

impl UnpublishedPolicy {
    pub fn new(epochs: Vec<PolicyEpoch>) -> UnpublishedPolicy {
        let mut epochs = epochs;
        // None sorts before any Some.
        epochs.sort_by_key(|e| e.effective_from);
        UnpublishedPolicy { epochs }
    }

    pub fn builtin() -> UnpublishedPolicy {
        UnpublishedPolicy::new(vec![
            PolicyEpoch {
                effective_from: None,
                countries: to_countries(&LEGACY_UNPUBLISHED),
            },
            PolicyEpoch {
                effective_from: Some(CURRENT_CUTOVER),
                countries: to_countries(&CURRENT_UNPUBLISHED),
            },
        ])
    }

    /// The epoch with the latest start at or before `month`.
    pub fn epoch_for(&self, month: YearMonth) -> Option<&PolicyEpoch> {
        self.epochs
            .iter()
            .rev()
            .find(|e| e.effective_from.map(|start| start <= month).unwrap_or(true))
    }

    /// The countries withheld for `month`. Empty if no epoch covers it.
    pub fn withheld_for(&self, month: YearMonth) -> &[WithheldCountry] {
        self.epoch_for(month)
            .map(|e| e.countries.as_slice())
            .unwrap_or(&[])
    }

    /// The withheld rows to add to the organic rows of `month`.
    ///
    /// One row per withheld country, per project and per activity level of
    /// the organic data, skipping the combinations for which the country
    /// already has an organic row. Projects and levels keep their order of
    /// first appearance.
    pub fn synthesize(&self, organic: &[EditorCountRow], month: YearMonth) -> Vec<EditorCountRow> {
        let mut projects: Vec<&str> = Vec::new();
        let mut levels: Vec<&str> = Vec::new();
        let mut present: HashSet<(&str, &str, &str)> = HashSet::new();
        for r in organic.iter() {
            if !projects.contains(&r.project.as_str()) {
                projects.push(r.project.as_str());
            }
            if !levels.contains(&r.activity_level.as_str()) {
                levels.push(r.activity_level.as_str());
            }
            present.insert((
                r.country_code.as_str(),
                r.project.as_str(),
                r.activity_level.as_str(),
            ));
        }

        let withheld = self.withheld_for(month);
        let mut res: Vec<EditorCountRow> = Vec::new();
        for country in withheld.iter() {
            for project in projects.iter() {
                for activity_level in levels.iter() {
                    if present.contains(&(country.code.as_str(), *project, *activity_level)) {
                        debug!(
                            "synthesize: {} has an organic row for {} {}, skipping",
                            country.code, project, activity_level
                        );
                        continue;
                    }
                    res.push(withheld_row(country, project, activity_level, month));
                }
            }
        }
        info!(
            "synthesize: month {}: {} withheld countries x {} projects x {} activity levels -> {} rows",
            month,
            withheld.len(),
            projects.len(),
            levels.len(),
            res.len()
        );
        res
    }

    /// The organic rows followed by the synthesized ones.
    pub fn apply(&self, organic: Vec<EditorCountRow>, month: YearMonth) -> Vec<EditorCountRow> {
        let synthetic = self.synthesize(&organic, month);
        let mut res = organic;
        res.extend(synthetic);
        res
    }
}

impl Default for UnpublishedPolicy {
    fn default() -> Self {
        UnpublishedPolicy::builtin()
    }
}

fn withheld_row(
    country: &WithheldCountry,
    project: &str,
    activity_level: &str,
    month: YearMonth,
) -> EditorCountRow {
    let wiki_db = project.split('.').next().unwrap_or(project);
    EditorCountRow {
        wiki_db: wiki_db.to_string(),
        project: project.to_string(),
        country: country.name.clone(),
        country_code: country.code.clone(),
        activity_level: activity_level.to_string(),
        count_eps: Some(0),
        sum_eps: Some(0.0),
        count_release_thresh: Some(0),
        editors: EditorCount::Withheld,
        edits: Some(0),
        month,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn row(code: &str, project: &str, activity_level: &str, editors: u64, month: &str) -> EditorCountRow {
        EditorCountRow {
            wiki_db: project.split('.').next().unwrap().to_string(),
            project: project.to_string(),
            country: format!("Country {}", code),
            country_code: code.to_string(),
            activity_level: activity_level.to_string(),
            count_eps: Some(1),
            sum_eps: Some(0.5),
            count_release_thresh: Some(1),
            editors: EditorCount::Count(editors),
            edits: Some(editors * 3),
            month: ym(month),
        }
    }

    #[test]
    fn epoch_selection() {
        let policy = UnpublishedPolicy::builtin();
        assert_eq!(policy.withheld_for(ym("2023-07")).len(), 35);
        assert_eq!(policy.withheld_for(ym("2023-12")).len(), 35);
        assert_eq!(policy.withheld_for(ym("2024-01")).len(), 9);
        assert_eq!(policy.withheld_for(ym("2031-05")).len(), 9);
        assert_eq!(policy.withheld_for(ym("1999-01")).len(), 35);
    }

    #[test]
    fn additional_epochs() {
        let policy = UnpublishedPolicy::new(vec![
            PolicyEpoch {
                effective_from: Some(ym("2026-01")),
                countries: to_countries(&[("Cuba", "CU")]),
            },
            PolicyEpoch {
                effective_from: Some(ym("2024-01")),
                countries: to_countries(&CURRENT_UNPUBLISHED),
            },
        ]);
        assert!(policy.withheld_for(ym("2023-12")).is_empty());
        assert_eq!(policy.withheld_for(ym("2025-12")).len(), 9);
        assert_eq!(policy.withheld_for(ym("2026-01")).len(), 1);
    }

    #[test]
    fn legacy_month_synthesis() {
        let policy = UnpublishedPolicy::builtin();
        let organic = vec![
            row("US", "en.wikipedia", "1 to 4", 5000, "2023-08"),
            row("FR", "fr.wikipedia", "1 to 4", 900, "2023-08"),
            row("US", "en.wikipedia", "5 to 99", 1200, "2023-08"),
            // An organic row for a withheld country.
            row("RU", "en.wikipedia", "1 to 4", 100, "2023-08"),
        ];
        let synthetic = policy.synthesize(&organic, ym("2023-08"));
        // 2 projects x 2 levels x 35 countries, minus the combination
        // already present.
        assert_eq!(synthetic.len(), 4 * 35 - 1);
        // fr.wikipedia has no organic "5 to 99" row but still gets one.
        assert!(synthetic
            .iter()
            .any(|r| r.country_code == "TH" && r.project == "fr.wikipedia" && r.activity_level == "5 to 99"));
        assert!(synthetic.iter().all(|r| r.editors == EditorCount::Withheld));
        assert!(synthetic.iter().all(|r| r.edits == Some(0)));
        assert!(synthetic.iter().all(|r| r.month == ym("2023-08")));
        assert!(!synthetic
            .iter()
            .any(|r| r.country_code == "RU" && r.project == "en.wikipedia" && r.activity_level == "1 to 4"));

        let mut combos: HashSet<(String, String, String)> = HashSet::new();
        for r in synthetic.iter() {
            assert!(combos.insert((
                r.country_code.clone(),
                r.project.clone(),
                r.activity_level.clone()
            )));
        }
    }

    #[test]
    fn current_month_synthesis() {
        let policy = UnpublishedPolicy::builtin();
        let organic = vec![
            row("US", "en.wikipedia", "1 to 4", 5000, "2024-03"),
            row("DE", "de.wikipedia", "100 or more", 70, "2024-03"),
        ];
        let all = policy.apply(organic.clone(), ym("2024-03"));
        assert_eq!(all.len(), 2 + 2 * 2 * 9);
        assert_eq!(&all[..2], organic.as_slice());
        let cn: Vec<&EditorCountRow> = all.iter().filter(|r| r.country_code == "CN").collect();
        assert_eq!(cn.len(), 4);
        assert_eq!(cn[0].wiki_db, "en");
        assert_eq!(cn[0].project, "en.wikipedia");
        assert_eq!(cn[0].activity_level, "1 to 4");
        assert_eq!(cn[0].country, "China");
        assert_eq!(cn[1].project, "en.wikipedia");
        assert_eq!(cn[1].activity_level, "100 or more");
        assert_eq!(cn[2].wiki_db, "de");
        assert_eq!(cn[2].activity_level, "1 to 4");
        assert_eq!(cn[3].count_eps, Some(0));
        assert_eq!(cn[3].sum_eps, Some(0.0));
        assert_eq!(cn[3].count_release_thresh, Some(0));
    }

    #[test]
    fn empty_month_has_nothing_to_synthesize() {
        let policy = UnpublishedPolicy::builtin();
        assert!(policy.synthesize(&[], ym("2024-03")).is_empty());
    }
}
