use std::collections::HashMap;

use log::debug;

use crate::config::*;

/// The placeholder used by the dataset when the country could not be determined.
pub const UNKNOWN_COUNTRY_CODE: &str = "--";

pub const MEDIUM_RISK_CODES: [&str; 20] = [
    "AF", // Afghanistan
    "AZ", // Azerbaijan
    "BD", // Bangladesh
    "DJ", // Djibouti
    "ET", // Ethiopia
    "HN", // Honduras
    "IQ", // Iraq
    "KZ", // Kazakhstan
    "KW", // Kuwait
    "LA", // Laos
    "NI", // Nicaragua
    "OM", // Oman
    "PK", // Pakistan
    "PS", // Palestine
    "SD", // Sudan
    "TJ", // Tajikistan
    "AE", // United Arab Emirates
    "UZ", // Uzbekistan
    "VE", // Venezuela
    "YE", // Yemen
];

pub const HIGH_RISK_CODES: [&str; 8] = [
    "BH", // Bahrain
    "BY", // Belarus
    "EG", // Egypt
    "ER", // Eritrea
    "RU", // Russia
    "SA", // Saudi Arabia
    "TR", // Türkiye
    "TM", // Turkmenistan
];

pub const NOT_PUBLISHED_CODES: [&str; 9] = [
    "CN", // China
    "HK", // Hong Kong
    "CU", // Cuba
    "IR", // Iran
    "MO", // Macau
    "MM", // Myanmar
    "KP", // North Korea
    "SY", // Syria
    "VN", // Vietnam
];

/// True for the codes that do not identify a country.
pub fn is_unknown_code(code: &str) -> bool {
    let c = code.trim();
    c.is_empty() || c == UNKNOWN_COUNTRY_CODE
}

/// The frozen risk classification of country codes.
///
/// It is built once and then only read: it can be shared freely between
/// threads.
///
/// ```
/// use editor_risk::{RiskLevel, RiskTable};
///
/// let table = RiskTable::builtin();
/// assert_eq!(table.classify("RU"), RiskLevel::High);
/// assert_eq!(table.classify("FR"), RiskLevel::Low);
/// assert_eq!(table.classify("--"), RiskLevel::NotPublished);
/// assert_eq!(table.info(RiskLevel::Medium).ci_radius, Some(14.98));
/// ```
#[derive(Debug, Clone)]
pub struct RiskTable {
    levels: HashMap<String, RiskLevel>,
    infos: HashMap<RiskLevel, RiskInfo>,
}

impl RiskTable {
    pub const LOW_INFO: RiskInfo = RiskInfo {
        ci_radius: Some(2.72),
        can_show_edits: true,
    };
    pub const MEDIUM_INFO: RiskInfo = RiskInfo {
        ci_radius: Some(14.98),
        can_show_edits: false,
    };
    pub const HIGH_INFO: RiskInfo = RiskInfo {
        ci_radius: Some(29.96),
        can_show_edits: false,
    };
    pub const NOT_PUBLISHED_INFO: RiskInfo = RiskInfo {
        ci_radius: None,
        can_show_edits: false,
    };

    /// Builds a table out of the three explicit sets. All the other codes are
    /// low risk. The sets must not overlap.
    ///
    /// The radius of `NotPublished` is always dropped, whatever `infos` says.
    pub fn new(
        medium: &[&str],
        high: &[&str],
        not_published: &[&str],
        infos: &[(RiskLevel, RiskInfo)],
    ) -> Result<RiskTable, RiskErrors> {
        let mut levels: HashMap<String, RiskLevel> = HashMap::new();
        for (level, codes) in [
            (RiskLevel::Medium, medium),
            (RiskLevel::High, high),
            (RiskLevel::NotPublished, not_published),
        ] {
            for code in codes.iter() {
                if let Some(first) = levels.insert(code.to_string(), level) {
                    if first != level {
                        return Err(RiskErrors::OverlappingRiskSets {
                            code: code.to_string(),
                            first,
                            second: level,
                        });
                    }
                }
            }
        }

        let mut all_infos: HashMap<RiskLevel, RiskInfo> = Self::builtin_infos();
        for (level, info) in infos.iter() {
            all_infos.insert(*level, *info);
        }
        let not_published_info = RiskInfo {
            ci_radius: None,
            ..all_infos[&RiskLevel::NotPublished]
        };
        all_infos.insert(RiskLevel::NotPublished, not_published_info);

        debug!(
            "RiskTable::new: {} classified codes, infos: {:?}",
            levels.len(),
            all_infos
        );
        Ok(RiskTable {
            levels,
            infos: all_infos,
        })
    }

    /// The table currently used for the published dataset.
    pub fn builtin() -> RiskTable {
        let mut levels: HashMap<String, RiskLevel> = HashMap::new();
        for code in MEDIUM_RISK_CODES {
            levels.insert(code.to_string(), RiskLevel::Medium);
        }
        for code in HIGH_RISK_CODES {
            levels.insert(code.to_string(), RiskLevel::High);
        }
        for code in NOT_PUBLISHED_CODES {
            levels.insert(code.to_string(), RiskLevel::NotPublished);
        }
        RiskTable {
            levels,
            infos: Self::builtin_infos(),
        }
    }

    fn builtin_infos() -> HashMap<RiskLevel, RiskInfo> {
        HashMap::from([
            (RiskLevel::Low, Self::LOW_INFO),
            (RiskLevel::Medium, Self::MEDIUM_INFO),
            (RiskLevel::High, Self::HIGH_INFO),
            (RiskLevel::NotPublished, Self::NOT_PUBLISHED_INFO),
        ])
    }

    /// Total over all strings: unknown codes are not published, and codes
    /// absent from every set are low risk.
    pub fn classify(&self, country_code: &str) -> RiskLevel {
        if is_unknown_code(country_code) {
            return RiskLevel::NotPublished;
        }
        self.levels
            .get(country_code)
            .cloned()
            .unwrap_or(RiskLevel::Low)
    }

    pub fn info(&self, level: RiskLevel) -> RiskInfo {
        // Every level is filled in at construction.
        self.infos
            .get(&level)
            .cloned()
            .unwrap_or(Self::NOT_PUBLISHED_INFO)
    }
}

impl Default for RiskTable {
    fn default() -> Self {
        RiskTable::builtin()
    }
}
