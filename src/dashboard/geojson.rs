use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use crate::dashboard::*;

/// The country boundaries, keyed by ISO alpha-3 code.
///
/// The boundary file is a GeoJSON feature collection whose features carry the
/// alpha-3 code as their `id`.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct CountryFeatures {
    features: HashMap<String, JSValue>,
}

impl CountryFeatures {
    pub fn load(path: &Path) -> GeoResult<CountryFeatures> {
        let path_s = path.display().to_string();
        let contents = fs::read_to_string(path).context(OpeningFileSnafu {
            path: path_s.clone(),
        })?;
        let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {
            path: path_s.clone(),
        })?;
        let res = CountryFeatures::from_json(&js, &path_s)?;
        info!("Loaded {} country features from {}", res.len(), path_s);
        Ok(res)
    }

    pub fn from_json(js: &JSValue, origin: &str) -> GeoResult<CountryFeatures> {
        let arr = js["features"]
            .as_array()
            .context(InvalidGeojsonSnafu {
                path: origin,
                message: "missing features array",
            })?;
        let mut features: HashMap<String, JSValue> = HashMap::new();
        for f in arr.iter() {
            // Features without an id cannot be matched to a country.
            match f.get("id").and_then(|id| id.as_str()) {
                Some(id) => {
                    features.insert(id.to_string(), f.clone());
                }
                None => debug!("from_json: skipping feature without id in {}", origin),
            }
        }
        Ok(CountryFeatures { features })
    }

    pub fn get(&self, alpha3: &str) -> Option<&JSValue> {
        self.features.get(alpha3)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    fn square(id: &str, name: &str) -> JSValue {
        json!({
            "type": "Feature",
            "id": id,
            "properties": {"name": name},
            "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}
        })
    }

    pub(crate) fn sample_features() -> JSValue {
        json!({
            "type": "FeatureCollection",
            "features": [
                square("USA", "United States of America"),
                square("IND", "India"),
                square("RUS", "Russia"),
                square("CHN", "China"),
                square("FRA", "France"),
                square("DEU", "Germany"),
                {"type": "Feature", "properties": {"name": "No id"}, "geometry": null}
            ]
        })
    }

    #[test]
    fn features_by_id() {
        let f = CountryFeatures::from_json(&sample_features(), "sample").unwrap();
        assert_eq!(f.len(), 6);
        assert_eq!(f.get("IND").unwrap()["properties"]["name"], "India");
        assert!(f.get("GBR").is_none());
    }

    #[test]
    fn not_a_feature_collection() {
        let res = CountryFeatures::from_json(&json!({"type": "Feature"}), "bad");
        assert!(matches!(res, Err(GeoError::InvalidGeojson { .. })));
    }

    #[test]
    fn load_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("countries.geojson");
        fs::write(&p, sample_features().to_string()).unwrap();
        assert_eq!(CountryFeatures::load(&p).unwrap().len(), 6);
        fs::write(&p, "[").unwrap();
        assert!(matches!(
            CountryFeatures::load(&p),
            Err(GeoError::ParsingJson { .. })
        ));
    }
}
