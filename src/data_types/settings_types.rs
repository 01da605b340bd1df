use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{
    DEFAULT_DIET_COLUMNS, DEFAULT_DOMINANT_CARB, DEFAULT_DOMINANT_FAT, DEFAULT_DOMINANT_PROTEIN,
    DEFAULT_THRESHOLD,
};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UserSettings {
    pub diet_columns: Vec<String>,
    pub diet_rda_threshold: f64,
    pub diet_ul_threshold: f64,
    pub diet_hide_rda_ul_values: bool,
    #[serde(rename = "food-dominant-protein")]
    pub dominant_protein: String,
    #[serde(rename = "food-dominant-carb")]
    pub dominant_carb: String,
    #[serde(rename = "food-dominant-fat")]
    pub dominant_fat: String,
    // keys this client does not know about, written back untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for UserSettings {
    fn default() -> Self {
        UserSettings {
            diet_columns: DEFAULT_DIET_COLUMNS.iter().map(|c| c.to_string()).collect(),
            diet_rda_threshold: DEFAULT_THRESHOLD,
            diet_ul_threshold: DEFAULT_THRESHOLD,
            diet_hide_rda_ul_values: false,
            dominant_protein: DEFAULT_DOMINANT_PROTEIN.to_string(),
            dominant_carb: DEFAULT_DOMINANT_CARB.to_string(),
            dominant_fat: DEFAULT_DOMINANT_FAT.to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub settings: Value,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResetSettingsResponse {
    pub settings: Value,
}
