use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::colors::is_hex_color;
use crate::constants::{
    DEFAULT_DOMINANT_CARB, DEFAULT_DOMINANT_FAT, DEFAULT_DOMINANT_PROTEIN, DEFAULT_THRESHOLD,
    REQUIRED_COLUMNS,
};
use crate::data_backend::DietApi;
use crate::data_types::settings_types::UserSettings;
use crate::data_types::{as_number, UserUpdate};
use crate::errors::{ApiError, EditError};

/// Per-user display settings, fetched from `/api/users/me` and cached for
/// the lifetime of the store.
pub struct SettingsStore {
    api: Arc<dyn DietApi>,
    cache: RwLock<Option<UserSettings>>,
    // held while a fetch is running so concurrent loads share it
    load_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(api: Arc<dyn DietApi>) -> Self {
        SettingsStore {
            api,
            cache: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    /// Cached settings, or the defaults if nothing was loaded yet.
    pub fn get(&self) -> UserSettings {
        self.cached().unwrap_or_default()
    }

    pub fn is_loaded(&self) -> bool {
        self.cached().is_some()
    }

    fn cached(&self) -> Option<UserSettings> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, settings: UserSettings) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Some(settings);
    }

    pub async fn load(&self) -> Result<UserSettings, ApiError> {
        if let Some(settings) = self.cached() {
            return Ok(settings);
        }

        let _guard = self.load_lock.lock().await;
        // someone else finished the fetch while we waited
        if let Some(settings) = self.cached() {
            return Ok(settings);
        }
        self.fetch().await
    }

    pub async fn reload(&self) -> Result<UserSettings, ApiError> {
        let _guard = self.load_lock.lock().await;
        self.fetch().await
    }

    async fn fetch(&self) -> Result<UserSettings, ApiError> {
        let profile = self.api.user().await?;
        let settings = normalize_settings(&profile.settings);
        log::info!(
            "Loaded settings for {}: {} diet columns",
            profile.username,
            settings.diet_columns.len()
        );
        self.store(settings.clone());
        Ok(settings)
    }

    pub async fn save(&self, settings: UserSettings) -> Result<UserSettings, ApiError> {
        let raw = serde_json::to_value(&settings)
            .map_err(|e| ApiError::UnexpectedFormat(e.to_string()))?;
        let settings = normalize_settings(&raw);

        let update = UserUpdate {
            settings: Some(
                serde_json::to_value(&settings)
                    .map_err(|e| ApiError::UnexpectedFormat(e.to_string()))?,
            ),
            ..Default::default()
        };
        self.api.update_user(&update).await?;
        log::info!("Settings saved");

        self.store(settings.clone());
        Ok(settings)
    }

    pub async fn reset(&self) -> Result<UserSettings, ApiError> {
        let raw = self.api.reset_settings().await?;
        let settings = normalize_settings(&raw);
        log::info!("Settings reset to defaults");
        self.store(settings.clone());
        Ok(settings)
    }

    /// Changes username and/or password. Blank values are rejected before
    /// anything is sent.
    pub async fn update_profile(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), EditError> {
        let username = match username.map(str::trim) {
            Some("") => return Err(EditError::Blank("Username")),
            other => other.map(str::to_string),
        };
        let password = match password {
            Some("") => return Err(EditError::Blank("Password")),
            other => other.map(str::to_string),
        };
        if username.is_none() && password.is_none() {
            return Err(EditError::Blank("Username or password"));
        }

        self.api
            .update_user(&UserUpdate {
                username,
                password,
                settings: None,
            })
            .await?;
        Ok(())
    }
}

/// Builds a complete `UserSettings` out of whatever the server stored.
/// Settings may arrive as an object or as a JSON encoded string.
pub fn normalize_settings(raw: &Value) -> UserSettings {
    let parsed;
    let raw = match raw {
        Value::String(txt) => {
            parsed = serde_json::from_str::<Value>(txt).unwrap_or(Value::Null);
            &parsed
        }
        other => other,
    };
    let Some(obj) = raw.as_object() else {
        return with_required_columns(UserSettings::default());
    };

    let defaults = UserSettings::default();
    let mut extra = Map::new();
    for (key, value) in obj {
        if !matches!(
            key.as_str(),
            "diet_columns"
                | "diet_rda_threshold"
                | "diet_ul_threshold"
                | "diet_hide_rda_ul_values"
                | "food-dominant-protein"
                | "food-dominant-carb"
                | "food-dominant-fat"
        ) {
            extra.insert(key.clone(), value.clone());
        }
    }

    let diet_columns = match obj.get("diet_columns") {
        Some(Value::Array(cols)) => {
            let mut out: Vec<String> = Vec::new();
            for col in cols.iter().filter_map(Value::as_str).map(str::trim) {
                if !col.is_empty() && !out.iter().any(|c| c == col) {
                    out.push(col.to_string());
                }
            }
            out
        }
        _ => defaults.diet_columns,
    };

    with_required_columns(UserSettings {
        diet_columns,
        diet_rda_threshold: coerce_threshold(obj.get("diet_rda_threshold")),
        diet_ul_threshold: coerce_threshold(obj.get("diet_ul_threshold")),
        diet_hide_rda_ul_values: coerce_bool(obj.get("diet_hide_rda_ul_values")).unwrap_or(false),
        dominant_protein: coerce_color(obj.get("food-dominant-protein"), DEFAULT_DOMINANT_PROTEIN),
        dominant_carb: coerce_color(obj.get("food-dominant-carb"), DEFAULT_DOMINANT_CARB),
        dominant_fat: coerce_color(obj.get("food-dominant-fat"), DEFAULT_DOMINANT_FAT),
        extra,
    })
}

fn with_required_columns(mut settings: UserSettings) -> UserSettings {
    for required in REQUIRED_COLUMNS {
        if !settings.diet_columns.iter().any(|c| c == required) {
            settings.diet_columns.push(required.to_string());
        }
    }
    settings
}

fn coerce_threshold(value: Option<&Value>) -> f64 {
    value
        .and_then(as_number)
        .filter(|n| *n >= 0.0)
        .unwrap_or(DEFAULT_THRESHOLD)
}

fn coerce_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_color(value: Option<&Value>, fallback: &str) -> String {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| is_hex_color(c))
        .unwrap_or(fallback)
        .to_string()
}
