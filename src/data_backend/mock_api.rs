//! In-memory `DietApi` used by the unit tests. It mimics the server: the
//! nutrition endpoint joins foods and scales nutrients by quantity, and
//! updates/deletes match rows on their original identity.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::data_backend::{ApiResult, DietApi};
use crate::data_types::settings_types::UserProfile;
use crate::data_types::{
    as_number, DietEntry, DietItem, DietItemDelete, DietItemUpdate, DietRename, Food,
    NewDietItem, ReferenceEntry, ReferenceKind, UserUpdate,
};
use crate::errors::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredItem {
    pub diet_name: String,
    pub fdc_id: i64,
    pub quantity: f64,
    pub sort_order: i64,
    pub color: Option<String>,
}

#[derive(Default)]
pub struct MockApi {
    pub items: Mutex<Vec<StoredItem>>,
    pub foods: Mutex<Vec<Food>>,
    pub rda: Mutex<Vec<ReferenceEntry>>,
    pub ul: Mutex<Vec<ReferenceEntry>>,
    pub settings: Mutex<Value>,
    pub username: Mutex<String>,

    pub updates: Mutex<Vec<DietItemUpdate>>,
    pub user_updates: Mutex<Vec<UserUpdate>>,
    pub calls: Mutex<Vec<String>>,
    pub in_flight_puts: Mutex<usize>,
    pub max_in_flight_puts: Mutex<usize>,

    pub put_delay: Mutex<Option<Duration>>,
    pub request_delay: Mutex<Option<Duration>>,
    pub fail_puts_with: Mutex<Option<u16>>,
    pub fail_foods_with: Mutex<Option<u16>>,
    pub fail_nutrition_with: Mutex<Option<u16>>,
}

impl MockApi {
    pub fn new() -> Self {
        let api = MockApi::default();
        *api.username.lock().unwrap() = "tester".into();
        *api.settings.lock().unwrap() = json!({});
        api
    }

    pub fn with_food(self, fdc_id: i64, name: &str, nutrients: &[(&str, f64)]) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("Serving Size".to_string(), json!(100));
        fields.insert("Unit".to_string(), json!("grams"));
        for (column, value) in nutrients {
            fields.insert(column.to_string(), json!(value));
        }
        self.foods.lock().unwrap().push(Food {
            fdc_id,
            name: name.to_string(),
            fields,
        });
        self
    }

    pub fn with_item(
        self,
        diet_name: &str,
        fdc_id: i64,
        quantity: f64,
        sort_order: i64,
        color: Option<&str>,
    ) -> Self {
        self.items.lock().unwrap().push(StoredItem {
            diet_name: diet_name.to_string(),
            fdc_id,
            quantity,
            sort_order,
            color: color.map(str::to_string),
        });
        self
    }

    pub fn with_reference(self, kind: ReferenceKind, nutrient: &str, value: f64) -> Self {
        {
            let mut refs = match kind {
                ReferenceKind::Rda => self.rda.lock().unwrap(),
                ReferenceKind::Ul => self.ul.lock().unwrap(),
            };
            let id = refs.len() as i64 + 1;
            refs.push(ReferenceEntry {
                id,
                nutrient: nutrient.to_string(),
                value,
            });
        }
        self
    }

    pub fn with_settings(self, settings: Value) -> Self {
        *self.settings.lock().unwrap() = settings;
        self
    }

    pub fn call_count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    async fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
        let delay = *self.request_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn joined(&self, stored: &StoredItem) -> Option<DietItem> {
        let foods = self.foods.lock().unwrap();
        let food = foods.iter().find(|f| f.fdc_id == stored.fdc_id)?;
        let serving = food.number("Serving Size").unwrap_or(0.0);

        let mut fields = BTreeMap::new();
        fields.insert("Name".to_string(), json!(food.name));
        for (column, value) in &food.fields {
            if column == "Serving Size" {
                continue;
            }
            let scaled = match (value, as_number(value)) {
                (Value::Number(_), Some(n)) if serving > 0.0 => {
                    json!((n / serving * stored.quantity * 100.0).round() / 100.0)
                }
                (Value::Number(_), Some(_)) => json!(0.0),
                _ => value.clone(),
            };
            fields.insert(column.clone(), scaled);
        }

        Some(DietItem {
            diet_name: stored.diet_name.clone(),
            fdc_id: stored.fdc_id,
            quantity: stored.quantity,
            sort_order: stored.sort_order,
            color: stored.color.clone(),
            fields,
        })
    }
}

#[async_trait]
impl DietApi for MockApi {
    async fn list_diets(&self) -> ApiResult<Vec<DietEntry>> {
        self.record("list_diets").await;
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .map(|i| DietEntry {
                diet_name: i.diet_name.clone(),
            })
            .collect())
    }

    async fn diet_nutrition(&self, diet_name: &str) -> ApiResult<Vec<DietItem>> {
        self.record("diet_nutrition").await;
        if let Some(status) = *self.fail_nutrition_with.lock().unwrap() {
            return Err(ApiError::RequestFailed(status));
        }
        let stored: Vec<StoredItem> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.diet_name == diet_name)
            .cloned()
            .collect();
        Ok(stored.iter().filter_map(|s| self.joined(s)).collect())
    }

    async fn create_diet_item(&self, item: &NewDietItem) -> ApiResult<()> {
        self.record("create_diet_item").await;
        self.items.lock().unwrap().push(StoredItem {
            diet_name: item.diet_name.clone(),
            fdc_id: item.fdc_id,
            quantity: item.quantity,
            sort_order: item.sort_order,
            color: item.color.clone(),
        });
        Ok(())
    }

    async fn update_diet_item(&self, update: &DietItemUpdate) -> ApiResult<()> {
        self.calls.lock().unwrap().push("update_diet_item".into());
        {
            let mut in_flight = self.in_flight_puts.lock().unwrap();
            *in_flight += 1;
            let mut max = self.max_in_flight_puts.lock().unwrap();
            *max = (*max).max(*in_flight);
        }
        let delay = *self.put_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        *self.in_flight_puts.lock().unwrap() -= 1;

        self.updates.lock().unwrap().push(update.clone());
        if let Some(status) = *self.fail_puts_with.lock().unwrap() {
            return Err(ApiError::RequestFailed(status));
        }

        let mut items = self.items.lock().unwrap();
        let row = items
            .iter_mut()
            .find(|i| {
                i.diet_name == update.diet_name
                    && i.fdc_id == update.original_fdc_id
                    && i.quantity == update.original_quantity
                    && i.sort_order == update.original_sort_order
            })
            .ok_or(ApiError::RequestFailed(404))?;
        row.fdc_id = update.fdc_id;
        row.quantity = update.quantity;
        row.sort_order = update.sort_order;
        row.color = update.color.clone();
        Ok(())
    }

    async fn delete_diet_items(&self, delete: &DietItemDelete) -> ApiResult<()> {
        self.record("delete_diet_items").await;
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|i| {
            let matches = i.diet_name == delete.diet_name
                && (delete.delete_all
                    || (Some(i.fdc_id) == delete.fdc_id
                        && Some(i.quantity) == delete.quantity
                        && Some(i.sort_order) == delete.sort_order));
            !matches
        });
        if items.len() == before {
            return Err(ApiError::RequestFailed(404));
        }
        Ok(())
    }

    async fn rename_diet(&self, rename: &DietRename) -> ApiResult<()> {
        self.record("rename_diet").await;
        let mut items = self.items.lock().unwrap();
        let mut renamed = 0;
        for item in items.iter_mut().filter(|i| i.diet_name == rename.diet_name_old) {
            item.diet_name = rename.diet_name_new.clone();
            renamed += 1;
        }
        if renamed == 0 {
            return Err(ApiError::RequestFailed(404));
        }
        Ok(())
    }

    async fn foods(&self) -> ApiResult<Vec<Food>> {
        self.record("foods").await;
        if let Some(status) = *self.fail_foods_with.lock().unwrap() {
            return Err(ApiError::RequestFailed(status));
        }
        let mut foods = self.foods.lock().unwrap().clone();
        foods.sort_by_key(|f| f.fdc_id);
        Ok(foods)
    }

    async fn food(&self, fdc_id: i64) -> ApiResult<Food> {
        self.record("food").await;
        self.foods
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.fdc_id == fdc_id)
            .cloned()
            .ok_or(ApiError::RequestFailed(404))
    }

    async fn update_food(&self, fdc_id: i64, fields: &Map<String, Value>) -> ApiResult<()> {
        self.record("update_food").await;
        let mut foods = self.foods.lock().unwrap();
        let food = foods
            .iter_mut()
            .find(|f| f.fdc_id == fdc_id)
            .ok_or(ApiError::RequestFailed(404))?;
        for (column, value) in fields {
            if column == "Name" {
                food.name = value.as_str().unwrap_or_default().to_string();
            } else {
                food.fields.insert(column.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn delete_food(&self, fdc_id: i64) -> ApiResult<()> {
        self.record("delete_food").await;
        let mut foods = self.foods.lock().unwrap();
        let before = foods.len();
        foods.retain(|f| f.fdc_id != fdc_id);
        if foods.len() == before {
            return Err(ApiError::RequestFailed(404));
        }
        Ok(())
    }

    async fn import_food(&self, fdc_id: i64) -> ApiResult<String> {
        self.record("import_food").await;
        self.foods.lock().unwrap().push(Food {
            fdc_id,
            name: format!("Imported {}", fdc_id),
            fields: BTreeMap::new(),
        });
        Ok(format!("Food {} Imported {} created", fdc_id, fdc_id))
    }

    async fn references(&self, kind: ReferenceKind) -> ApiResult<Vec<ReferenceEntry>> {
        self.record("references").await;
        Ok(match kind {
            ReferenceKind::Rda => self.rda.lock().unwrap().clone(),
            ReferenceKind::Ul => self.ul.lock().unwrap().clone(),
        })
    }

    async fn update_reference(&self, kind: ReferenceKind, id: i64, value: f64) -> ApiResult<()> {
        self.record("update_reference").await;
        let mut refs = match kind {
            ReferenceKind::Rda => self.rda.lock().unwrap(),
            ReferenceKind::Ul => self.ul.lock().unwrap(),
        };
        let entry = refs
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ApiError::RequestFailed(404))?;
        entry.value = value;
        Ok(())
    }

    async fn user(&self) -> ApiResult<UserProfile> {
        self.record("user").await;
        Ok(UserProfile {
            id: 1,
            username: self.username.lock().unwrap().clone(),
            settings: self.settings.lock().unwrap().clone(),
        })
    }

    async fn update_user(&self, update: &UserUpdate) -> ApiResult<()> {
        self.record("update_user").await;
        if let Some(settings) = &update.settings {
            *self.settings.lock().unwrap() = settings.clone();
        }
        if let Some(username) = &update.username {
            *self.username.lock().unwrap() = username.clone();
        }
        self.user_updates.lock().unwrap().push(update.clone());
        Ok(())
    }

    async fn reset_settings(&self) -> ApiResult<Value> {
        self.record("reset_settings").await;
        let defaults = json!({
            "diet_columns": ["Name", "Energy kcal", "Protein g"],
            "diet_rda_threshold": 100,
            "diet_ul_threshold": 100,
            "diet_hide_rda_ul_values": false
        });
        *self.settings.lock().unwrap() = defaults.clone();
        Ok(defaults)
    }
}
