use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::data_types::settings_types::UserProfile;
use crate::data_types::{
    DietEntry, DietItem, DietItemDelete, DietItemUpdate, DietRename, Food, NewDietItem,
    ReferenceEntry, ReferenceKind, UserUpdate,
};
use crate::errors::ApiError;

#[cfg(test)]
pub mod mock_api;
pub mod rest_client;

pub type ApiResult<T> = Result<T, ApiError>;

/// Every endpoint the client talks to. Components receive an
/// `Arc<dyn DietApi>` so tests can swap in an in-memory backend.
#[async_trait]
pub trait DietApi: Send + Sync {
    async fn list_diets(&self) -> ApiResult<Vec<DietEntry>>;
    async fn diet_nutrition(&self, diet_name: &str) -> ApiResult<Vec<DietItem>>;
    async fn create_diet_item(&self, item: &NewDietItem) -> ApiResult<()>;
    async fn update_diet_item(&self, update: &DietItemUpdate) -> ApiResult<()>;
    async fn delete_diet_items(&self, delete: &DietItemDelete) -> ApiResult<()>;
    async fn rename_diet(&self, rename: &DietRename) -> ApiResult<()>;

    async fn foods(&self) -> ApiResult<Vec<Food>>;
    async fn food(&self, fdc_id: i64) -> ApiResult<Food>;
    async fn update_food(&self, fdc_id: i64, fields: &Map<String, Value>) -> ApiResult<()>;
    async fn delete_food(&self, fdc_id: i64) -> ApiResult<()>;
    async fn import_food(&self, fdc_id: i64) -> ApiResult<String>;

    async fn references(&self, kind: ReferenceKind) -> ApiResult<Vec<ReferenceEntry>>;
    async fn update_reference(&self, kind: ReferenceKind, id: i64, value: f64) -> ApiResult<()>;

    async fn user(&self) -> ApiResult<UserProfile>;
    async fn update_user(&self, update: &UserUpdate) -> ApiResult<()>;
    async fn reset_settings(&self) -> ApiResult<Value>;
}
