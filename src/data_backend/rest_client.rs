use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, COOKIE},
    Client, Method, Url,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tokio::time::Instant;

use crate::constants::{
    AUTH_COOKIE, DIETS_PATH, DIET_PATH, DIET_RENAME_PATH, FDC_IMPORT_PATH, FOODS_PATH, RDA_PATH,
    RESET_SETTINGS_PATH, UL_PATH, USER_PATH,
};
use crate::data_backend::{ApiResult, DietApi};
use crate::data_types::settings_types::{ResetSettingsResponse, UserProfile};
use crate::data_types::{
    DietEntry, DietItem, DietItemDelete, DietItemUpdate, DietRename, Food, NewDietItem,
    ReferenceEntry, ReferenceKind, ReferenceUpdate, UserUpdate,
};
use crate::errors::ApiError;

/// `DietApi` over HTTP.
pub struct RestClient {
    client: Client,
    base_url: Url,
}

impl RestClient {
    pub fn new(base_url: &str, auth_token: Option<&str>) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Transport(format!("invalid base url '{}': {}", base_url, e)))?;

        let mut headers = HeaderMap::new();
        if let Some(token) = auth_token {
            let cookie = HeaderValue::from_str(&format!("{}={}", AUTH_COOKIE, token))
                .map_err(|e| ApiError::Transport(format!("invalid auth token: {}", e)))?;
            headers.insert(COOKIE, cookie);
        }

        let client = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .build()?;

        Ok(RestClient { client, base_url })
    }

    /// Joins `path` and the percent-encoded `segments` onto the base url.
    fn endpoint(&self, path: &str, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("base url cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(path.trim_start_matches('/').split('/'))
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        let now = Instant::now();
        let resp = self.client.get(url.clone()).send().await?.error_for_status()?;
        log::debug!("GET {}: {:.2?}", url.path(), now.elapsed());

        Ok(resp.json::<T>().await?)
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> ApiResult<reqwest::Response> {
        let now = Instant::now();
        let mut req = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            // sets Content-Type: application/json
            req = req.json(body);
        }
        let resp = req.send().await?.error_for_status()?;
        log::debug!("{} {}: {:.2?}", method, url.path(), now.elapsed());

        Ok(resp)
    }

    fn reference_path(kind: ReferenceKind) -> &'static str {
        match kind {
            ReferenceKind::Rda => RDA_PATH,
            ReferenceKind::Ul => UL_PATH,
        }
    }
}

#[async_trait]
impl DietApi for RestClient {
    async fn list_diets(&self) -> ApiResult<Vec<DietEntry>> {
        self.get_json(self.endpoint(DIETS_PATH, &["*"])?).await
    }

    async fn diet_nutrition(&self, diet_name: &str) -> ApiResult<Vec<DietItem>> {
        let url = self.endpoint(DIETS_PATH, &[diet_name, "nutrition"])?;
        let raw: Value = self.get_json(url).await?;
        if !raw.is_array() {
            return Err(ApiError::UnexpectedFormat("expected a list of items".into()));
        }
        serde_json::from_value(raw).map_err(|e| ApiError::UnexpectedFormat(e.to_string()))
    }

    async fn create_diet_item(&self, item: &NewDietItem) -> ApiResult<()> {
        self.send_json(Method::POST, self.endpoint(DIET_PATH, &[])?, Some(item))
            .await?;
        Ok(())
    }

    async fn update_diet_item(&self, update: &DietItemUpdate) -> ApiResult<()> {
        self.send_json(Method::PUT, self.endpoint(DIET_PATH, &[])?, Some(update))
            .await?;
        Ok(())
    }

    async fn delete_diet_items(&self, delete: &DietItemDelete) -> ApiResult<()> {
        self.send_json(Method::DELETE, self.endpoint(DIET_PATH, &[])?, Some(delete))
            .await?;
        Ok(())
    }

    async fn rename_diet(&self, rename: &DietRename) -> ApiResult<()> {
        self.send_json(Method::PUT, self.endpoint(DIET_RENAME_PATH, &[])?, Some(rename))
            .await?;
        Ok(())
    }

    async fn foods(&self) -> ApiResult<Vec<Food>> {
        self.get_json(self.endpoint(FOODS_PATH, &[])?).await
    }

    async fn food(&self, fdc_id: i64) -> ApiResult<Food> {
        self.get_json(self.endpoint(FOODS_PATH, &[fdc_id.to_string().as_str()])?)
            .await
    }

    async fn update_food(&self, fdc_id: i64, fields: &Map<String, Value>) -> ApiResult<()> {
        let url = self.endpoint(FOODS_PATH, &[fdc_id.to_string().as_str()])?;
        self.send_json(Method::PUT, url, Some(fields)).await?;
        Ok(())
    }

    async fn delete_food(&self, fdc_id: i64) -> ApiResult<()> {
        let url = self.endpoint(FOODS_PATH, &[fdc_id.to_string().as_str()])?;
        self.send_json::<Value>(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn import_food(&self, fdc_id: i64) -> ApiResult<String> {
        let url = self.endpoint(FDC_IMPORT_PATH, &[fdc_id.to_string().as_str()])?;
        let resp = self.send_json::<Value>(Method::POST, url, None).await?;
        // the server answers with a bare JSON string
        match resp.json::<Value>().await? {
            Value::String(msg) => Ok(msg),
            other => Ok(other.to_string()),
        }
    }

    async fn references(&self, kind: ReferenceKind) -> ApiResult<Vec<ReferenceEntry>> {
        self.get_json(self.endpoint(Self::reference_path(kind), &[])?)
            .await
    }

    async fn update_reference(&self, kind: ReferenceKind, id: i64, value: f64) -> ApiResult<()> {
        let url = self.endpoint(Self::reference_path(kind), &[id.to_string().as_str()])?;
        self.send_json(Method::PUT, url, Some(&ReferenceUpdate { value }))
            .await?;
        Ok(())
    }

    async fn user(&self) -> ApiResult<UserProfile> {
        self.get_json(self.endpoint(USER_PATH, &[])?).await
    }

    async fn update_user(&self, update: &UserUpdate) -> ApiResult<()> {
        self.send_json(Method::PUT, self.endpoint(USER_PATH, &[])?, Some(update))
            .await?;
        Ok(())
    }

    async fn reset_settings(&self) -> ApiResult<Value> {
        let url = self.endpoint(RESET_SETTINGS_PATH, &[])?;
        let resp = self.send_json::<Value>(Method::POST, url, None).await?;
        Ok(resp.json::<ResetSettingsResponse>().await?.settings)
    }
}
