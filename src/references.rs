use std::sync::Arc;
use std::time::Instant;

use crate::data_backend::DietApi;
use crate::data_types::{DietEntry, ReferenceEntry, ReferenceKind};
use crate::diet_table::totals::{reference_map, ReferenceMap};
use crate::errors::ApiError;

/// Names of every diet the user has, deduplicated and sorted.
pub async fn list_diet_names(api: &dyn DietApi) -> Result<Vec<String>, ApiError> {
    let now = Instant::now();
    let entries = api.list_diets().await?;
    log::debug!("Diet list fetched in {:.2?}", now.elapsed());

    Ok(diet_names(entries))
}

fn diet_names(entries: Vec<DietEntry>) -> Vec<String> {
    let mut names: Vec<String> = entries.into_iter().map(|e| e.diet_name).collect();
    names.sort();
    names.dedup();
    names
}

/// The user's RDA and UL tables.
pub struct References {
    api: Arc<dyn DietApi>,
    pub rda: Vec<ReferenceEntry>,
    pub ul: Vec<ReferenceEntry>,
}

impl References {
    pub async fn load(api: Arc<dyn DietApi>) -> Result<Self, ApiError> {
        let (rda, ul) = tokio::join!(
            api.references(ReferenceKind::Rda),
            api.references(ReferenceKind::Ul)
        );
        let references = References {
            rda: rda?,
            ul: ul?,
            api,
        };
        log::info!(
            "Loaded {} RDA and {} UL values",
            references.rda.len(),
            references.ul.len()
        );
        Ok(references)
    }

    pub fn rda_map(&self) -> ReferenceMap {
        reference_map(&self.rda)
    }

    pub fn ul_map(&self) -> ReferenceMap {
        reference_map(&self.ul)
    }

    pub async fn update_rda(&mut self, id: i64, value: f64) -> Result<(), ApiError> {
        self.update(ReferenceKind::Rda, id, value).await
    }

    pub async fn update_ul(&mut self, id: i64, value: f64) -> Result<(), ApiError> {
        self.update(ReferenceKind::Ul, id, value).await
    }

    async fn update(&mut self, kind: ReferenceKind, id: i64, value: f64) -> Result<(), ApiError> {
        self.api.update_reference(kind, id, value).await?;

        let entries = match kind {
            ReferenceKind::Rda => &mut self.rda,
            ReferenceKind::Ul => &mut self.ul,
        };
        if let Some(entry) = entries.iter_mut().find(|e| e.id == id) {
            entry.value = value;
            log::info!("{:?} for {} set to {}", kind, entry.nutrient, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_backend::mock_api::MockApi;

    #[tokio::test]
    async fn diet_names_are_unique_and_sorted() {
        let api = MockApi::new()
            .with_item("Cut", 1, 100.0, 1, None)
            .with_item("Bulk", 1, 100.0, 1, None)
            .with_item("Cut", 2, 50.0, 2, None);

        assert_eq!(list_diet_names(&api).await.unwrap(), ["Bulk", "Cut"]);
    }

    #[tokio::test]
    async fn updates_reach_server_and_local_copy() {
        let api = Arc::new(
            MockApi::new()
                .with_reference(ReferenceKind::Rda, "Protein g", 56.0)
                .with_reference(ReferenceKind::Ul, "Sodium, Na mg", 2300.0),
        );
        let mut refs = References::load(api.clone()).await.unwrap();

        refs.update_rda(1, 60.0).await.unwrap();
        refs.update_ul(1, 2000.0).await.unwrap();

        assert_eq!(refs.rda_map().get("Protein g"), Some(&60.0));
        assert_eq!(refs.ul_map().get("Sodium, Na mg"), Some(&2000.0));
        assert_eq!(api.rda.lock().unwrap()[0].value, 60.0);
        assert_eq!(
            refs.update_ul(9, 1.0).await,
            Err(ApiError::RequestFailed(404))
        );
    }
}
