use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::constants::{CARB_COLUMN, FAT_COLUMN, FOOD_SEARCH_THRESHOLD, PROTEIN_COLUMN};
use crate::data_backend::DietApi;
use crate::data_types::settings_types::UserSettings;
use crate::data_types::Food;
use crate::errors::ApiError;

/// Foods indexed by FDC id plus the same foods sorted by name.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    by_id: HashMap<i64, Food>,
    sorted: Vec<Food>,
}

impl CatalogIndex {
    pub fn new(foods: Vec<Food>) -> Self {
        let mut sorted = foods;
        sorted.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        let by_id = sorted.iter().map(|f| (f.fdc_id, f.clone())).collect();
        CatalogIndex { by_id, sorted }
    }

    pub fn get(&self, fdc_id: i64) -> Option<&Food> {
        self.by_id.get(&fdc_id)
    }

    pub fn foods(&self) -> &[Food] {
        &self.sorted
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Up to `limit` foods whose name matches `query`. An empty query lists
    /// the first foods alphabetically.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Food> {
        let query = query.trim();
        if query.is_empty() {
            return self.sorted.iter().take(limit).collect();
        }

        let pattern: Vec<char> = query.to_lowercase().chars().collect();
        let mut hits: Vec<(f64, usize)> = self
            .sorted
            .iter()
            .enumerate()
            .filter_map(|(idx, food)| {
                let text: Vec<char> = food.name.to_lowercase().chars().collect();
                let score = fuzzy_score(&pattern, &text);
                (score <= FOOD_SEARCH_THRESHOLD).then_some((score, idx))
            })
            .collect();
        // stable on idx, so equal scores stay alphabetical
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        hits.into_iter()
            .take(limit)
            .map(|(_, idx)| &self.sorted[idx])
            .collect()
    }
}

/// Edit distance of `pattern` against the best matching substring of
/// `text`, divided by the pattern length. 0.0 is an exact substring match.
pub fn fuzzy_score(pattern: &[char], text: &[char]) -> f64 {
    if pattern.is_empty() {
        return 0.0;
    }

    // row i holds the cost of matching pattern[..i] ending at each text position
    let mut prev: Vec<usize> = vec![0; text.len() + 1];
    let mut cur: Vec<usize> = vec![0; text.len() + 1];
    for (i, pc) in pattern.iter().enumerate() {
        cur[0] = i + 1;
        for (j, tc) in text.iter().enumerate() {
            let substitution = prev[j] + usize::from(pc != tc);
            cur[j + 1] = substitution.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    let best = prev.iter().copied().min().unwrap_or(pattern.len());
    best as f64 / pattern.len() as f64
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Macro {
    Protein,
    Carb,
    Fat,
}

impl Macro {
    pub fn color<'a>(&self, settings: &'a UserSettings) -> &'a str {
        match self {
            Macro::Protein => &settings.dominant_protein,
            Macro::Carb => &settings.dominant_carb,
            Macro::Fat => &settings.dominant_fat,
        }
    }
}

/// Macro nutrient contributing the most energy (4/4/9 kcal per gram).
pub fn dominant_macro(food: &Food) -> Option<Macro> {
    let protein = food.number(PROTEIN_COLUMN).unwrap_or(0.0) * 4.0;
    let carb = food.number(CARB_COLUMN).unwrap_or(0.0) * 4.0;
    let fat = food.number(FAT_COLUMN).unwrap_or(0.0) * 9.0;

    let (best, energy) = [(Macro::Protein, protein), (Macro::Carb, carb), (Macro::Fat, fat)]
        .into_iter()
        .fold((Macro::Protein, f64::MIN), |acc, cur| if cur.1 > acc.1 { cur } else { acc });

    (energy > 0.0).then_some(best)
}

/// Lazily loaded food list shared by every table that needs names or the
/// food picker.
pub struct FoodCatalog {
    api: Arc<dyn DietApi>,
    index: RwLock<Option<Arc<CatalogIndex>>>,
    load_lock: Mutex<()>,
}

impl FoodCatalog {
    pub fn new(api: Arc<dyn DietApi>) -> Self {
        FoodCatalog {
            api,
            index: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    fn cached(&self) -> Option<Arc<CatalogIndex>> {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current index without loading; empty before the first load.
    pub fn snapshot(&self) -> Arc<CatalogIndex> {
        self.cached().unwrap_or_default()
    }

    /// Fetches the food list once. A failed fetch leaves an empty catalog in
    /// place (and reports the error) until `invalidate` is called.
    pub async fn ensure_loaded(&self) -> Result<Arc<CatalogIndex>, ApiError> {
        if let Some(index) = self.cached() {
            return Ok(index);
        }

        let _guard = self.load_lock.lock().await;
        if let Some(index) = self.cached() {
            return Ok(index);
        }

        let now = Instant::now();
        let (index, result) = match self.api.foods().await {
            Ok(foods) => {
                let index = Arc::new(CatalogIndex::new(foods));
                log::info!("Loaded {} foods in {:.2?}", index.len(), now.elapsed());
                (index.clone(), Ok(index))
            }
            Err(e) => {
                log::warn!("Failed to load foods: {}", e);
                (Arc::new(CatalogIndex::default()), Err(e))
            }
        };
        *self.index.write().unwrap_or_else(PoisonError::into_inner) = Some(index);
        result
    }

    pub fn invalidate(&self) {
        *self.index.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub async fn get_food(&self, fdc_id: i64) -> Result<Food, ApiError> {
        self.api.food(fdc_id).await
    }

    pub async fn update_food(&self, fdc_id: i64, fields: &Map<String, Value>) -> Result<(), ApiError> {
        self.api.update_food(fdc_id, fields).await?;
        log::info!("Updated food {}", fdc_id);
        self.invalidate();
        Ok(())
    }

    pub async fn delete_food(&self, fdc_id: i64) -> Result<(), ApiError> {
        self.api.delete_food(fdc_id).await?;
        log::info!("Deleted food {}", fdc_id);
        self.invalidate();
        Ok(())
    }

    /// Creates or refreshes a food from Food Data Central.
    pub async fn import_from_fdc(&self, fdc_id: i64) -> Result<String, ApiError> {
        let msg = self.api.import_food(fdc_id).await?;
        log::info!("{}", msg);
        self.invalidate();
        Ok(msg)
    }
}
