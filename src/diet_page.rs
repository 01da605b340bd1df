use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::Local;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinSet;

use crate::autosave::{SaveAction, SavePhase, SaveQueue};
use crate::colors::is_hex_color;
use crate::constants::{EDIT_SAVE_DELAY, NEW_ITEM_FDC_ID, NEW_ITEM_QUANTITY, SHORT_SAVE_DELAY};
use crate::data_backend::DietApi;
use crate::data_types::{DietItemDelete, DietRename, NewDietItem, ReferenceKind};
use crate::diet_table::row_edit::{self, any_dirty, EditableRow, RowInputs};
use crate::diet_table::table_model::{build_view, ViewInput};
use crate::diet_table::totals::{reference_map, ReferenceMap};
use crate::diet_table::TableView;
use crate::errors::{ApiError, EditError};
use crate::food_catalog::FoodCatalog;
use crate::settings_store::SettingsStore;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(usize),
    NothingToSave,
    /// a batch was already running; this one follows it
    Queued,
}

/// One diet's editable table. Cheap to clone; clones share state.
///
/// Edits restart a debounce timer, and when it fires every dirty row is
/// written back in one batch followed by a full reload. At most one batch
/// runs at a time.
#[derive(Clone)]
pub struct DietPage {
    inner: Arc<PageInner>,
}

struct PageInner {
    api: Arc<dyn DietApi>,
    settings: Arc<SettingsStore>,
    foods: Arc<FoodCatalog>,
    state: Mutex<PageState>,
    queue: std::sync::Mutex<SaveQueue>,
    // woken whenever the save slot may have gone idle
    idle: Notify,
}

#[derive(Default)]
struct PageState {
    diet_name: String,
    rows: Vec<EditableRow>,
    rda: ReferenceMap,
    ul: ReferenceMap,
    editing: Option<usize>,
    status: String,
}

impl DietPage {
    pub fn new(
        api: Arc<dyn DietApi>,
        settings: Arc<SettingsStore>,
        foods: Arc<FoodCatalog>,
        diet_name: &str,
    ) -> Self {
        DietPage {
            inner: Arc::new(PageInner {
                api,
                settings,
                foods,
                state: Mutex::new(PageState {
                    diet_name: diet_name.to_string(),
                    ..Default::default()
                }),
                queue: std::sync::Mutex::new(SaveQueue::default()),
                idle: Notify::new(),
            }),
        }
    }

    /// Loads settings, foods, RDA/UL values and the diet's items. Only the
    /// item list is required; the rest falls back to defaults or empty.
    /// Unsaved input survives the reload.
    pub async fn load(&self) -> Result<usize, ApiError> {
        self.reload(&[]).await
    }

    async fn reload(&self, sent: &[(RowInputs, RowInputs)]) -> Result<usize, ApiError> {
        let diet_name = {
            let mut state = self.inner.state.lock().await;
            state.status = format!("Loading {} items...", state.diet_name);
            state.diet_name.clone()
        };
        let now = Instant::now();

        if let Err(e) = self.inner.settings.load().await {
            log::warn!("Failed to load settings, using defaults: {}", e);
        }
        let food_error = self.inner.foods.ensure_loaded().await.err();

        let (rda, ul) = tokio::join!(
            self.inner.api.references(ReferenceKind::Rda),
            self.inner.api.references(ReferenceKind::Ul)
        );
        let rda = rda.map(|r| reference_map(&r)).unwrap_or_else(|e| {
            log::warn!("Failed to load RDA values: {}", e);
            ReferenceMap::new()
        });
        let ul = ul.map(|r| reference_map(&r)).unwrap_or_else(|e| {
            log::warn!("Failed to load UL values: {}", e);
            ReferenceMap::new()
        });

        let mut items = match self.inner.api.diet_nutrition(&diet_name).await {
            Ok(items) => items,
            Err(e) => {
                log::warn!("Failed to load items for {}: {}", diet_name, e);
                self.set_status(format!("Failed to load items: {}", e)).await;
                return Err(e);
            }
        };
        items.sort_by_key(|item| item.sort_order);
        let count = items.len();

        let mut state = self.inner.state.lock().await;
        let mut rows: Vec<EditableRow> = items.into_iter().map(EditableRow::new).collect();
        let carried = carry_unsaved(&state.rows, &mut rows, sent);
        if carried > 0 {
            log::debug!("Re-applied unsaved input to {} row(s)", carried);
        }
        state.rows = rows;
        state.rda = rda;
        state.ul = ul;
        state.editing = None;
        state.status = if count == 0 {
            format!("No items found for {}.", diet_name)
        } else {
            format!("Loaded {} items for {}.", count, diet_name)
        };
        if let Some(e) = food_error {
            state.status += &format!(" Failed to load foods: {}", e);
        }
        drop(state);

        // the reload ended single-row edit mode, so a held back save goes now
        if self.queue().on_blur() {
            self.schedule(SHORT_SAVE_DELAY);
        }

        log::info!("Loaded {} items for {}", count, diet_name);
        log::debug!("Diet page load took {:.2?}", now.elapsed());
        Ok(count)
    }

    pub async fn edit_quantity(&self, row: usize, value: &str) -> Result<(), EditError> {
        self.edit_row(row, |r| {
            r.current.quantity = value.to_string();
            Ok(())
        })
        .await
    }

    pub async fn edit_sort_order(&self, row: usize, value: &str) -> Result<(), EditError> {
        self.edit_row(row, |r| {
            r.current.sort_order = value.to_string();
            Ok(())
        })
        .await
    }

    /// Food picker. The id has to be in the catalog.
    pub async fn select_food(&self, row: usize, fdc_id: i64) -> Result<(), EditError> {
        let foods = self.inner.foods.snapshot();
        if foods.get(fdc_id).is_none() {
            return Err(EditError::UnknownFood(fdc_id));
        }
        self.edit_row(row, |r| {
            r.current.fdc_id = fdc_id.to_string();
            Ok(())
        })
        .await
    }

    /// Color picker. Picking the selected color again clears it.
    pub async fn toggle_color(&self, row: usize, color: &str) -> Result<(), EditError> {
        if !is_hex_color(color) {
            return Err(EditError::InvalidField {
                field: "color",
                value: color.to_string(),
            });
        }
        self.edit_row(row, |r| {
            r.toggle_color(color);
            Ok(())
        })
        .await
    }

    async fn edit_row<F>(&self, row: usize, edit: F) -> Result<(), EditError>
    where
        F: FnOnce(&mut EditableRow) -> Result<(), EditError>,
    {
        {
            let mut state = self.inner.state.lock().await;
            let target = state.rows.get_mut(row).ok_or(EditError::NoSuchRow(row))?;
            edit(target)?;
        }
        self.schedule(EDIT_SAVE_DELAY);
        Ok(())
    }

    /// Drag and drop: moves a row and renumbers every row's sort order.
    pub async fn move_row(&self, from: usize, to: usize) -> Result<(), EditError> {
        {
            let mut state = self.inner.state.lock().await;
            row_edit::move_row(&mut state.rows, from, to)?;
            state.editing = None;
        }
        self.schedule(SHORT_SAVE_DELAY);
        Ok(())
    }

    /// Single-row edit mode. Auto-save holds off until the row is blurred.
    pub async fn focus_row(&self, row: usize) -> Result<(), EditError> {
        let mut state = self.inner.state.lock().await;
        if row >= state.rows.len() {
            return Err(EditError::NoSuchRow(row));
        }
        state.editing = Some(row);
        Ok(())
    }

    pub async fn blur_row(&self) {
        self.inner.state.lock().await.editing = None;
        let deferred = self.queue().on_blur();
        if deferred {
            self.schedule(SHORT_SAVE_DELAY);
        }
    }

    /// Saves every dirty row now, or right after the batch in flight.
    pub async fn save_all(&self) -> Result<SaveOutcome, EditError> {
        let action = {
            let mut queue = self.queue();
            queue.cancel_timer();
            queue.start_now()
        };
        let result = match action {
            SaveAction::Start => self.run_batch().await,
            _ => Ok(SaveOutcome::Queued),
        };
        self.inner.idle.notify_waiters();
        result
    }

    /// Adds a placeholder food at the end of the diet.
    pub async fn add_item(&self) -> Result<(), EditError> {
        let item = {
            let state = self.inner.state.lock().await;
            NewDietItem {
                diet_name: state.diet_name.clone(),
                fdc_id: NEW_ITEM_FDC_ID,
                quantity: NEW_ITEM_QUANTITY,
                sort_order: state.rows.iter().map(|r| r.item.sort_order).max().unwrap_or(0) + 1,
                color: None,
            }
        };

        if let Err(e) = self.inner.api.create_diet_item(&item).await {
            self.set_status(format!("Failed to add item: {}", e)).await;
            return Err(e.into());
        }
        log::info!("Added item {} to {}", item.sort_order, item.diet_name);
        self.load().await?;
        Ok(())
    }

    /// Deletes the stored row `row` was loaded from.
    pub async fn delete_item(&self, row: usize) -> Result<(), EditError> {
        let payload = {
            let state = self.inner.state.lock().await;
            state
                .rows
                .get(row)
                .ok_or(EditError::NoSuchRow(row))?
                .delete_payload()
        };

        if let Err(e) = self.inner.api.delete_diet_items(&payload).await {
            self.set_status(format!("Failed to delete item: {}", e)).await;
            return Err(e.into());
        }
        log::info!("Deleted fdc_id {} from {}", payload.fdc_id.unwrap_or_default(), payload.diet_name);
        self.load().await?;
        Ok(())
    }

    /// Deletes every item of the diet, and with it the diet.
    pub async fn delete_diet(&self) -> Result<(), EditError> {
        let diet_name = self.diet_name().await;
        let payload = DietItemDelete {
            diet_name: diet_name.clone(),
            fdc_id: None,
            quantity: None,
            sort_order: None,
            delete_all: true,
        };

        if let Err(e) = self.inner.api.delete_diet_items(&payload).await {
            self.set_status(format!("Failed to delete diet: {}", e)).await;
            return Err(e.into());
        }
        {
            let mut queue = self.queue();
            queue.cancel_timer();
            queue.on_blur();
        }
        self.inner.idle.notify_waiters();

        let mut state = self.inner.state.lock().await;
        state.rows.clear();
        state.editing = None;
        state.status = format!("Deleted diet {}.", diet_name);
        log::info!("Deleted diet {}", diet_name);
        Ok(())
    }

    pub async fn rename_diet(&self, new_name: &str) -> Result<(), EditError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(EditError::Blank("diet name"));
        }
        let rename = DietRename {
            diet_name_old: self.diet_name().await,
            diet_name_new: new_name.to_string(),
        };

        if let Err(e) = self.inner.api.rename_diet(&rename).await {
            self.set_status(format!("Failed to rename diet: {}", e)).await;
            return Err(e.into());
        }
        log::info!("Renamed diet {} to {}", rename.diet_name_old, rename.diet_name_new);
        self.inner.state.lock().await.diet_name = rename.diet_name_new;
        self.load().await?;
        Ok(())
    }

    pub async fn view(&self) -> TableView {
        let settings = self.inner.settings.get();
        let foods = self.inner.foods.snapshot();
        let state = self.inner.state.lock().await;

        build_view(&ViewInput {
            diet_name: &state.diet_name,
            rows: &state.rows,
            settings: &settings,
            foods: &foods,
            rda: &state.rda,
            ul: &state.ul,
            editing: state.editing,
            status: &state.status,
        })
    }

    pub async fn status(&self) -> String {
        self.inner.state.lock().await.status.clone()
    }

    pub async fn diet_name(&self) -> String {
        self.inner.state.lock().await.diet_name.clone()
    }

    pub async fn save_all_enabled(&self) -> bool {
        any_dirty(&self.inner.state.lock().await.rows)
    }

    pub fn phase(&self) -> SavePhase {
        self.queue().phase()
    }

    /// Waits until no timer is pending and no batch is running. A save held
    /// back for a focused row does not count as pending.
    pub async fn flush(&self) {
        loop {
            let idle = self.inner.idle.notified();
            if self.phase() == SavePhase::Idle {
                return;
            }
            idle.await;
        }
    }

    fn queue(&self) -> MutexGuard<'_, SaveQueue> {
        self.inner.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn set_status(&self, status: String) {
        self.inner.state.lock().await.status = status;
    }

    /// (Re)starts the debounce timer.
    fn schedule(&self, delay: Duration) {
        let mut queue = self.queue();
        let generation = queue.next_generation();
        let page = self.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // own task, so re-arming the timer never aborts a running batch
            tokio::spawn(async move { page.fire(generation).await });
        });
        queue.arm(timer);
    }

    async fn fire(&self, generation: u64) {
        let editing = self.inner.state.lock().await.editing.is_some();
        let action = self.queue().on_timer(generation, editing);
        match action {
            SaveAction::Start => {
                if let Err(e) = self.run_batch().await {
                    log::warn!("Auto-save failed: {}", e);
                }
            }
            SaveAction::Queue => log::debug!("Save queued behind running batch"),
            SaveAction::Defer => log::debug!("Save deferred until row loses focus"),
            SaveAction::Ignore => {}
        }
        self.inner.idle.notify_waiters();
    }

    async fn run_batch(&self) -> Result<SaveOutcome, EditError> {
        let result = self.save_dirty_rows().await;
        let queued = self.queue().finish();
        if queued {
            self.schedule(SHORT_SAVE_DELAY);
        }
        result
    }

    async fn save_dirty_rows(&self) -> Result<SaveOutcome, EditError> {
        let batch = {
            let mut state = self.inner.state.lock().await;
            let batch: Result<Vec<_>, EditError> = state
                .rows
                .iter()
                .filter(|r| r.is_dirty())
                .map(|r| -> Result<_, EditError> {
                    Ok((r.original.clone(), r.current.clone(), r.update_payload()?))
                })
                .collect();
            match batch {
                Ok(batch) if batch.is_empty() => {
                    state.status = "No changes to save.".to_string();
                    return Ok(SaveOutcome::NothingToSave);
                }
                Ok(batch) => {
                    state.status = format!("Saving {} row(s)...", batch.len());
                    batch
                }
                Err(e) => {
                    state.status = format!("Failed to save rows: {}", e);
                    return Err(e);
                }
            }
        };

        let now = Instant::now();
        let mut requests = JoinSet::new();
        for (idx, (_, _, payload)) in batch.iter().enumerate() {
            let api = self.inner.api.clone();
            let payload = payload.clone();
            requests.spawn(async move { (idx, api.update_diet_item(&payload).await) });
        }

        let mut accepted = Vec::new();
        let mut failures = Vec::new();
        while let Some(joined) = requests.join_next().await {
            match joined {
                Ok((idx, Ok(()))) => accepted.push(idx),
                Ok((_, Err(e))) => failures.push(e),
                Err(e) => failures.push(ApiError::Transport(e.to_string())),
            }
        }
        {
            let mut state = self.inner.state.lock().await;
            // rows stay dirty until a reload lands; accepted ones must retry
            // against what the server holds now
            for &idx in &accepted {
                let (original, _, payload) = &batch[idx];
                if let Some(row) = state.rows.iter_mut().find(|r| r.original == *original) {
                    row.mark_stored(payload);
                }
            }
            if let Some(first) = failures.first().cloned() {
                log::warn!(
                    "Failed to save {} of {} row(s): {}",
                    failures.len(),
                    batch.len(),
                    first
                );
                state.status = format!("Failed to save rows: {}", first);
                return Err(first.into());
            }
        }
        log::debug!("Saved {} row(s) in {:.2?}", batch.len(), now.elapsed());

        let saved = batch.len();
        let sent: Vec<(RowInputs, RowInputs)> = batch
            .into_iter()
            .map(|(original, current, _)| (original, current))
            .collect();
        self.reload(&sent).await?;

        log::info!("Saved {} row(s)", saved);
        self.set_status(format!(
            "Saved {} row(s) at {}.",
            saved,
            Local::now().format("%H:%M:%S")
        ))
        .await;
        Ok(SaveOutcome::Saved(saved))
    }
}

/// Puts unsaved input from `old` back onto freshly loaded rows. `sent` pairs
/// the snapshot of each row written by the last batch with the inputs that
/// were written; other rows are still stored as their `item` says.
fn carry_unsaved(
    old: &[EditableRow],
    fresh: &mut [EditableRow],
    sent: &[(RowInputs, RowInputs)],
) -> usize {
    let mut claimed = vec![false; fresh.len()];
    let mut carried = 0;

    for row in old {
        let held = RowInputs::from_item(&row.item);
        let stored = sent
            .iter()
            .find(|(original, _)| *original == row.original)
            .map(|(_, written)| written)
            .unwrap_or(&held);
        if row.current == *stored {
            continue;
        }
        if let Some(idx) = (0..fresh.len()).find(|&i| !claimed[i] && fresh[i].loaded_from(stored)) {
            claimed[idx] = true;
            fresh[idx].current = row.current.clone();
            carried += 1;
        }
    }

    carried
}
