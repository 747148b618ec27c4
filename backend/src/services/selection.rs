use anyhow::{Context, Result};
use log::info;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use crate::models::{PersistedState, VideoRecord, VideoRow};
use crate::services::state_store::StateStore;

/// Selected video ids, kept apart from the immutable search results.
#[derive(Default)]
pub struct SelectionStore {
    selected: Mutex<BTreeSet<String>>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ids_mut(&self) -> MutexGuard<'_, BTreeSet<String>> {
        self.selected.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns true if the id was not selected before.
    pub fn select(&self, video_id: &str) -> bool {
        self.ids_mut().insert(video_id.to_string())
    }

    pub fn deselect(&self, video_id: &str) -> bool {
        self.ids_mut().remove(video_id)
    }

    pub fn clear(&self) {
        self.ids_mut().clear();
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids_mut().iter().cloned().collect()
    }

    pub fn rows(&self, records: &[VideoRecord]) -> Vec<VideoRow> {
        let ids = self.ids_mut();
        records
            .iter()
            .map(|record| VideoRow {
                selected: ids.contains(&record.video_id),
                record: record.clone(),
            })
            .collect()
    }

    pub fn save_to(&self, store: &dyn StateStore) -> Result<()> {
        let state = PersistedState {
            selected_video_ids: self.ids(),
            saved_at: Some(chrono::Utc::now()),
        };
        let blob = serde_json::to_vec(&state).context("Failed to serialize selection")?;
        store.save(&blob)
    }

    pub fn load_from(store: &dyn StateStore) -> Result<Self> {
        let selection = Self::new();
        if let Some(blob) = store.load()? {
            let state: PersistedState =
                serde_json::from_slice(&blob).context("Failed to parse persisted state")?;
            info!(
                "Restored {} selected videos",
                state.selected_video_ids.len()
            );
            selection.ids_mut().extend(state.selected_video_ids);
        }
        Ok(selection)
    }
}
