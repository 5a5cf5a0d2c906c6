//! In-process draft storage.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Mutex, PoisonError};

use crate::model::TripPlan;
use crate::traits::DraftStore;

/// Keeps drafts in memory for the lifetime of the store.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<HashMap<String, TripPlan>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.drafts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DraftStore for MemoryDraftStore {
    type Error = Infallible;

    fn save(&self, draft_id: &str, plan: &TripPlan) -> Result<(), Self::Error> {
        self.drafts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(draft_id.to_string(), plan.clone());
        Ok(())
    }

    fn load(&self, draft_id: &str) -> Result<Option<TripPlan>, Self::Error> {
        Ok(self
            .drafts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(draft_id)
            .cloned())
    }

    fn discard(&self, draft_id: &str) -> Result<bool, Self::Error> {
        Ok(self
            .drafts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(draft_id)
            .is_some())
    }
}
