use std::sync::{Arc, PoisonError, RwLock};

use log::info;

use crate::data::model::Dataset;
use crate::error::{AnalysisError, Result};

// ---------------------------------------------------------------------------
// Active dataset slot
// ---------------------------------------------------------------------------

/// Holds zero or one active dataset.
///
/// Writes replace the slot wholesale (last write wins). Readers get an
/// `Arc` snapshot, so a single operation sees one consistent dataset even if
/// another caller ingests while it runs. There is no read-after-write
/// ordering across callers; a transport layer that needs it must serialize
/// its own requests.
#[derive(Debug, Default)]
pub struct DatasetStore {
    active: RwLock<Option<Arc<Dataset>>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active dataset unconditionally.
    pub fn set(&self, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        // The slot only ever holds a complete dataset, so a poisoned lock is safe to reuse.
        let mut slot = self.active.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            info!("Replacing active dataset");
        }
        *slot = Some(Arc::clone(&dataset));
        dataset
    }

    /// Snapshot of the active dataset.
    pub fn get(&self) -> Result<Arc<Dataset>> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(AnalysisError::NoActiveDataset)
    }

    pub fn is_empty(&self) -> bool {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Column, DType, Value};

    fn single(name: &str) -> Dataset {
        Dataset::new(vec![Column::new(name, DType::Integer, vec![Value::Integer(1)])]).unwrap()
    }

    #[test]
    fn test_empty_store_reports_no_dataset() {
        let store = DatasetStore::new();
        assert!(store.is_empty());
        assert!(matches!(store.get(), Err(AnalysisError::NoActiveDataset)));
    }

    #[test]
    fn test_set_replaces_previous() {
        let store = DatasetStore::new();
        store.set(single("first"));
        let snapshot = store.get().unwrap();
        store.set(single("second"));

        assert_eq!(store.get().unwrap().column_names(), vec!["second"]);
        // Earlier snapshots are unaffected by replacement.
        assert_eq!(snapshot.column_names(), vec!["first"]);
    }
}
