//! Persistence of fitted models

use crate::error::{ForecastError, Result};
use crate::models::PersistableModel;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A serialized model together with its bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub model_type: String,
    pub model_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Last slot of the training history the model was fitted on
    pub last_training_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ModelRecord {
    /// Serialize `model` into a fresh record stamped with `now`
    pub fn from_model<M: PersistableModel>(
        model_type: &str,
        model: &M,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let mut metadata = BTreeMap::new();
        metadata.insert("model_name".to_string(), model.name().to_string());
        if let Some(history) = model.history() {
            metadata.insert("training_rows".to_string(), history.len().to_string());
        }

        Ok(Self {
            model_type: model_type.to_string(),
            model_data: model.to_model_data()?,
            created_at: now,
            updated_at: now,
            last_training_date: model.history().and_then(|h| h.last_timestamp()),
            metadata,
        })
    }

    /// Rebuild the model stored in this record
    pub fn to_model<M: PersistableModel>(&self) -> Result<M> {
        M::from_model_data(self.model_data.clone())
    }
}

/// Storage of model records keyed by model type
pub trait ModelStore: Send + Sync {
    /// Store `record` as the latest version of its model type
    fn save(&self, record: ModelRecord) -> Result<()>;

    /// The most recently updated record of `model_type`
    fn load_latest(&self, model_type: &str) -> Result<ModelRecord>;
}

fn not_found(model_type: &str) -> ForecastError {
    ForecastError::ModelUnavailable(format!("No stored model of type '{}'", model_type))
}

/// Keeps the latest saved record of each model type in memory
#[derive(Debug, Default)]
pub struct InMemoryModelStore {
    records: Mutex<Vec<ModelRecord>>,
}

impl InMemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of model types stored
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ModelStore for InMemoryModelStore {
    fn save(&self, mut record: ModelRecord) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| ForecastError::StorageError(e.to_string()))?;
        if let Some(index) = records.iter().position(|r| r.model_type == record.model_type) {
            let previous = records.swap_remove(index);
            record.created_at = previous.created_at;
        }
        records.push(record);
        Ok(())
    }

    fn load_latest(&self, model_type: &str) -> Result<ModelRecord> {
        let records = self
            .records
            .lock()
            .map_err(|e| ForecastError::StorageError(e.to_string()))?;
        records
            .iter()
            .filter(|r| r.model_type == model_type)
            .max_by_key(|r| r.updated_at)
            .cloned()
            .ok_or_else(|| not_found(model_type))
    }
}

/// One `<model_type>.json` file per model type in a directory
#[derive(Debug, Clone)]
pub struct JsonFileModelStore {
    dir: PathBuf,
}

impl JsonFileModelStore {
    /// Open a store in `dir`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            ForecastError::StorageError(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, model_type: &str) -> Result<PathBuf> {
        let valid = !model_type.is_empty()
            && model_type
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ForecastError::InvalidParameter(format!(
                "Invalid model type '{}'",
                model_type
            )));
        }
        Ok(self.dir.join(format!("{}.json", model_type)))
    }
}

impl ModelStore for JsonFileModelStore {
    fn save(&self, mut record: ModelRecord) -> Result<()> {
        let path = self.path_for(&record.model_type)?;
        if let Ok(previous) = self.load_latest(&record.model_type) {
            record.created_at = previous.created_at;
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&record)?)?;
        fs::rename(&tmp, &path)?;
        debug!("Saved model '{}' to {}", record.model_type, path.display());
        Ok(())
    }

    fn load_latest(&self, model_type: &str) -> Result<ModelRecord> {
        let path = self.path_for(model_type)?;
        if !path.exists() {
            return Err(not_found(model_type));
        }
        let content = fs::read(&path)?;
        Ok(serde_json::from_slice(&content)?)
    }
}
