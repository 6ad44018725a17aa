//! File-backed repository

use std::sync::Arc;

use parking_lot::Mutex;

use super::{modify_first, remove_all, replace_first, CarRepository};
use crate::error::{Result, VaultError};
use crate::model::Car;
use crate::store::JsonStore;

/// [`CarRepository`] persisting the collection as one JSON file
///
/// ## Concurrency Model
/// - Reads go straight to the store (shared lock inside `JsonStore`)
/// - Mutations are load → modify → save. `write_lock` serializes whole
///   cycles so two concurrent creates cannot both start from the same
///   snapshot and drop each other's record.
pub struct FileCarRepository {
    store: Arc<JsonStore>,

    /// Collection file name inside the store
    file_name: String,

    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileCarRepository {
    pub fn new(store: Arc<JsonStore>, file_name: impl Into<String>) -> Self {
        Self {
            store,
            file_name: file_name.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    fn load(&self) -> Result<Vec<Car>> {
        self.store.load::<Vec<Car>>(&self.file_name).map_err(|e| {
            tracing::error!("Failed to load {}: {}", self.file_name, e);
            e
        })
    }

    fn save(&self, cars: &[Car]) -> Result<()> {
        self.store.save(&self.file_name, cars).map_err(|e| {
            tracing::error!("Failed to save {}: {}", self.file_name, e);
            e
        })
    }
}

impl CarRepository for FileCarRepository {
    fn find_all(&self) -> Result<Vec<Car>> {
        let cars = self.load()?;
        tracing::debug!("Loaded {} records from {}", cars.len(), self.file_name);
        Ok(cars)
    }

    fn find_by_id(&self, id: &str) -> Result<Car> {
        self.load()?
            .into_iter()
            .find(|car| car.id == id)
            .ok_or_else(|| {
                tracing::debug!("Record {} not found", id);
                VaultError::NotFound(id.to_string())
            })
    }

    fn create(&self, car: &Car) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        let mut cars = self.load()?;
        cars.push(car.clone());
        self.save(&cars)?;

        tracing::debug!("Created record {}", car.id);
        Ok(())
    }

    fn update(&self, car: &Car) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        let mut cars = self.load()?;
        if !replace_first(&mut cars, car) {
            tracing::warn!("Record {} to update not found", car.id);
            return Err(VaultError::NotFound(car.id.clone()));
        }
        self.save(&cars)?;

        tracing::debug!("Updated record {}", car.id);
        Ok(())
    }

    fn update_with(&self, id: &str, modify: &mut dyn FnMut(&mut Car)) -> Result<Car> {
        let _write_guard = self.write_lock.lock();

        let mut cars = self.load()?;
        let Some(car) = modify_first(&mut cars, id, modify) else {
            tracing::warn!("Record {} to update not found", id);
            return Err(VaultError::NotFound(id.to_string()));
        };
        self.save(&cars)?;

        tracing::debug!("Updated record {} in place", id);
        Ok(car)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        let mut cars = self.load()?;
        if !remove_all(&mut cars, id) {
            tracing::warn!("Record {} to delete not found", id);
            return Err(VaultError::NotFound(id.to_string()));
        }
        self.save(&cars)?;

        tracing::debug!("Deleted record {}", id);
        Ok(())
    }

    fn find_by_brand(&self, brand: &str) -> Result<Vec<Car>> {
        let matches: Vec<Car> = self
            .load()?
            .into_iter()
            .filter(|car| car.brand == brand)
            .collect();

        tracing::debug!("{} records with brand {}", matches.len(), brand);
        Ok(matches)
    }
}
