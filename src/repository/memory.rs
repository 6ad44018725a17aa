//! In-memory repository

use parking_lot::RwLock;

use super::{modify_first, remove_all, replace_first, CarRepository};
use crate::error::{Result, VaultError};
use crate::model::Car;

/// [`CarRepository`] over a `Vec` held in memory; nothing survives a restart
#[derive(Default)]
pub struct InMemoryCarRepository {
    cars: RwLock<Vec<Car>>,
}

impl InMemoryCarRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing collection
    pub fn with_cars(cars: Vec<Car>) -> Self {
        Self {
            cars: RwLock::new(cars),
        }
    }
}

impl CarRepository for InMemoryCarRepository {
    fn find_all(&self) -> Result<Vec<Car>> {
        Ok(self.cars.read().clone())
    }

    fn find_by_id(&self, id: &str) -> Result<Car> {
        self.cars
            .read()
            .iter()
            .find(|car| car.id == id)
            .cloned()
            .ok_or_else(|| VaultError::NotFound(id.to_string()))
    }

    fn create(&self, car: &Car) -> Result<()> {
        self.cars.write().push(car.clone());
        Ok(())
    }

    fn update(&self, car: &Car) -> Result<()> {
        if replace_first(&mut self.cars.write(), car) {
            Ok(())
        } else {
            Err(VaultError::NotFound(car.id.clone()))
        }
    }

    fn update_with(&self, id: &str, modify: &mut dyn FnMut(&mut Car)) -> Result<Car> {
        modify_first(&mut self.cars.write(), id, modify)
            .ok_or_else(|| VaultError::NotFound(id.to_string()))
    }

    fn delete(&self, id: &str) -> Result<()> {
        if remove_all(&mut self.cars.write(), id) {
            Ok(())
        } else {
            Err(VaultError::NotFound(id.to_string()))
        }
    }

    fn find_by_brand(&self, brand: &str) -> Result<Vec<Car>> {
        Ok(self
            .cars
            .read()
            .iter()
            .filter(|car| car.brand == brand)
            .cloned()
            .collect())
    }
}
