//! Repository Module
//!
//! Entity-shaped CRUD over a whole vehicle collection.
//!
//! ## Responsibilities
//! - Map find/create/update/delete onto load-modify-save of the collection
//! - Report missing records as `NotFound`
//! - Hide the backend from the service (file today, anything tomorrow)
//!
//! ## Implementations
//! - [`FileCarRepository`]: JSON file through [`JsonStore`](crate::store::JsonStore)
//! - [`InMemoryCarRepository`]: a `Vec` behind a lock, no persistence

mod file;
mod memory;

pub use file::FileCarRepository;
pub use memory::InMemoryCarRepository;

use crate::error::Result;
use crate::model::Car;

/// Capability the service depends on
///
/// Uniqueness of ids is the caller's job; `create` does not check for
/// duplicates.
pub trait CarRepository: Send + Sync {
    /// Every record in collection order. Missing or empty storage yields an
    /// empty vec.
    fn find_all(&self) -> Result<Vec<Car>>;

    fn find_by_id(&self, id: &str) -> Result<Car>;

    /// Append a record
    fn create(&self, car: &Car) -> Result<()>;

    /// Replace the first record with the same id
    fn update(&self, car: &Car) -> Result<()>;

    /// Modify the first record with this id in place and return the result
    ///
    /// Lookup, `modify` and write-back happen as one step, so a concurrent
    /// mutation cannot commit in between. The record keeps its id whatever
    /// `modify` does.
    fn update_with(&self, id: &str, modify: &mut dyn FnMut(&mut Car)) -> Result<Car>;

    /// Remove every record with this id
    fn delete(&self, id: &str) -> Result<()>;

    /// Records whose brand equals `brand`, in collection order
    fn find_by_brand(&self, brand: &str) -> Result<Vec<Car>>;
}

/// Replace the first record whose id matches. Returns false if none did.
fn replace_first(cars: &mut [Car], car: &Car) -> bool {
    match cars.iter_mut().find(|c| c.id == car.id) {
        Some(slot) => {
            *slot = car.clone();
            true
        }
        None => false,
    }
}

/// Apply `modify` to the first record with `id`. Returns the modified copy,
/// or `None` if no record matched.
fn modify_first(cars: &mut [Car], id: &str, modify: &mut dyn FnMut(&mut Car)) -> Option<Car> {
    let slot = cars.iter_mut().find(|c| c.id == id)?;
    modify(slot);
    slot.id = id.to_string();
    Some(slot.clone())
}

/// Remove every record with `id`. Returns false if nothing was removed.
fn remove_all(cars: &mut Vec<Car>, id: &str) -> bool {
    let before = cars.len();
    cars.retain(|c| c.id != id);
    cars.len() != before
}
