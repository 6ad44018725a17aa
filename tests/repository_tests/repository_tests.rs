//! Tests for CarRepository implementations
//!
//! These tests verify:
//! - Empty/missing collections
//! - find_by_id / update / delete NotFound handling
//! - find_by_brand ordering
//! - Persistence across repository instances
//! - Concurrent creates do not lose records
//! - The in-memory repository honours the same contract

use std::sync::Arc;
use std::thread;

use carvault::model::{generate_id, Car, NewCar};
use carvault::repository::{CarRepository, FileCarRepository, InMemoryCarRepository};
use carvault::store::JsonStore;
use carvault::VaultError;
use chrono::Utc;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

const FILE: &str = "cars.json";

fn setup_file_repo() -> (TempDir, FileCarRepository) {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(JsonStore::open(temp_dir.path()).unwrap());
    (temp_dir, FileCarRepository::new(store, FILE))
}

fn car(brand: &str, model: &str) -> Car {
    Car::from_new(NewCar::new(brand, model), generate_id(), Utc::now())
}

/// Contract checks shared by every implementation
fn exercise_contract(repo: &dyn CarRepository) {
    assert!(repo.find_all().unwrap().is_empty());

    let corolla = car("Toyota", "Corolla");
    let civic = car("Honda", "Civic");
    repo.create(&corolla).unwrap();
    repo.create(&civic).unwrap();

    assert_eq!(repo.find_all().unwrap(), vec![corolla.clone(), civic.clone()]);
    assert_eq!(repo.find_by_id(&civic.id).unwrap(), civic);

    let mut camry = corolla.clone();
    camry.model = "Camry".to_string();
    repo.update(&camry).unwrap();
    assert_eq!(repo.find_by_id(&corolla.id).unwrap().model, "Camry");

    let tuned = repo
        .update_with(&corolla.id, &mut |c: &mut Car| c.mileage = Some(1200.0))
        .unwrap();
    assert_eq!(tuned.model, "Camry");
    assert_eq!(tuned.mileage, Some(1200.0));
    assert_eq!(repo.find_by_id(&corolla.id).unwrap(), tuned);
    assert!(matches!(
        repo.update_with("ghost", &mut |_: &mut Car| {}),
        Err(VaultError::NotFound(_))
    ));

    repo.delete(&civic.id).unwrap();
    assert!(matches!(repo.find_by_id(&civic.id), Err(VaultError::NotFound(_))));
    assert_eq!(repo.find_all().unwrap(), vec![tuned]);
}

/// Every thread bumps the same record; each bump must see the previous one
fn exercise_concurrent_update_with(repo: Arc<dyn CarRepository>) {
    let counter = car("Toyota", "Corolla");
    repo.create(&counter).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let id = counter.id.clone();
            thread::spawn(move || {
                for _ in 0..10 {
                    repo.update_with(&id, &mut |c: &mut Car| {
                        c.mileage = Some(c.mileage.unwrap_or(0.0) + 1.0)
                    })
                    .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(repo.find_by_id(&counter.id).unwrap().mileage, Some(80.0));
}

// =============================================================================
// File Repository: Read Tests
// =============================================================================

#[test]
fn test_find_all_on_missing_file_is_empty() {
    let (_temp, repo) = setup_file_repo();

    assert!(repo.find_all().unwrap().is_empty());
    assert!(!repo.store().exists(FILE));
}

#[test]
fn test_find_all_is_idempotent() {
    let (_temp, repo) = setup_file_repo();
    repo.create(&car("Toyota", "Yaris")).unwrap();
    repo.create(&car("Mazda", "3")).unwrap();

    let first = repo.find_all().unwrap();
    let second = repo.find_all().unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_find_by_id_missing_is_not_found() {
    let (_temp, repo) = setup_file_repo();
    repo.create(&car("Toyota", "Yaris")).unwrap();

    let result = repo.find_by_id("does-not-exist");

    assert!(matches!(result, Err(VaultError::NotFound(ref id)) if id == "does-not-exist"));
}

#[test]
fn test_find_by_brand_keeps_insertion_order() {
    let (_temp, repo) = setup_file_repo();
    let first = car("Toyota", "Corolla");
    let honda = car("Honda", "Fit");
    let second = car("Toyota", "Prius");
    repo.create(&first).unwrap();
    repo.create(&honda).unwrap();
    repo.create(&second).unwrap();

    let toyotas = repo.find_by_brand("Toyota").unwrap();

    assert_eq!(toyotas, vec![first, second]);
}

#[test]
fn test_find_by_brand_no_match_is_empty() {
    let (_temp, repo) = setup_file_repo();
    repo.create(&car("Toyota", "Corolla")).unwrap();

    assert!(repo.find_by_brand("toyota").unwrap().is_empty());
}

// =============================================================================
// File Repository: Write Tests
// =============================================================================

#[test]
fn test_create_persists_to_file() {
    let (temp, repo) = setup_file_repo();
    let corolla = car("Toyota", "Corolla");

    repo.create(&corolla).unwrap();

    let text = std::fs::read_to_string(temp.path().join(FILE)).unwrap();
    let on_disk: Vec<Car> = serde_json::from_str(&text).unwrap();
    assert_eq!(on_disk, vec![corolla]);
}

#[test]
fn test_create_does_not_dedupe_ids() {
    let (_temp, repo) = setup_file_repo();
    let corolla = car("Toyota", "Corolla");

    repo.create(&corolla).unwrap();
    repo.create(&corolla).unwrap();

    assert_eq!(repo.find_all().unwrap().len(), 2);
}

#[test]
fn test_update_missing_is_not_found_and_leaves_file() {
    let (_temp, repo) = setup_file_repo();
    let corolla = car("Toyota", "Corolla");
    repo.create(&corolla).unwrap();

    let ghost = car("Ghost", "Car");
    let result = repo.update(&ghost);

    assert!(matches!(result, Err(VaultError::NotFound(_))));
    assert_eq!(repo.find_all().unwrap(), vec![corolla]);
}

#[test]
fn test_update_replaces_only_first_match() {
    let (_temp, repo) = setup_file_repo();
    let corolla = car("Toyota", "Corolla");
    repo.create(&corolla).unwrap();
    repo.create(&corolla).unwrap();

    let mut changed = corolla.clone();
    changed.model = "Camry".to_string();
    repo.update(&changed).unwrap();

    let all = repo.find_all().unwrap();
    assert_eq!(all[0].model, "Camry");
    assert_eq!(all[1].model, "Corolla");
}

#[test]
fn test_delete_missing_is_not_found() {
    let (_temp, repo) = setup_file_repo();

    assert!(matches!(repo.delete("nope"), Err(VaultError::NotFound(_))));
}

#[test]
fn test_persists_across_instances() {
    let temp_dir = TempDir::new().unwrap();
    let corolla = car("Toyota", "Corolla");

    {
        let store = Arc::new(JsonStore::open(temp_dir.path()).unwrap());
        let repo = FileCarRepository::new(store, FILE);
        repo.create(&corolla).unwrap();
    }

    {
        let store = Arc::new(JsonStore::open(temp_dir.path()).unwrap());
        let repo = FileCarRepository::new(store, FILE);
        assert_eq!(repo.find_by_id(&corolla.id).unwrap(), corolla);
    }
}

#[test]
fn test_corrupt_collection_surfaces_error() {
    let (temp, repo) = setup_file_repo();
    std::fs::write(temp.path().join(FILE), b"{oops").unwrap();

    assert!(matches!(repo.find_all(), Err(VaultError::CorruptData(_))));
    assert!(matches!(
        repo.create(&car("Toyota", "Corolla")),
        Err(VaultError::CorruptData(_))
    ));
}

#[test]
fn test_concurrent_creates_keep_every_record() {
    let (_temp, repo) = setup_file_repo();
    let repo = Arc::new(repo);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                for i in 0..10 {
                    repo.create(&car("Brand", &format!("{}-{}", t, i))).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(repo.find_all().unwrap().len(), 80);
}

#[test]
fn test_update_with_keeps_id() {
    let (_temp, repo) = setup_file_repo();
    let corolla = car("Toyota", "Corolla");
    repo.create(&corolla).unwrap();

    let updated = repo
        .update_with(&corolla.id, &mut |c: &mut Car| c.id = "hijacked".to_string())
        .unwrap();

    assert_eq!(updated.id, corolla.id);
    assert!(matches!(repo.find_by_id("hijacked"), Err(VaultError::NotFound(_))));
}

#[test]
fn test_update_with_missing_leaves_file() {
    let (_temp, repo) = setup_file_repo();
    let corolla = car("Toyota", "Corolla");
    repo.create(&corolla).unwrap();

    let result = repo.update_with("ghost", &mut |c: &mut Car| c.model = "X".to_string());

    assert!(matches!(result, Err(VaultError::NotFound(_))));
    assert_eq!(repo.find_all().unwrap(), vec![corolla]);
}

#[test]
fn test_file_concurrent_update_with_loses_nothing() {
    let (_temp, repo) = setup_file_repo();
    exercise_concurrent_update_with(Arc::new(repo));
}

#[test]
fn test_file_repository_contract() {
    let (_temp, repo) = setup_file_repo();
    exercise_contract(&repo);
}

// =============================================================================
// In-Memory Repository Tests
// =============================================================================

#[test]
fn test_in_memory_repository_contract() {
    let repo = InMemoryCarRepository::new();
    exercise_contract(&repo);
}

#[test]
fn test_in_memory_concurrent_update_with_loses_nothing() {
    exercise_concurrent_update_with(Arc::new(InMemoryCarRepository::new()));
}

#[test]
fn test_in_memory_with_seed() {
    let corolla = car("Toyota", "Corolla");
    let repo = InMemoryCarRepository::with_cars(vec![corolla.clone()]);

    assert_eq!(repo.find_by_brand("Toyota").unwrap(), vec![corolla]);
    assert!(matches!(repo.delete("nope"), Err(VaultError::NotFound(_))));
}
