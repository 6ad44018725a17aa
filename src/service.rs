//! Service Module
//!
//! Orchestrates the repository and the optional cache.
//!
//! ## Responsibilities
//! - Assign ids and timestamps; clients never supply them
//! - Write to the repository first, then best-effort to the cache
//! - Serve point lookups cache-aside when a cache is present
//! - Absorb cache failures that do not affect the authoritative result

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::cache::Cache;
use crate::error::{Result, VaultError};
use crate::model::{cache_key, generate_id, Car, CarPatch, NewCar};
use crate::repository::CarRepository;

/// Vehicle record service
///
/// ## Cache presence
/// Decided once at construction and never re-evaluated. With no cache,
/// every operation is a plain passthrough to the repository.
///
/// ## Write path
/// ```text
///  validate ──▶ repository (must succeed) ──▶ cache (failure = warn log)
/// ```
pub struct CarService {
    repo: Arc<dyn CarRepository>,
    cache: Option<Cache>,
    ttl: Duration,
}

impl CarService {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

    /// Extra attempts for the cache write after a create or update
    const MIRROR_RETRIES: u32 = 2;
    const MIRROR_RETRY_DELAY: Duration = Duration::from_millis(50);

    pub fn new(repo: Arc<dyn CarRepository>, cache: Option<Cache>) -> Self {
        match &cache {
            Some(cache) => tracing::info!("Car service using {} cache", cache.backend_name()),
            None => tracing::info!("Car service running without cache"),
        }

        Self {
            repo,
            cache,
            ttl: Self::DEFAULT_TTL,
        }
    }

    /// Set the TTL of cached records
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub fn cache(&self) -> Option<&Cache> {
        self.cache.as_ref()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Every record, straight from the repository
    pub fn get_all(&self) -> Result<Vec<Car>> {
        tracing::info!("Listing all cars");
        self.repo.find_all()
    }

    /// One record, cache-aside when a cache is present
    ///
    /// A fallback that fails with `NotFound` surfaces as plain `NotFound`.
    pub fn get_by_id(&self, id: &str) -> Result<Car> {
        tracing::info!("Fetching car {}", id);

        let Some(cache) = &self.cache else {
            return self.repo.find_by_id(id);
        };

        cache
            .get_with_fallback(&cache_key(id), || self.repo.find_by_id(id), self.ttl)
            .map_err(|e| {
                if e.is_not_found() {
                    e.into_authoritative()
                } else {
                    tracing::error!("Fetching car {} failed: {}", id, e);
                    e
                }
            })
    }

    /// Records of one brand, straight from the repository
    pub fn find_by_brand(&self, brand: &str) -> Result<Vec<Car>> {
        tracing::info!("Finding cars by brand {}", brand);
        self.repo.find_by_brand(brand)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create a record with a fresh id and creation time
    pub fn create(&self, new: NewCar) -> Result<Car> {
        new.validate()?;
        tracing::info!("Creating car {} {}", new.brand, new.model);

        let car = Car::from_new(new, generate_id(), Utc::now());
        self.repo.create(&car).map_err(|e| {
            tracing::error!("Creating car failed: {}", e);
            e
        })?;

        self.mirror(&car);
        Ok(car)
    }

    /// Apply `patch` to record `id`, stamping `updated_at`
    ///
    /// `id` and `created_at` are carried over from the stored record. The
    /// merge runs inside the repository's write step, so concurrent updates
    /// to other fields are kept.
    pub fn update(&self, id: &str, patch: CarPatch) -> Result<Car> {
        patch.validate()?;
        tracing::info!("Updating car {}", id);

        let updated_at = Utc::now();
        let car = self
            .repo
            .update_with(id, &mut |stored: &mut Car| {
                stored.apply(patch.clone());
                stored.updated_at = Some(updated_at);
            })
            .map_err(|e| {
                if !matches!(e, VaultError::NotFound(_)) {
                    tracing::error!("Updating car {} failed: {}", id, e);
                }
                e
            })?;

        self.mirror(&car);
        Ok(car)
    }

    /// Remove record `id` and invalidate its cache entry
    pub fn delete(&self, id: &str) -> Result<()> {
        tracing::info!("Deleting car {}", id);

        self.repo.delete(id).map_err(|e| {
            if !matches!(e, VaultError::NotFound(_)) {
                tracing::error!("Deleting car {} failed: {}", id, e);
            }
            e
        })?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.delete(&cache_key(id)) {
                tracing::warn!("Cache invalidation of car {} failed: {}", id, e);
            }
        }
        Ok(())
    }

    /// Best-effort copy of `car` into the cache, retried briefly
    fn mirror(&self, car: &Car) {
        if let Some(cache) = &self.cache {
            let result = cache.set_with_retry(
                &car.cache_key(),
                car,
                self.ttl,
                Self::MIRROR_RETRIES,
                Self::MIRROR_RETRY_DELAY,
            );
            if let Err(e) = result {
                tracing::warn!("Caching car {} failed: {}", car.id, e);
            }
        }
    }
}
