//! Vehicle record types
//!
//! `Car` is what gets persisted and cached. `NewCar` and `CarPatch` are the
//! shapes clients send for create and update; neither carries an id or
//! timestamps, so those stay server-controlled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, VaultError};

/// A single vehicle record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: String,
    pub brand: String,
    pub model: String,

    /// L/100km
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_consumption: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,

    /// km
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage: Option<f64>,

    /// km per year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_mileage: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_environment: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub usage_scenario: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,

    /// Set once at creation
    pub created_at: DateTime<Utc>,

    /// Absent until the first update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Car {
    /// Build a record from client input with a fresh id and creation time
    pub fn from_new(new: NewCar, id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            brand: new.brand,
            model: new.model,
            fuel_consumption: new.fuel_consumption,
            fuel_type: new.fuel_type,
            mileage: new.mileage,
            annual_mileage: new.annual_mileage,
            storage_environment: new.storage_environment,
            usage_scenario: new.usage_scenario,
            remarks: new.remarks,
            created_at,
            updated_at: None,
        }
    }

    /// Overwrite every field present in `patch`. `id` and `created_at` are
    /// untouched.
    pub fn apply(&mut self, patch: CarPatch) {
        if let Some(brand) = patch.brand {
            self.brand = brand;
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
        if patch.fuel_consumption.is_some() {
            self.fuel_consumption = patch.fuel_consumption;
        }
        if patch.fuel_type.is_some() {
            self.fuel_type = patch.fuel_type;
        }
        if patch.mileage.is_some() {
            self.mileage = patch.mileage;
        }
        if patch.annual_mileage.is_some() {
            self.annual_mileage = patch.annual_mileage;
        }
        if patch.storage_environment.is_some() {
            self.storage_environment = patch.storage_environment;
        }
        if let Some(scenarios) = patch.usage_scenario {
            self.usage_scenario = scenarios;
        }
        if patch.remarks.is_some() {
            self.remarks = patch.remarks;
        }
    }

    /// Cache key of this record (before namespacing)
    pub fn cache_key(&self) -> String {
        cache_key(&self.id)
    }
}

/// Logical cache key for a record id
pub fn cache_key(id: &str) -> String {
    format!("car:{}", id)
}

/// Input for creating a record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCar {
    pub brand: String,
    pub model: String,
    #[serde(default)]
    pub fuel_consumption: Option<f64>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub mileage: Option<f64>,
    #[serde(default)]
    pub annual_mileage: Option<f64>,
    #[serde(default)]
    pub storage_environment: Option<String>,
    #[serde(default)]
    pub usage_scenario: Vec<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl NewCar {
    pub fn new(brand: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    /// Brand and model are required
    pub fn validate(&self) -> Result<()> {
        if self.brand.trim().is_empty() {
            return Err(VaultError::Validation("brand must not be empty".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(VaultError::Validation("model must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Partial update; absent fields keep their stored values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarPatch {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub fuel_consumption: Option<f64>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub mileage: Option<f64>,
    #[serde(default)]
    pub annual_mileage: Option<f64>,
    #[serde(default)]
    pub storage_environment: Option<String>,
    #[serde(default)]
    pub usage_scenario: Option<Vec<String>>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl CarPatch {
    /// A patch may not blank out the required fields
    pub fn validate(&self) -> Result<()> {
        if matches!(&self.brand, Some(b) if b.trim().is_empty()) {
            return Err(VaultError::Validation("brand must not be empty".to_string()));
        }
        if matches!(&self.model, Some(m) if m.trim().is_empty()) {
            return Err(VaultError::Validation("model must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Generate a record id: 8 hex chars of a v4 UUID, a dash, then 6 base-36
/// chars of the current nanosecond timestamp.
pub fn generate_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default()
        .unsigned_abs();
    let stamp = to_base36(nanos);
    format!("{}-{}", &uuid[..8], &stamp[..stamp.len().min(6)])
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
