//! Part aggregate model.
//!
//! # Responsibility
//! - Define the in-memory shape of a part and its owned/shared sub-entities.
//! - Provide boundary validation and the update-subset merge rule.
//!
//! # Invariants
//! - `id` is `None` until the store assigns it and never changes afterwards.
//! - `shipment_packaging` is always present (zero-valued by default).
//! - `version` is a caller-defined tag; the store never increments it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store-assigned identity of a part.
pub type PartId = i64;

/// Store-assigned identity of a shared attribute.
pub type AttributeId = i64;

/// Boundary validation failures for incoming part values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PartValidationError {
    #[error("part name must not be empty")]
    EmptyName,
    #[error("part sku must not be empty")]
    EmptySku,
    #[error("part price must be a finite non-negative number, got {0}")]
    InvalidPrice(f64),
    #[error("packaging weight must be a finite non-negative number, got {0}")]
    InvalidPackagingWeight(f64),
}

/// Shipping descriptor stored inline with its part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipmentPackaging {
    pub weight: f64,
    /// Free-form size label, e.g. `Small`.
    pub size: String,
    pub hazardous: bool,
    pub fragile: bool,
}

/// Name/value pair that may be shared by many parts.
///
/// An attribute with `id: None` is created on write; one with `id: Some(_)`
/// references an existing shared row and overwrites its name and value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AttributeId>,
    pub name: String,
    pub value: String,
}

impl Attribute {
    /// Creates a not-yet-persisted attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Vehicle a part fits. Owned by exactly one part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fitment {
    pub year: i32,
    pub make: String,
    pub model: String,
}

impl Fitment {
    pub fn new(year: i32, make: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            year,
            make: make.into(),
            model: model.into(),
        }
    }
}

/// Image reference. Owned by exactly one part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub image_url: String,
}

impl Image {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
        }
    }
}

/// Free-form key/value entry. Owned by exactly one part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub key: String,
    pub value: String,
}

impl Metadata {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Aggregate root for one catalog part.
///
/// Lists may be empty; a part returned by a repository always has every list
/// loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Assigned by the store on create. Ignored on create input.
    #[serde(default)]
    pub id: Option<PartId>,
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub shipment_packaging: ShipmentPackaging,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub fitments: Vec<Fitment>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub metadata: Vec<Metadata>,
    /// Caller-defined tag for point-in-time lookup. Not a revision counter.
    #[serde(default)]
    pub version: i64,
    /// Epoch milliseconds, store-assigned.
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Epoch milliseconds, store-assigned.
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl Part {
    /// Creates an unsaved part with empty collections and zeroed packaging.
    pub fn new(name: impl Into<String>, sku: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sku: sku.into(),
            ..Self::default()
        }
    }

    /// Checks the boundary rules applied before a part reaches storage.
    ///
    /// # Errors
    /// - `EmptyName` / `EmptySku` when the trimmed value is empty.
    /// - `InvalidPrice` when price is negative, NaN or infinite.
    /// - `InvalidPackagingWeight` under the same rule for packaging weight.
    pub fn validate(&self) -> Result<(), PartValidationError> {
        if self.name.trim().is_empty() {
            return Err(PartValidationError::EmptyName);
        }
        if self.sku.trim().is_empty() {
            return Err(PartValidationError::EmptySku);
        }
        if !is_non_negative(self.price) {
            return Err(PartValidationError::InvalidPrice(self.price));
        }
        let weight = self.shipment_packaging.weight;
        if !is_non_negative(weight) {
            return Err(PartValidationError::InvalidPackagingWeight(weight));
        }
        Ok(())
    }

    /// Copies the replaceable fields of `incoming` onto this part.
    ///
    /// Identity, version, fitments, images and timestamps are left as-is.
    pub fn apply_replacement(&mut self, incoming: &Part) {
        self.name = incoming.name.clone();
        self.sku = incoming.sku.clone();
        self.description = incoming.description.clone();
        self.price = incoming.price;
        self.location = incoming.location.clone();
        self.shipment_packaging = incoming.shipment_packaging.clone();
        self.metadata = incoming.metadata.clone();
        self.attributes = incoming.attributes.clone();
    }
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
