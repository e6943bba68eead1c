//! Part use-case service.
//!
//! # Responsibility
//! - Carry the route contract: validate input, then fetch-then-mutate for
//!   replace and delete.
//! - Classify failures into `ErrorKind` and route status codes.
//!
//! # Invariants
//! - Input is validated before any repository write.
//! - Replace copies only the replaceable field subset onto the stored part.
//! - Failures propagate unchanged; nothing is retried.

use crate::error::ErrorKind;
use crate::model::part::{Part, PartId, PartValidationError};
use crate::repo::part_repo::{PartRepository, RepoError};
use log::{error, warn};
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error returned by part use-cases.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] PartValidationError),
    /// Input that could not be decoded into a part at all.
    #[error("malformed part body: {0}")]
    Malformed(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Malformed(_) => ErrorKind::Validation,
            Self::Repo(err) => err.kind(),
        }
    }

    /// Route status code for this failure.
    pub fn status_code(&self) -> u16 {
        self.kind().http_status()
    }
}

/// Use-case service wrapper for part operations.
pub struct PartService<R: PartRepository> {
    repo: R,
}

impl<R: PartRepository> PartService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and persists a new part. Backs `POST /part`.
    pub fn create_part(&mut self, part: &Part) -> ServiceResult<Part> {
        let result = part
            .validate()
            .map_err(ServiceError::from)
            .and_then(|()| self.repo.create_part(part).map_err(ServiceError::from));
        log_outcome("part_create", None, &result);
        result
    }

    /// Backs `GET /part/:id`.
    pub fn get_part(&self, id: PartId) -> ServiceResult<Part> {
        let result = self.repo.get_part(id).map_err(ServiceError::from);
        log_outcome("part_get", Some(id), &result);
        result
    }

    /// Backs `GET /part/:id/:version`.
    pub fn get_part_by_version(&self, id: PartId, version: i64) -> ServiceResult<Part> {
        let result = self
            .repo
            .get_part_by_version(id, version)
            .map_err(ServiceError::from);
        log_outcome("part_get_version", Some(id), &result);
        result
    }

    /// Replaces the mutable subset of a stored part. Backs `PUT /part/:id`.
    ///
    /// # Contract
    /// - Identity in `incoming` is ignored; `id` selects the stored part.
    /// - Version, fitments and images keep their stored values.
    pub fn replace_part(&mut self, id: PartId, incoming: &Part) -> ServiceResult<Part> {
        let result = self.try_replace(id, incoming);
        log_outcome("part_replace", Some(id), &result);
        result
    }

    /// Tombstones a live part. Backs `DELETE /part/:id`.
    ///
    /// A part that is missing or already deleted yields `NotFound`.
    pub fn delete_part(&mut self, id: PartId) -> ServiceResult<()> {
        let result = self.try_delete(id);
        log_outcome("part_delete", Some(id), &result);
        result
    }

    fn try_replace(&mut self, id: PartId, incoming: &Part) -> ServiceResult<Part> {
        incoming.validate()?;
        let mut existing = self.repo.get_part(id)?;
        existing.apply_replacement(incoming);
        Ok(self.repo.update_part(&existing)?)
    }

    fn try_delete(&mut self, id: PartId) -> ServiceResult<()> {
        let existing = self.repo.get_part(id)?;
        self.repo.delete_part(&existing)?;
        Ok(())
    }
}

fn log_outcome<T>(event: &str, id: Option<PartId>, result: &ServiceResult<T>) {
    let Err(err) = result else {
        return;
    };
    let part_id = id.map_or_else(|| "none".to_string(), |id| id.to_string());
    match err.kind() {
        ErrorKind::Persistence => error!(
            "event={event} module=service status=error part_id={part_id} error_code=persistence error={err}"
        ),
        ErrorKind::NotFound => warn!(
            "event={event} module=service status=error part_id={part_id} error_code=not_found"
        ),
        ErrorKind::Validation => warn!(
            "event={event} module=service status=error part_id={part_id} error_code=validation error={err}"
        ),
    }
}
