//! Part repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Move the part aggregate to and from storage in atomic units.
//! - Own the replacement rules for nested collections on update.
//! - Serve exact `(id, version)` lookups.
//!
//! # Invariants
//! - Every read path filters out tombstoned rows (`deleted_at IS NOT NULL`).
//! - Create and update run in a single IMMEDIATE transaction each; any
//!   failure rolls the whole write back.
//! - Update never touches `version`, fitments or images.
//! - Delete only tombstones; rows and children stay physically present.
//! - `version` is not a concurrency token: concurrent updates of one part are
//!   last-writer-wins.
//! - Shared attribute rows are never deleted. Rows unlinked by an update stay
//!   behind, so id-less attributes sent on every update grow the table.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::error::ErrorKind;
use crate::model::part::{Attribute, Fitment, Image, Metadata, Part, PartId, ShipmentPackaging};
use log::info;
use rusqlite::{params, Connection, Params, Row, TransactionBehavior};
use std::collections::HashSet;
use thiserror::Error;

const PART_SELECT_SQL: &str = "SELECT
    id,
    name,
    sku,
    description,
    price,
    location,
    packaging_weight,
    packaging_size,
    packaging_hazardous,
    packaging_fragile,
    version,
    created_at,
    updated_at
FROM parts";

const REQUIRED_TABLES: &[&str] = &[
    "parts",
    "attributes",
    "part_attributes",
    "fitments",
    "images",
    "part_metadata",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for part persistence and lookup operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("part not found: {0}")]
    NotFound(PartId),
    #[error("part not found: {id} at version {version}")]
    VersionNotFound { id: PartId, version: i64 },
    #[error("part has no identity; only stored parts can be updated or deleted")]
    MissingIdentity,
    #[error("no live part to delete: {0}")]
    NothingToDelete(PartId),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("invalid persisted part data: {0}")]
    InvalidData(String),
    #[error("connection schema version {actual_version} does not match expected {expected_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),
}

impl RepoError {
    /// Classifies this error for callers that translate failures.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::VersionNotFound { .. } => ErrorKind::NotFound,
            Self::MissingIdentity => ErrorKind::Validation,
            Self::NothingToDelete(_)
            | Self::Db(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_) => ErrorKind::Persistence,
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for the part aggregate.
pub trait PartRepository {
    /// Persists root, packaging, children and attribute links atomically.
    ///
    /// Returns the stored aggregate with identity and timestamps assigned.
    fn create_part(&mut self, part: &Part) -> RepoResult<Part>;
    /// Loads one live part with every collection populated.
    fn get_part(&self, id: PartId) -> RepoResult<Part>;
    /// Overwrites scalars, packaging, metadata and attribute links.
    ///
    /// Version, fitments and images of the stored part are left untouched.
    fn update_part(&mut self, part: &Part) -> RepoResult<Part>;
    /// Tombstones a live part. Fails when no live row carries its identity.
    fn delete_part(&mut self, part: &Part) -> RepoResult<()>;
    /// Loads the live part whose identity and version both match exactly.
    fn get_part_by_version(&self, id: PartId, version: i64) -> RepoResult<Part>;
}

/// SQLite-backed part repository over an injected connection.
pub struct SqlitePartRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqlitePartRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not current.
    /// - `MissingRequiredTable` when a part table is absent.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PartRepository for SqlitePartRepository<'_> {
    fn create_part(&mut self, part: &Part) -> RepoResult<Part> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let packaging = &part.shipment_packaging;
        tx.execute(
            "INSERT INTO parts (
                name,
                sku,
                description,
                price,
                location,
                packaging_weight,
                packaging_size,
                packaging_hazardous,
                packaging_fragile,
                version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                part.name.as_str(),
                part.sku.as_str(),
                part.description.as_str(),
                part.price,
                part.location.as_str(),
                packaging.weight,
                packaging.size.as_str(),
                packaging.hazardous,
                packaging.fragile,
                part.version,
            ],
        )?;
        let id = tx.last_insert_rowid();

        insert_fitments(&tx, id, &part.fitments)?;
        insert_images(&tx, id, &part.images)?;
        insert_metadata(&tx, id, &part.metadata)?;
        link_attributes(&tx, id, &part.attributes)?;
        tx.commit()?;

        info!(
            "event=part_create module=repo status=ok part_id={id} version={} attributes={} fitments={} images={} metadata={}",
            part.version,
            part.attributes.len(),
            part.fitments.len(),
            part.images.len(),
            part.metadata.len()
        );
        self.get_part(id)
    }

    fn get_part(&self, id: PartId) -> RepoResult<Part> {
        find_live_part(&*self.conn, "id = ?1", [id])?.ok_or(RepoError::NotFound(id))
    }

    fn update_part(&mut self, part: &Part) -> RepoResult<Part> {
        let id = part.id.ok_or(RepoError::MissingIdentity)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let packaging = &part.shipment_packaging;
        let changed = tx.execute(
            "UPDATE parts
             SET
                name = ?2,
                sku = ?3,
                description = ?4,
                price = ?5,
                location = ?6,
                packaging_weight = ?7,
                packaging_size = ?8,
                packaging_hazardous = ?9,
                packaging_fragile = ?10,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND deleted_at IS NULL;",
            params![
                id,
                part.name.as_str(),
                part.sku.as_str(),
                part.description.as_str(),
                part.price,
                part.location.as_str(),
                packaging.weight,
                packaging.size.as_str(),
                packaging.hazardous,
                packaging.fragile,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        tx.execute("DELETE FROM part_metadata WHERE part_id = ?1;", [id])?;
        insert_metadata(&tx, id, &part.metadata)?;
        tx.execute("DELETE FROM part_attributes WHERE part_id = ?1;", [id])?;
        link_attributes(&tx, id, &part.attributes)?;
        tx.commit()?;

        info!(
            "event=part_update module=repo status=ok part_id={id} attributes={} metadata={}",
            part.attributes.len(),
            part.metadata.len()
        );
        self.get_part(id)
    }

    fn delete_part(&mut self, part: &Part) -> RepoResult<()> {
        let id = part.id.ok_or(RepoError::MissingIdentity)?;
        let changed = self.conn.execute(
            "UPDATE parts
             SET deleted_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND deleted_at IS NULL;",
            [id],
        )?;

        if changed == 0 {
            return Err(RepoError::NothingToDelete(id));
        }

        info!("event=part_delete module=repo status=ok part_id={id}");
        Ok(())
    }

    fn get_part_by_version(&self, id: PartId, version: i64) -> RepoResult<Part> {
        find_live_part(&*self.conn, "id = ?1 AND version = ?2", params![id, version])?
            .ok_or(RepoError::VersionNotFound { id, version })
    }
}

fn find_live_part<P: Params>(
    conn: &Connection,
    filter: &str,
    bind: P,
) -> RepoResult<Option<Part>> {
    let mut stmt = conn.prepare(&format!(
        "{PART_SELECT_SQL}
         WHERE {filter}
           AND deleted_at IS NULL
         LIMIT 1;"
    ))?;

    let mut rows = stmt.query(bind)?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    let (id, mut part) = parse_part_row(row)?;

    part.attributes = load_attributes(conn, id)?;
    part.fitments = load_fitments(conn, id)?;
    part.images = load_images(conn, id)?;
    part.metadata = load_metadata(conn, id)?;
    Ok(Some(part))
}

fn parse_part_row(row: &Row<'_>) -> RepoResult<(PartId, Part)> {
    let id: PartId = row.get("id")?;
    let part = Part {
        id: Some(id),
        name: row.get("name")?,
        sku: row.get("sku")?,
        description: row.get("description")?,
        price: row.get("price")?,
        location: row.get("location")?,
        shipment_packaging: ShipmentPackaging {
            weight: row.get("packaging_weight")?,
            size: row.get("packaging_size")?,
            hazardous: parse_flag(row, "packaging_hazardous")?,
            fragile: parse_flag(row, "packaging_fragile")?,
        },
        attributes: Vec::new(),
        fitments: Vec::new(),
        images: Vec::new(),
        metadata: Vec::new(),
        version: row.get("version")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    Ok((id, part))
}

fn parse_flag(row: &Row<'_>, column: &'static str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in parts.{column}"
        ))),
    }
}

fn load_attributes(conn: &Connection, part_id: PartId) -> RepoResult<Vec<Attribute>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.name, a.value
         FROM part_attributes pa
         INNER JOIN attributes a ON a.id = pa.attribute_id
         WHERE pa.part_id = ?1
         ORDER BY pa.position ASC;",
    )?;
    let attributes = stmt
        .query_map([part_id], |row| {
            Ok(Attribute {
                id: Some(row.get("id")?),
                name: row.get("name")?,
                value: row.get("value")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(attributes)
}

fn load_fitments(conn: &Connection, part_id: PartId) -> RepoResult<Vec<Fitment>> {
    let mut stmt = conn.prepare(
        "SELECT year, make, model
         FROM fitments
         WHERE part_id = ?1
         ORDER BY id ASC;",
    )?;
    let fitments = stmt
        .query_map([part_id], |row| {
            Ok(Fitment {
                year: row.get("year")?,
                make: row.get("make")?,
                model: row.get("model")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(fitments)
}

fn load_images(conn: &Connection, part_id: PartId) -> RepoResult<Vec<Image>> {
    let mut stmt = conn.prepare(
        "SELECT image_url
         FROM images
         WHERE part_id = ?1
         ORDER BY id ASC;",
    )?;
    let images = stmt
        .query_map([part_id], |row| {
            Ok(Image {
                image_url: row.get("image_url")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(images)
}

fn load_metadata(conn: &Connection, part_id: PartId) -> RepoResult<Vec<Metadata>> {
    let mut stmt = conn.prepare(
        "SELECT meta_key, meta_value
         FROM part_metadata
         WHERE part_id = ?1
         ORDER BY id ASC;",
    )?;
    let metadata = stmt
        .query_map([part_id], |row| {
            Ok(Metadata {
                key: row.get("meta_key")?,
                value: row.get("meta_value")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(metadata)
}

fn insert_fitments(conn: &Connection, part_id: PartId, fitments: &[Fitment]) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO fitments (part_id, year, make, model) VALUES (?1, ?2, ?3, ?4);",
    )?;
    for fitment in fitments {
        stmt.execute(params![
            part_id,
            fitment.year,
            fitment.make.as_str(),
            fitment.model.as_str()
        ])?;
    }
    Ok(())
}

fn insert_images(conn: &Connection, part_id: PartId, images: &[Image]) -> RepoResult<()> {
    let mut stmt = conn.prepare("INSERT INTO images (part_id, image_url) VALUES (?1, ?2);")?;
    for image in images {
        stmt.execute(params![part_id, image.image_url.as_str()])?;
    }
    Ok(())
}

fn insert_metadata(conn: &Connection, part_id: PartId, metadata: &[Metadata]) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO part_metadata (part_id, meta_key, meta_value) VALUES (?1, ?2, ?3);",
    )?;
    for entry in metadata {
        stmt.execute(params![part_id, entry.key.as_str(), entry.value.as_str()])?;
    }
    Ok(())
}

/// Links attributes to a part in list order.
///
/// Attributes without an id become new shared rows. Attributes with an id
/// write their name and value back to the shared row, so every part linked
/// to it sees the change; an unknown id fails the foreign key check. A
/// repeated id is linked once, at its first position.
fn link_attributes(conn: &Connection, part_id: PartId, attributes: &[Attribute]) -> RepoResult<()> {
    let mut linked = HashSet::new();
    let mut position: i64 = 0;
    for attribute in attributes {
        let attribute_id = match attribute.id {
            Some(id) => {
                if !linked.insert(id) {
                    continue;
                }
                conn.execute(
                    "UPDATE attributes SET name = ?2, value = ?3 WHERE id = ?1;",
                    params![id, attribute.name.as_str(), attribute.value.as_str()],
                )?;
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO attributes (name, value) VALUES (?1, ?2);",
                    params![attribute.name.as_str(), attribute.value.as_str()],
                )?;
                conn.last_insert_rowid()
            }
        };

        conn.execute(
            "INSERT INTO part_attributes (part_id, attribute_id, position)
             VALUES (?1, ?2, ?3);",
            params![part_id, attribute_id, position],
        )?;
        position += 1;
    }
    Ok(())
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
