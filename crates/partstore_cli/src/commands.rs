//! Route-shaped command handling.
//!
//! Each command maps onto one part route and yields the status code and JSON
//! body that route would answer with.

use crate::config::Command;
use anyhow::{Context, Result};
use partstore_core::{ErrorKind, Part, PartId, PartRepository, PartService, ServiceError};
use serde_json::{json, Value};
use std::path::Path;

/// Command resolved against its input body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Create { body: String },
    Get { id: PartId },
    GetVersion { id: PartId, version: i64 },
    Update { id: PartId, body: String },
    Delete { id: PartId },
}

impl Request {
    /// Resolves a parsed command, reading bodies through `read_body`.
    pub fn from_command(
        command: &Command,
        read_body: impl FnOnce(Option<&Path>) -> Result<String>,
    ) -> Result<Self> {
        let request = match command {
            Command::Create { file } => Self::Create {
                body: read_body(file.as_deref())?,
            },
            Command::Get { id } => Self::Get { id: *id },
            Command::GetVersion { id, version } => Self::GetVersion {
                id: *id,
                version: *version,
            },
            Command::Update { id, file } => Self::Update {
                id: *id,
                body: read_body(file.as_deref())?,
            },
            Command::Delete { id } => Self::Delete { id: *id },
        };
        Ok(request)
    }
}

/// Status code and JSON body answered for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub status: u16,
    pub body: Value,
}

impl Outcome {
    fn part(status: u16, part: &Part) -> Result<Self> {
        let body = serde_json::to_value(part).context("failed to encode part")?;
        Ok(Self { status, body })
    }

    fn failure(err: &ServiceError) -> Self {
        let message = match err.kind() {
            ErrorKind::NotFound => "Part not found".to_string(),
            ErrorKind::Validation | ErrorKind::Persistence => err.to_string(),
        };
        Self {
            status: err.status_code(),
            body: json!({ "error": message }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn render(&self) -> String {
        json!({ "status": self.status, "body": self.body }).to_string()
    }
}

/// Runs one request against the service.
///
/// Service failures become error outcomes; only encoding failures are `Err`.
pub fn handle<R: PartRepository>(service: &mut PartService<R>, request: Request) -> Result<Outcome> {
    let result = match request {
        Request::Create { body } => parse_part(&body)
            .and_then(|part| service.create_part(&part))
            .map(|part| (201, part)),
        Request::Get { id } => service.get_part(id).map(|part| (200, part)),
        Request::GetVersion { id, version } => service
            .get_part_by_version(id, version)
            .map(|part| (200, part)),
        Request::Update { id, body } => parse_part(&body)
            .and_then(|part| service.replace_part(id, &part))
            .map(|part| (200, part)),
        Request::Delete { id } => {
            return Ok(match service.delete_part(id) {
                Ok(()) => Outcome {
                    status: 200,
                    body: json!({ "message": "Part deleted successfully" }),
                },
                Err(err) => Outcome::failure(&err),
            });
        }
    };

    match result {
        Ok((status, part)) => Outcome::part(status, &part),
        Err(err) => Ok(Outcome::failure(&err)),
    }
}

fn parse_part(body: &str) -> Result<Part, ServiceError> {
    serde_json::from_str(body).map_err(|err| ServiceError::Malformed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{handle, Outcome, Request};
    use crate::config::Command;
    use partstore_core::db::open_db_in_memory;
    use partstore_core::{PartService, SqlitePartRepository};
    use serde_json::json;
    use std::path::PathBuf;

    const PART_BODY: &str = r#"{
        "name": "Test Part",
        "sku": "TEST123",
        "description": "Test Description",
        "price": 10.99,
        "location": "Test Location",
        "shipment_packaging": { "weight": 1.5, "size": "Small", "hazardous": false, "fragile": true },
        "attributes": [{ "name": "Color", "value": "Red" }],
        "fitments": [{ "year": 2022, "make": "Toyota", "model": "Camry" }],
        "images": [{ "image_url": "https://example.com/image1.jpg" }],
        "metadata": [{ "key": "Key1", "value": "Value1" }],
        "version": 1
    }"#;

    fn created_id(outcome: &Outcome) -> i64 {
        outcome.body["id"].as_i64().unwrap()
    }

    #[test]
    fn from_command_reads_body_only_for_writes() {
        let create = Command::Create {
            file: Some(PathBuf::from("part.json")),
        };
        let request = Request::from_command(&create, |path| {
            assert_eq!(path, Some(PathBuf::from("part.json").as_path()));
            Ok("{}".to_string())
        })
        .unwrap();
        assert_eq!(
            request,
            Request::Create {
                body: "{}".to_string()
            }
        );

        let get = Command::Get { id: 4 };
        let request =
            Request::from_command(&get, |_| panic!("get must not read a body")).unwrap();
        assert_eq!(request, Request::Get { id: 4 });
    }

    #[test]
    fn routes_follow_status_table() {
        let mut conn = open_db_in_memory().unwrap();
        let repo = SqlitePartRepository::try_new(&mut conn).unwrap();
        let mut service = PartService::new(repo);

        let created = handle(
            &mut service,
            Request::Create {
                body: PART_BODY.to_string(),
            },
        )
        .unwrap();
        assert_eq!(created.status, 201);
        assert!(created.is_success());
        let id = created_id(&created);

        let fetched = handle(&mut service, Request::Get { id }).unwrap();
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.body, created.body);

        let versioned = handle(&mut service, Request::GetVersion { id, version: 1 }).unwrap();
        assert_eq!(versioned.status, 200);
        let wrong_version =
            handle(&mut service, Request::GetVersion { id, version: 2 }).unwrap();
        assert_eq!(wrong_version.status, 404);
        assert_eq!(wrong_version.body, json!({ "error": "Part not found" }));

        let updated = handle(
            &mut service,
            Request::Update {
                id,
                body: r#"{ "name": "Updated Part Name", "sku": "TEST123", "fitments": [] }"#
                    .to_string(),
            },
        )
        .unwrap();
        assert_eq!(updated.status, 200);
        assert_eq!(updated.body["name"], "Updated Part Name");
        assert_eq!(updated.body["fitments"][0]["make"], "Toyota");
        assert_eq!(updated.body["version"], 1);

        let deleted = handle(&mut service, Request::Delete { id }).unwrap();
        assert_eq!(deleted.status, 200);
        assert_eq!(
            deleted.body,
            json!({ "message": "Part deleted successfully" })
        );

        assert_eq!(handle(&mut service, Request::Get { id }).unwrap().status, 404);
        let repeat = handle(&mut service, Request::Delete { id }).unwrap();
        assert_eq!(repeat.status, 404);
        assert!(!repeat.is_success());
    }

    #[test]
    fn malformed_or_invalid_bodies_return_bad_request() {
        let mut conn = open_db_in_memory().unwrap();
        let repo = SqlitePartRepository::try_new(&mut conn).unwrap();
        let mut service = PartService::new(repo);

        let malformed = handle(
            &mut service,
            Request::Create {
                body: "{ not json".to_string(),
            },
        )
        .unwrap();
        assert_eq!(malformed.status, 400);
        assert!(malformed.body["error"]
            .as_str()
            .unwrap()
            .starts_with("malformed part body"));

        let invalid = handle(
            &mut service,
            Request::Create {
                body: r#"{ "name": "", "sku": "X" }"#.to_string(),
            },
        )
        .unwrap();
        assert_eq!(invalid.status, 400);

        let missing = handle(
            &mut service,
            Request::Update {
                id: 9,
                body: PART_BODY.to_string(),
            },
        )
        .unwrap();
        assert_eq!(missing.status, 404);
    }

    #[test]
    fn render_wraps_status_and_body() {
        let outcome = Outcome {
            status: 200,
            body: json!({ "message": "ok" }),
        };
        assert_eq!(
            outcome.render(),
            r#"{"body":{"message":"ok"},"status":200}"#
        );
    }
}
