//! OpenAPI document: `GET /api/v1/docs/openapi.json`
//!
//! Generated from [`OPERATIONS`], a plain description of each vault password
//! operation kept next to (not inside) the handlers.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use embercrypt_core::service::MAX_ID;
use serde_json::{Map, Value, json};

use crate::state::AppState;

/// Path the document is served from.
pub const OPENAPI_PATH: &str = "/api/v1/docs/openapi.json";

/// What a request body must contain, if anything.
#[derive(Debug, Clone, Copy)]
pub enum Body {
    None,
    /// A `VaultPassword` payload, described by the text.
    Entry(&'static str),
}

/// One documented HTTP operation.
#[derive(Debug, Clone, Copy)]
pub struct OperationDoc {
    pub method: &'static str,
    pub path: &'static str,
    pub operation_id: &'static str,
    pub summary: &'static str,
    pub description: &'static str,
    pub body: Body,
    /// `(status, description, what the body carries)`.
    pub responses: &'static [(u16, &'static str, Returns)],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returns {
    Nothing,
    Entry,
    EntryList,
    Error,
}

/// The vault password operations, in route-table order.
pub const OPERATIONS: &[OperationDoc] = &[
    OperationDoc {
        method: "get",
        path: "/api/v1/vaultpassword",
        operation_id: "findAll",
        summary: "List vault passwords",
        description: "Returns every stored entry in ascending id order.",
        body: Body::None,
        responses: &[(200, "Entries listed", Returns::EntryList)],
    },
    OperationDoc {
        method: "get",
        path: "/api/v1/vaultpassword/{idPassword}",
        operation_id: "findById",
        summary: "Get a vault password",
        description: "Returns a single entry by id.",
        body: Body::None,
        responses: &[
            (200, "Entry found", Returns::Entry),
            (404, "No entry with this id", Returns::Nothing),
        ],
    },
    OperationDoc {
        method: "post",
        path: "/api/v1/vaultpassword",
        operation_id: "create",
        summary: "Create a vault password",
        description: "Stores a new entry; the id is assigned by the server and returned in the Location header.",
        body: Body::Entry("Entry to create; any idPassword is ignored"),
        responses: &[
            (201, "Entry created", Returns::Nothing),
            (409, "An equivalent entry already exists", Returns::Nothing),
        ],
    },
    OperationDoc {
        method: "put",
        path: "/api/v1/vaultpassword/{idPassword}",
        operation_id: "save",
        summary: "Save a vault password",
        description: "Creates or replaces the entry stored under the given id.",
        body: Body::Entry("Full entry; the path id wins over any idPassword"),
        responses: &[
            (200, "Entry created or replaced", Returns::Nothing),
            (400, "Id outside the valid range", Returns::Error),
        ],
    },
    OperationDoc {
        method: "put",
        path: "/api/v1/vaultpassword",
        operation_id: "update",
        summary: "Update a vault password",
        description: "Replaces an existing entry named by idPassword in the payload.",
        body: Body::Entry("Full entry including idPassword"),
        responses: &[
            (200, "Entry updated", Returns::Nothing),
            (404, "No entry with this id", Returns::Nothing),
        ],
    },
    OperationDoc {
        method: "patch",
        path: "/api/v1/vaultpassword/{idPassword}",
        operation_id: "partialUpdate",
        summary: "Partially update a vault password",
        description: "Changes only the fields present in the payload.",
        body: Body::Entry("Fields to change"),
        responses: &[
            (200, "Entry updated", Returns::Nothing),
            (404, "No entry with this id", Returns::Nothing),
        ],
    },
    OperationDoc {
        method: "delete",
        path: "/api/v1/vaultpassword/{idPassword}",
        operation_id: "deleteById",
        summary: "Delete a vault password",
        description: "Removes the entry stored under the given id.",
        body: Body::None,
        responses: &[
            (204, "Entry deleted", Returns::Nothing),
            (404, "No entry with this id", Returns::Nothing),
        ],
    },
];

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(OPENAPI_PATH, get(openapi_json))
}

async fn openapi_json() -> Json<Value> {
    Json(document())
}

fn operation_json(op: &OperationDoc) -> Value {
    let mut responses = Map::new();
    for (status, description, returns) in op.responses {
        let mut response = json!({ "description": description });
        let schema = match returns {
            Returns::Nothing => None,
            Returns::Entry => Some(json!({ "$ref": "#/components/schemas/VaultPassword" })),
            Returns::EntryList => Some(json!({
                "type": "array",
                "items": { "$ref": "#/components/schemas/VaultPassword" }
            })),
            Returns::Error => Some(json!({ "$ref": "#/components/schemas/Error" })),
        };
        if let Some(schema) = schema {
            response["content"] = json!({ "application/json": { "schema": schema } });
        }
        responses.insert(status.to_string(), response);
    }
    responses.insert(
        "401".to_owned(),
        json!({
            "description": "Missing or invalid token",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Error" } } }
        }),
    );

    let mut operation = json!({
        "operationId": op.operation_id,
        "summary": op.summary,
        "description": op.description,
        "tags": ["Vault Password"],
        "responses": responses,
    });

    if op.path.contains("{idPassword}") {
        operation["parameters"] = json!([{
            "name": "idPassword",
            "in": "path",
            "required": true,
            "description": "Vault password id",
            "schema": { "type": "integer", "format": "int64", "minimum": 1, "maximum": MAX_ID }
        }]);
    }

    if let Body::Entry(description) = op.body {
        operation["requestBody"] = json!({
            "required": true,
            "description": description,
            "content": { "application/json": {
                "schema": { "$ref": "#/components/schemas/VaultPassword" }
            } }
        });
    }

    operation
}

/// Build the OpenAPI 3.0 document for the vault password API.
#[must_use]
pub fn document() -> Value {
    let mut paths = Map::new();
    for op in OPERATIONS {
        let item = paths
            .entry(op.path.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        item[op.method] = operation_json(op);
    }

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Embercrypt vault password API",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "tags": [{ "name": "Vault Password", "description": "Manage vault password entries" }],
        "security": [{ "bearerAuth": [] }, { "vaultToken": [] }],
        "paths": paths,
        "components": {
            "securitySchemes": {
                "bearerAuth": { "type": "http", "scheme": "bearer" },
                "vaultToken": { "type": "apiKey", "in": "header", "name": "X-Vault-Token" }
            },
            "schemas": {
                "VaultPassword": {
                    "type": "object",
                    "properties": {
                        "idPassword": { "type": "integer", "format": "int64", "minimum": 1, "maximum": MAX_ID },
                        "name": { "type": "string", "nullable": true },
                        "username": { "type": "string", "nullable": true },
                        "password": { "type": "string", "nullable": true, "format": "password" },
                        "url": { "type": "string", "nullable": true },
                        "notes": { "type": "string", "nullable": true },
                        "createdAt": { "type": "string", "format": "date-time", "readOnly": true },
                        "updatedAt": { "type": "string", "format": "date-time", "readOnly": true }
                    }
                },
                "Error": {
                    "type": "object",
                    "required": ["error", "message"],
                    "properties": {
                        "error": { "type": "string" },
                        "message": { "type": "string" }
                    }
                }
            }
        }
    })
}
