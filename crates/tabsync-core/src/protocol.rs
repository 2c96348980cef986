//! Action-tagged message protocol consumed from the UI boundary
//!
//! Engine errors never cross this boundary: every request is answered with a
//! structured result, per-operation failures becoming `{success: false}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::engine::SyncEngine;
use crate::error::Result;
use crate::models::{SyncTabGroup, SyncTabGroupsStorage};

/// A request from the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Request {
    #[serde(rename = "push")]
    Push,
    #[serde(rename = "pull")]
    Pull,
    #[serde(rename = "merge")]
    Merge,
    #[serde(rename = "getGroupsForExport")]
    GetGroupsForExport,
    #[serde(rename = "exportJson")]
    ExportJson {
        #[serde(rename = "selectedIds")]
        selected_ids: Vec<i64>,
    },
    #[serde(rename = "importJson")]
    ImportJson { data: Value },
}

/// Answer to a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Status {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Groups {
        groups: Vec<SyncTabGroup>,
    },
    Data {
        data: SyncTabGroupsStorage,
    },
}

impl Response {
    pub fn ok() -> Self {
        Self::Status {
            success: true,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Status {
            success: false,
            error: Some(message.into()),
        }
    }
}

fn status(result: Result<()>) -> Response {
    match result {
        Ok(()) => Response::ok(),
        Err(err) => {
            error!(error = %err, "sync operation failed");
            Response::failure(err.to_string())
        }
    }
}

/// Dispatch one request against the engine.
pub async fn handle(engine: &SyncEngine, request: Request) -> Response {
    match request {
        Request::Push => status(engine.push().await.map(|_| ())),
        Request::Pull => status(engine.pull().await),
        Request::Merge => status(engine.merge().await.map(|_| ())),
        Request::GetGroupsForExport => match engine.groups_for_export().await {
            Ok(groups) => Response::Groups { groups },
            Err(err) => Response::failure(err.to_string()),
        },
        Request::ExportJson { selected_ids } => match engine.export_selected(&selected_ids).await {
            Ok(data) => Response::Data { data },
            Err(err) => Response::failure(err.to_string()),
        },
        Request::ImportJson { data } => status(engine.import(data).await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn requests_parse_from_action_tagged_json() {
        let push: Request = serde_json::from_value(json!({"action": "push"})).unwrap();
        assert_eq!(push, Request::Push);

        let export: Request =
            serde_json::from_value(json!({"action": "exportJson", "selectedIds": [1, 3]}))
                .unwrap();
        assert_eq!(
            export,
            Request::ExportJson {
                selected_ids: vec![1, 3]
            }
        );

        let import: Request =
            serde_json::from_value(json!({"action": "importJson", "data": {"9": {}}})).unwrap();
        assert!(matches!(import, Request::ImportJson { .. }));

        assert!(serde_json::from_value::<Request>(json!({"action": "nope"})).is_err());
    }

    #[test]
    fn status_responses_serialize_compactly() {
        assert_eq!(
            serde_json::to_value(Response::ok()).unwrap(),
            json!({"success": true})
        );
        assert_eq!(
            serde_json::to_value(Response::failure("Invalid data: bad payload")).unwrap(),
            json!({"success": false, "error": "Invalid data: bad payload"})
        );
    }
}
