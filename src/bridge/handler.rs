use crate::bridge::command::Command;
use crate::domain::{GeoRegion, NewGeoRegion};
use crate::monitor::LocationPermission;
use crate::registry::{GeofenceRegistry, MonitoringState, MonitoringWarning, RegistryError, SyncReport};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Response {
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<Value>,
        payload: Value,
    },
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<Value>,
        error: ErrorBody,
    },
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ErrorBody {
    code: &'static str,
    message: String,
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("invalid command: {0}")]
    InvalidCommand(#[from] serde_json::Error),
    #[error("echo requires a non-empty message")]
    EmptyMessage,
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl BridgeError {
    fn code(&self) -> &'static str {
        match self {
            BridgeError::InvalidCommand(_) => "InvalidCommand",
            BridgeError::EmptyMessage => "EmptyMessage",
            BridgeError::Registry(err) => err.code(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegionView<'a> {
    identifier: &'a str,
    latitude: f64,
    longitude: f64,
    radius: f64,
    note: &'a str,
    #[serde(rename = "type")]
    trigger_on: &'static str,
    title: &'a str,
    subtitle: String,
    monitored: bool,
}

impl<'a> RegionView<'a> {
    fn new(region: &'a GeoRegion, monitored: bool) -> Self {
        RegionView {
            identifier: region.identifier(),
            latitude: region.center().latitude(),
            longitude: region.center().longitude(),
            radius: region.radius(),
            note: region.note(),
            trigger_on: region.trigger_on().label(),
            title: region.display_note(),
            subtitle: region.display_subtitle(),
            monitored,
        }
    }
}

fn warning_json(warning: Option<&MonitoringWarning>) -> Value {
    match warning {
        Some(warning) => json!({ "code": warning.code(), "message": warning.to_string() }),
        None => Value::Null,
    }
}

fn sync_report_json(report: &SyncReport) -> Value {
    let warnings = report
        .warnings
        .iter()
        .map(|(identifier, warning)| json!({ "identifier": identifier, "code": warning.code(), "message": warning.to_string() }))
        .collect::<Vec<_>>();

    json!({ "started": report.started, "stopped": report.stopped, "warnings": warnings })
}

/// Turns bridge commands into registry calls and their outcomes into response payloads.
#[derive(Debug)]
pub struct CommandHandler {
    registry: Arc<GeofenceRegistry>,
    permission: Arc<dyn LocationPermission>,
}

impl CommandHandler {
    pub fn new(registry: Arc<GeofenceRegistry>, permission: Arc<dyn LocationPermission>) -> Self {
        CommandHandler { registry, permission }
    }

    /// Handles one request line. Every line gets a response, including lines that are not a valid command.
    pub async fn handle_line(&self, line: impl AsRef<[u8]>) -> Response {
        let value = match serde_json::from_slice::<Value>(line.as_ref()) {
            Ok(value) => value,
            Err(err) => return error_response(None, BridgeError::InvalidCommand(err)),
        };
        let id = value.get("id").cloned();

        let result = match serde_json::from_value::<Command>(value) {
            Ok(command) => self.handle(command).await,
            Err(err) => Err(BridgeError::InvalidCommand(err)),
        };

        match result {
            Ok(payload) => Response::Ok { id, payload },
            Err(err) => error_response(id, err),
        }
    }

    #[instrument(skip(self))]
    pub async fn handle(&self, command: Command) -> Result<Value, BridgeError> {
        match command {
            Command::RequestPermission => {
                let status = self.permission.request_always_authorization().await;
                let report = self.registry.synchronize_all().await;
                Ok(json!({ "authorization": status, "synchronization": sync_report_json(&report) }))
            }
            Command::AddGeotification(fields) => {
                let added = self.registry.add(NewGeoRegion::from(fields)).await?;
                Ok(json!({
                    "region": RegionView::new(added.region(), added.monitoring_warning().is_none()),
                    "warning": warning_json(added.monitoring_warning()),
                    "count": self.registry.count(),
                }))
            }
            Command::RemoveGeotification { identifier } => {
                let removed = self.registry.remove(&identifier).await?;
                Ok(json!({
                    "region": RegionView::new(removed.region(), false),
                    "warning": warning_json(removed.monitoring_warning()),
                    "count": self.registry.count(),
                }))
            }
            Command::List => {
                let states = self.registry.monitoring_states().await;
                let views = states
                    .iter()
                    .map(|(region, state)| RegionView::new(region, *state == MonitoringState::Monitored))
                    .collect::<Vec<_>>();
                Ok(json!({ "regions": views }))
            }
            Command::Count => Ok(json!({
                "count": self.registry.count(),
                "capacity": self.registry.capacity(),
                "canAdd": !self.registry.is_full(),
            })),
            Command::Synchronize => Ok(sync_report_json(&self.registry.synchronize_all().await)),
            Command::Echo { message } => {
                if message.is_empty() {
                    return Err(BridgeError::EmptyMessage);
                }
                info!("💬 {}", message);
                Ok(Value::String(message))
            }
        }
    }
}

fn error_response(id: Option<Value>, err: BridgeError) -> Response {
    match &err {
        BridgeError::InvalidCommand(_) => warn!("⚠️ {}", err),
        _ => debug!("Command failed: {}", err),
    }

    Response::Error {
        id,
        error: ErrorBody {
            code: err.code(),
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::AppConfigBuilder;
    use crate::monitor::SimulatedMonitor;
    use crate::persistence::MemoryStore;
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn handler(authorized: bool) -> CommandHandler {
        let config = AppConfigBuilder::new().authorized(authorized).grant_on_request(true).build();
        let monitor = Arc::new(SimulatedMonitor::from_config(config.monitor()));
        let registry = Arc::new(GeofenceRegistry::new(Arc::new(MemoryStore::new()), monitor.clone()));
        CommandHandler::new(registry, monitor)
    }

    fn add_line(identifier: &str) -> String {
        json!({
            "id": identifier,
            "action": "addGeotification",
            "latitude": 37.0,
            "longitude": -122.0,
            "radius": 500.0,
            "note": "",
            "type": "onEntry",
            "identifier": identifier
        })
        .to_string()
    }

    fn to_json(response: &Response) -> Value {
        serde_json::to_value(response).unwrap()
    }

    #[test(tokio::test)]
    async fn adds_and_lists_a_geotification() {
        let handler = handler(true);

        let added = to_json(&handler.handle_line(&add_line("home")).await);
        assert_eq!(added["status"], "ok");
        assert_eq!(added["id"], "home");
        assert_eq!(added["payload"]["warning"], Value::Null);
        assert_eq!(added["payload"]["count"], 1);

        let listed = to_json(&handler.handle_line(r#"{"action": "list"}"#).await);
        assert_eq!(
            listed,
            json!({
                "status": "ok",
                "payload": {
                    "regions": [{
                        "identifier": "home",
                        "latitude": 37.0,
                        "longitude": -122.0,
                        "radius": 500.0,
                        "note": "",
                        "type": "On Entry",
                        "title": "No Note",
                        "subtitle": "Radius: 500m - On Entry",
                        "monitored": true
                    }]
                }
            })
        );
    }

    #[test(tokio::test)]
    async fn reports_a_warning_when_permission_is_missing() {
        let handler = handler(false);

        let added = to_json(&handler.handle_line(&add_line("home")).await);

        assert_eq!(added["status"], "ok");
        assert_eq!(added["payload"]["warning"]["code"], "PermissionNotGranted");
    }

    #[test(tokio::test)]
    async fn request_permission_activates_saved_regions() {
        let handler = handler(false);
        handler.handle_line(&add_line("home")).await;

        let response = to_json(&handler.handle_line(r#"{"action": "requestPermission"}"#).await);

        assert_eq!(response["payload"]["authorization"], "granted");
        assert_eq!(response["payload"]["synchronization"]["started"], json!(["home"]));
    }

    #[test(tokio::test)]
    async fn returns_structured_registry_errors() {
        let handler = handler(true);
        handler.handle_line(&add_line("home")).await;

        let duplicate = to_json(&handler.handle_line(&add_line("home")).await);
        assert_eq!(duplicate["status"], "error");
        assert_eq!(duplicate["id"], "home");
        assert_eq!(duplicate["error"]["code"], "DuplicateIdentifier");

        let missing = to_json(&handler.handle_line(r#"{"action": "removeGeotification", "identifier": "work"}"#).await);
        assert_eq!(missing["error"]["code"], "NotFound");
    }

    #[test(tokio::test)]
    async fn reports_the_remaining_capacity() {
        let handler = handler(true);
        handler.handle_line(&add_line("home")).await;

        let response = handler.handle(Command::Count).await.unwrap();

        assert_eq!(response, json!({ "count": 1, "capacity": 20, "canAdd": true }));
    }

    #[test(tokio::test)]
    async fn echoes_a_message() {
        let handler = handler(true);

        assert_eq!(
            handler.handle_line(r#"{"id": 1, "action": "echo", "message": "hello"}"#).await,
            Response::Ok {
                id: Some(json!(1)),
                payload: json!("hello"),
            }
        );
    }

    #[test(tokio::test)]
    async fn an_empty_echo_is_an_error() {
        let handler = handler(true);

        let response = to_json(&handler.handle_line(r#"{"action": "echo", "message": ""}"#).await);

        assert_eq!(response["error"]["code"], "EmptyMessage");
    }

    #[test(tokio::test)]
    async fn malformed_lines_get_an_error_response() {
        let handler = handler(true);

        let not_json = to_json(&handler.handle_line("{ nope").await);
        assert_eq!(not_json["error"]["code"], "InvalidCommand");
        assert!(not_json.get("id").is_none());

        let missing_fields = to_json(&handler.handle_line(r#"{"id": 3, "action": "addGeotification", "identifier": "x"}"#).await);
        assert_eq!(missing_fields["error"]["code"], "InvalidCommand");
        assert_eq!(missing_fields["id"], 3);
    }
}
