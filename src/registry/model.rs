use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{
    STDIO_PROTOCOL, UNKNOWN_PORT,
    util::{array_field, object_field, str_field},
};

// Every `from_raw` below is total: missing, null or mistyped input yields the
// empty value of the type, so one bad field never aborts the rest of a record.

// ── Tool catalog ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolInputProperty {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

impl ToolInputProperty {
    pub fn from_raw(data: &Value) -> Self {
        Self {
            kind: str_field(data, "type"),
            description: str_field(data, "description"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: BTreeMap<String, ToolInputProperty>,
}

impl ToolInputSchema {
    pub fn from_raw(data: &Value) -> Self {
        let properties = data
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| (name.clone(), ToolInputProperty::from_raw(prop)))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            kind: str_field(data, "type"),
            properties,
        }
    }
}

/// One callable operation offered by a registered server.
///
/// Serializes to exactly the registry's wire tool shape
/// (`name`, `description`, `inputSchema`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: ToolInputSchema,
}

impl Tool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: ToolInputSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    pub fn from_raw(data: &Value) -> Self {
        Self {
            name: str_field(data, "name"),
            description: str_field(data, "description"),
            input_schema: data
                .get("inputSchema")
                .map(ToolInputSchema::from_raw)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToolCatalog {
    pub tools: Vec<Tool>,
    #[serde(rename = "toolsMeta")]
    pub metadata: Map<String, Value>,
}

impl ToolCatalog {
    pub fn from_raw(data: &Value) -> Self {
        Self {
            tools: array_field(data, "tools").iter().map(Tool::from_raw).collect(),
            metadata: object_field(data, "toolsMeta"),
        }
    }
}

// ── Transport ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceReference {
    pub namespace_id: String,
    pub group_name: String,
    pub service_name: String,
}

impl ServiceReference {
    pub fn from_raw(data: &Value) -> Self {
        Self {
            namespace_id: str_field(data, "namespaceId"),
            group_name: str_field(data, "groupName"),
            service_name: str_field(data, "serviceName"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RemoteTransportConfig {
    #[serde(rename = "serviceRef")]
    pub service_reference: ServiceReference,
    /// URL path fragment; may or may not start with `/`.
    #[serde(rename = "exportPath")]
    pub export_path: String,
    pub credentials: Map<String, Value>,
}

impl RemoteTransportConfig {
    pub fn from_raw(data: &Value) -> Self {
        Self {
            service_reference: data
                .get("serviceRef")
                .map(ServiceReference::from_raw)
                .unwrap_or_default(),
            export_path: str_field(data, "exportPath"),
            credentials: object_field(data, "credentials"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendEndpoint {
    pub address: String,
    /// `-1` when the registry did not report a port.
    pub port: i64,
}

impl Default for BackendEndpoint {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: UNKNOWN_PORT,
        }
    }
}

impl BackendEndpoint {
    pub fn from_raw(data: &Value) -> Self {
        let port = match data.get("port") {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(UNKNOWN_PORT),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(UNKNOWN_PORT),
            _ => UNKNOWN_PORT,
        };
        Self {
            address: str_field(data, "address"),
            port,
        }
    }
}

// ── Registry entry ────────────────────────────────────────────────────────────

/// The full normalized registry record for one MCP server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryEntryConfig {
    pub name: String,
    #[serde(rename = "protocol")]
    pub protocol_kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
    #[serde(rename = "remoteServerConfig")]
    pub remote_transport_config: RemoteTransportConfig,
    #[serde(rename = "localServerConfig")]
    pub local_server_config: Map<String, Value>,
    pub enabled: bool,
    pub capabilities: Vec<String>,
    #[serde(rename = "backendEndpoints")]
    pub backend_endpoints: Vec<BackendEndpoint>,
    #[serde(rename = "toolSpec")]
    pub tool_catalog: ToolCatalog,
}

impl Default for RegistryEntryConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            protocol_kind: String::new(),
            description: None,
            version: String::new(),
            remote_transport_config: RemoteTransportConfig::default(),
            local_server_config: Map::new(),
            enabled: true,
            capabilities: Vec::new(),
            backend_endpoints: Vec::new(),
            tool_catalog: ToolCatalog::default(),
        }
    }
}

impl RegistryEntryConfig {
    pub fn from_raw(data: &Value) -> Self {
        Self {
            name: str_field(data, "name"),
            protocol_kind: str_field(data, "protocol"),
            description: data
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            version: str_field(data, "version"),
            remote_transport_config: data
                .get("remoteServerConfig")
                .map(RemoteTransportConfig::from_raw)
                .unwrap_or_default(),
            local_server_config: object_field(data, "localServerConfig"),
            enabled: data
                .get("enabled")
                .and_then(Value::as_bool)
                .unwrap_or(true),
            capabilities: array_field(data, "capabilities")
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            backend_endpoints: array_field(data, "backendEndpoints")
                .iter()
                .map(BackendEndpoint::from_raw)
                .collect(),
            tool_catalog: data
                .get("toolSpec")
                .map(ToolCatalog::from_raw)
                .unwrap_or_default(),
        }
    }

    pub fn is_stdio(&self) -> bool {
        self.protocol_kind == STDIO_PROTOCOL
    }

    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_record_parses_to_canonical_defaults() {
        let config = RegistryEntryConfig::from_raw(&json!({}));
        assert_eq!(config, RegistryEntryConfig::default());
        assert!(config.enabled);
        assert_eq!(config.description, None);
    }

    #[test]
    fn null_record_parses_to_canonical_defaults() {
        assert_eq!(
            RegistryEntryConfig::from_raw(&Value::Null),
            RegistryEntryConfig::default()
        );
    }

    #[test]
    fn each_nested_type_defaults_on_null() {
        assert_eq!(
            ToolInputProperty::from_raw(&Value::Null),
            ToolInputProperty::default()
        );
        assert_eq!(
            ToolInputSchema::from_raw(&Value::Null),
            ToolInputSchema::default()
        );
        assert_eq!(Tool::from_raw(&Value::Null), Tool::default());
        assert_eq!(ToolCatalog::from_raw(&Value::Null), ToolCatalog::default());
        assert_eq!(
            ServiceReference::from_raw(&Value::Null),
            ServiceReference::default()
        );
        assert_eq!(
            RemoteTransportConfig::from_raw(&Value::Null),
            RemoteTransportConfig::default()
        );
        let endpoint = BackendEndpoint::from_raw(&Value::Null);
        assert_eq!(endpoint.address, "");
        assert_eq!(endpoint.port, -1);
    }

    #[test]
    fn full_record_parses_nested_structures() {
        let raw = json!({
            "name": "weather",
            "protocol": "mcp-sse",
            "description": "Weather lookups",
            "version": "1.0.0",
            "remoteServerConfig": {
                "serviceRef": { "namespaceId": "public", "groupName": "DEFAULT_GROUP", "serviceName": "weather-svc" },
                "exportPath": "sse",
                "credentials": { "token": "t" }
            },
            "localServerConfig": { "command": "node" },
            "enabled": false,
            "capabilities": ["TOOL", 3, "PROMPT"],
            "backendEndpoints": [{ "address": "10.0.0.1", "port": 8080 }, { "address": "10.0.0.2" }],
            "toolSpec": {
                "tools": [{
                    "name": "forecast",
                    "description": "Get a forecast",
                    "inputSchema": {
                        "type": "object",
                        "properties": { "city": { "type": "string", "description": "City name" } }
                    }
                }],
                "toolsMeta": { "forecast": { "enabled": true } }
            }
        });

        let config = RegistryEntryConfig::from_raw(&raw);
        assert_eq!(config.name, "weather");
        assert_eq!(config.description.as_deref(), Some("Weather lookups"));
        assert!(!config.enabled);
        assert!(!config.is_stdio());
        assert_eq!(config.capabilities, vec!["TOOL", "PROMPT"]);
        assert_eq!(
            config.remote_transport_config.service_reference.service_name,
            "weather-svc"
        );
        assert_eq!(config.remote_transport_config.export_path, "sse");
        assert_eq!(config.backend_endpoints.len(), 2);
        assert_eq!(config.backend_endpoints[1].port, -1);

        let tool = &config.tool_catalog.tools[0];
        assert_eq!(tool.name, "forecast");
        assert_eq!(tool.input_schema.kind, "object");
        assert_eq!(
            tool.input_schema.properties["city"].description,
            "City name"
        );
        assert!(config.tool_catalog.metadata.contains_key("forecast"));
    }

    #[test]
    fn missing_nested_objects_degrade_independently() {
        let raw = json!({
            "name": "calc",
            "remoteServerConfig": { "exportPath": "/mcp" },
            "toolSpec": { "tools": [{ "name": "add" }] }
        });
        let config = RegistryEntryConfig::from_raw(&raw);
        assert_eq!(
            config.remote_transport_config.service_reference,
            ServiceReference::default()
        );
        assert!(config.remote_transport_config.credentials.is_empty());
        assert_eq!(config.tool_catalog.tools[0].input_schema, ToolInputSchema::default());
        assert!(config.tool_catalog.metadata.is_empty());
    }

    #[test]
    fn string_port_is_accepted() {
        let endpoint = BackendEndpoint::from_raw(&json!({ "address": "h", "port": "443" }));
        assert_eq!(endpoint.port, 443);
        let endpoint = BackendEndpoint::from_raw(&json!({ "address": "h", "port": "nope" }));
        assert_eq!(endpoint.port, -1);
    }

    #[test]
    fn tool_serializes_to_wire_shape() {
        let tool = Tool::from_raw(&json!({
            "name": "add",
            "description": "Add numbers",
            "inputSchema": { "type": "object", "properties": { "a": { "type": "number" } } },
            "annotations": { "readOnlyHint": true }
        }));
        assert_eq!(
            serde_json::to_value(&tool).unwrap(),
            json!({
                "name": "add",
                "description": "Add numbers",
                "inputSchema": {
                    "type": "object",
                    "properties": { "a": { "type": "number", "description": "" } }
                }
            })
        );
    }
}
