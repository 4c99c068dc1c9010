use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value, json};

use super::{
    BACKEND_ENDPOINTS_KEY, ENDPOINT_REF_TYPE, REMOTE_SERVER_CONFIG_KEY, SERVICE_REF_KEY,
    TOOL_SPEC_KEY, TOOLS_KEY,
    model::{RegistryEntryConfig, Tool},
};

/// A registry record held twice: the typed view for decisions and the raw
/// object as fetched, so fields the typed model drops survive a write-back.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryRecord {
    typed: RegistryEntryConfig,
    raw: Map<String, Value>,
}

impl RegistryRecord {
    pub fn from_raw(data: Value) -> Self {
        let typed = RegistryEntryConfig::from_raw(&data);
        let raw = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self { typed, raw }
    }

    pub fn typed(&self) -> &RegistryEntryConfig {
        &self.typed
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }
}

/// Form body of the registry's MCP update call. The three specification
/// fields are JSON documents serialized to strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUpdateForm {
    pub mcp_name: String,
    pub server_specification: String,
    pub endpoint_specification: String,
    pub tool_specification: String,
}

/// Replace the tool list of `record` and split it into the update form.
///
/// Only `toolSpec.tools` changes. The server specification is the raw record
/// without `toolSpec` and `backendEndpoints`, which travel separately.
pub fn build_tool_update(
    mcp_name: &str,
    record: &RegistryRecord,
    tools: &[Tool],
) -> Result<ToolUpdateForm> {
    let tool_list = serde_json::to_value(tools).context("failed to serialize tool list")?;

    let mut server_spec = record.raw.clone();
    let mut tool_spec = match server_spec.remove(TOOL_SPEC_KEY) {
        Some(Value::Object(spec)) => spec,
        _ => Map::new(),
    };
    tool_spec.insert(TOOLS_KEY.to_string(), tool_list);
    server_spec.remove(BACKEND_ENDPOINTS_KEY);

    Ok(ToolUpdateForm {
        mcp_name: mcp_name.to_string(),
        server_specification: serde_json::to_string(&Value::Object(server_spec))
            .context("failed to serialize server specification")?,
        endpoint_specification: serde_json::to_string(&endpoint_specification(record))
            .context("failed to serialize endpoint specification")?,
        tool_specification: serde_json::to_string(&Value::Object(tool_spec))
            .context("failed to serialize tool specification")?,
    })
}

// Remote entries are routed through their discoverable service reference.
fn endpoint_specification(record: &RegistryRecord) -> Value {
    if record.typed.is_stdio() {
        return json!({});
    }
    let service_ref = record
        .raw
        .get(REMOTE_SERVER_CONFIG_KEY)
        .and_then(|cfg| cfg.get(SERVICE_REF_KEY))
        .filter(|v| v.is_object())
        .cloned()
        .unwrap_or_else(|| {
            let typed = &record.typed.remote_transport_config.service_reference;
            json!({
                "namespaceId": typed.namespace_id,
                "groupName": typed.group_name,
                "serviceName": typed.service_name
            })
        });
    json!({
        "data": service_ref,
        "type": ENDPOINT_REF_TYPE
    })
}
