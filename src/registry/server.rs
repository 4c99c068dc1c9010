use serde::Serialize;
use serde_json::{Map, Value, json};

use super::{
    HTTPS_PORT, MCP_SERVERS_KEY,
    model::{BackendEndpoint, RegistryEntryConfig},
};

/// An MCP server as handed to downstream consumers.
///
/// `agent_config` is the entry's local server config; remote entries also get
/// an `mcpServers.<name>` block carrying the derived URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerModel {
    name: String,
    description: String,
    agent_config: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_config_detail: Option<RegistryEntryConfig>,
}

impl ServerModel {
    /// Placeholder returned when an entry could not be fetched.
    /// Callers recognise it by its empty description.
    pub fn unavailable(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn from_config(config: RegistryEntryConfig) -> Self {
        let name = config.name.clone();
        let description = config.description_or_empty().to_string();
        let mut agent_config = config.local_server_config.clone();

        if let Some(url) = derive_endpoint_url(&config) {
            let servers = agent_config
                .entry(MCP_SERVERS_KEY)
                .or_insert_with(|| Value::Object(Map::new()));
            if !servers.is_object() {
                *servers = Value::Object(Map::new());
            }
            if let Value::Object(servers) = servers {
                servers.insert(
                    name.clone(),
                    json!({
                        "name": name,
                        "description": description,
                        "url": url
                    }),
                );
            }
        }

        Self {
            name,
            description,
            agent_config,
            source_config_detail: Some(config),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn agent_config(&self) -> &Map<String, Value> {
        &self.agent_config
    }

    pub fn source_config_detail(&self) -> Option<&RegistryEntryConfig> {
        self.source_config_detail.as_ref()
    }

    pub fn is_available(&self) -> bool {
        !self.description.is_empty()
    }

    /// Plain JSON view without the provenance record.
    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "agentConfig": self.agent_config
        })
    }
}

/// URL of a remote entry's first backend endpoint, or `None` for stdio entries
/// and entries without endpoints. Further endpoints are ignored.
pub fn derive_endpoint_url(config: &RegistryEntryConfig) -> Option<String> {
    if config.is_stdio() {
        return None;
    }
    let endpoint = config.backend_endpoints.first()?;
    Some(endpoint_url(
        endpoint,
        &config.remote_transport_config.export_path,
    ))
}

pub fn endpoint_url(endpoint: &BackendEndpoint, export_path: &str) -> String {
    let scheme = if endpoint.port == HTTPS_PORT {
        "https"
    } else {
        "http"
    };
    let separator = if export_path.starts_with('/') { "" } else { "/" };
    format!(
        "{scheme}://{}:{}{separator}{export_path}",
        endpoint.address, endpoint.port
    )
}
