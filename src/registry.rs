mod client;
mod model;
mod server;
mod update;
mod util;


pub use client::{RegistryClient, total_pages};
pub use model::{
    BackendEndpoint, RegistryEntryConfig, RemoteTransportConfig, ServiceReference, Tool,
    ToolCatalog, ToolInputProperty, ToolInputSchema,
};
pub use server::{ServerModel, derive_endpoint_url, endpoint_url};
pub use update::{RegistryRecord, ToolUpdateForm, build_tool_update};

// Nacos v3 admin API routes, relative to the registry base URL.
const MCP_ADMIN_PATH: &str = "/nacos/v3/admin/ai/mcp";
const MCP_LIST_PATH: &str = "/nacos/v3/admin/ai/mcp/list";

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Protocol tag of entries that run as a local process; these never get a URL.
pub const STDIO_PROTOCOL: &str = "stdio";
const HTTPS_PORT: i64 = 443;
const UNKNOWN_PORT: i64 = -1;

// Wire keys of the raw registry record touched by the update path.
const TOOL_SPEC_KEY: &str = "toolSpec";
const TOOLS_KEY: &str = "tools";
const BACKEND_ENDPOINTS_KEY: &str = "backendEndpoints";
const REMOTE_SERVER_CONFIG_KEY: &str = "remoteServerConfig";
const SERVICE_REF_KEY: &str = "serviceRef";
const ENDPOINT_REF_TYPE: &str = "REF";

const MCP_SERVERS_KEY: &str = "mcpServers";
const MAX_LOGGED_BODY_CHARS: usize = 300;
