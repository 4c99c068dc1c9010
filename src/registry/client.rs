use anyhow::{Context, Result, bail};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{
    DEFAULT_PAGE_SIZE, MAX_LOGGED_BODY_CHARS, MCP_ADMIN_PATH, MCP_LIST_PATH,
    model::{RegistryEntryConfig, Tool},
    server::ServerModel,
    update::{RegistryRecord, build_tool_update},
    util::{array_field, str_field, truncate_chars},
};
use crate::config::Settings;

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Client for the registry's MCP admin API.
///
/// Holds only fixed connection parameters, so one instance can be shared by
/// any number of concurrent callers. Reads never fail: they log and degrade
/// to empty values. Tool updates report success as a `bool`.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    base_url: String,
    username: String,
    password: String,
    page_size: usize,
    http: reqwest::Client,
}

impl RegistryClient {
    pub fn new(addr: &str, username: &str, password: &str) -> Result<Self> {
        Self::with_http_client(addr, username, password, reqwest::Client::new())
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .context("failed to build HTTP client for the registry")?;
        Ok(Self::with_http_client(
            &settings.addr,
            &settings.username,
            &settings.password,
            http,
        )?
        .with_page_size(settings.page_size))
    }

    pub fn with_http_client(
        addr: &str,
        username: &str,
        password: &str,
        http: reqwest::Client,
    ) -> Result<Self> {
        if addr.trim().is_empty() {
            bail!("registry address must not be empty");
        }
        if username.trim().is_empty() {
            bail!("registry username must not be empty");
        }
        if password.trim().is_empty() {
            bail!("registry password must not be empty");
        }
        Ok(Self {
            base_url: normalize_base_url(addr),
            username: username.to_string(),
            password: password.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            http,
        })
    }

    /// Page size used by [`RegistryClient::list_servers`]. Zero is ignored.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        if page_size > 0 {
            self.page_size = page_size;
        }
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    /// Fetch one entry. On any failure returns [`ServerModel::unavailable`].
    pub async fn get_server(&self, name: &str) -> ServerModel {
        match self.fetch_entry(name).await {
            Ok(data) => ServerModel::from_config(RegistryEntryConfig::from_raw(&data)),
            Err(e) => {
                warn!(mcp_name = name, "failed to get MCP server: {e:#}");
                ServerModel::unavailable(name)
            }
        }
    }

    /// One page of enabled, fully fetched servers. A failed page is empty.
    pub async fn list_servers_page(&self, page_no: usize, page_size: usize) -> Vec<ServerModel> {
        match self.try_list_page(page_no, page_size).await {
            Ok(servers) => servers,
            Err(e) => {
                warn!(page_no, page_size, "failed to list MCP servers: {e:#}");
                Vec::new()
            }
        }
    }

    /// Every enabled server, pages concatenated in order.
    pub async fn list_servers(&self) -> Vec<ServerModel> {
        let page_size = self.page_size;
        let total_count = match self.fetch_total_count(page_size).await {
            Ok(count) => count,
            Err(e) => {
                warn!(page_size, "failed to count MCP servers: {e:#}");
                return Vec::new();
            }
        };

        let pages = total_pages(total_count, page_size);
        debug!(total_count, pages, "listing MCP servers");
        let mut servers = Vec::new();
        for page_no in 1..=pages {
            servers.extend(self.list_servers_page(page_no, page_size).await);
        }
        servers
    }

    async fn try_list_page(&self, page_no: usize, page_size: usize) -> Result<Vec<ServerModel>> {
        if page_no == 0 || page_size == 0 {
            bail!("page number and page size must be positive");
        }
        let data = self.fetch_page(page_no, page_size).await?;

        let mut servers = Vec::new();
        for item in array_field(&data, "pageItems") {
            let enabled = item.get("enabled").and_then(Value::as_bool).unwrap_or(true);
            if !enabled {
                continue;
            }
            let name = str_field(item, "name");
            if name.is_empty() {
                debug!(page_no, "skipping page item without a name");
                continue;
            }
            // The list endpoint returns summaries; the detail call is authoritative.
            let server = self.get_server(&name).await;
            if !server.is_available() {
                debug!(mcp_name = %name, "skipping MCP server without description");
                continue;
            }
            servers.push(server);
        }
        Ok(servers)
    }

    async fn fetch_total_count(&self, page_size: usize) -> Result<usize> {
        let data = self.fetch_page(1, page_size).await?;
        let count = data
            .get("totalCount")
            .and_then(Value::as_u64)
            .context("list response has no `totalCount`")?;
        Ok(count as usize)
    }

    async fn fetch_entry(&self, name: &str) -> Result<Value> {
        let response = self
            .request(Method::GET, MCP_ADMIN_PATH, JSON_CONTENT_TYPE)
            .query(&[("mcpName", name)])
            .send()
            .await
            .context("request to registry failed")?;
        let body = read_ok_json(response).await?;
        take_data(body)
    }

    async fn fetch_page(&self, page_no: usize, page_size: usize) -> Result<Value> {
        let response = self
            .request(Method::GET, MCP_LIST_PATH, JSON_CONTENT_TYPE)
            .query(&[("pageNo", page_no), ("pageSize", page_size)])
            .send()
            .await
            .context("request to registry failed")?;
        let body = read_ok_json(response).await?;
        take_data(body)
    }

    // ── Writes ───────────────────────────────────────────────────────────────

    /// Replace the tool list of `name`, keeping every other stored field.
    /// Returns `false` (and logs why) on any failure. Never retries.
    pub async fn update_tools(&self, name: &str, tools: &[Tool]) -> bool {
        match self.try_update_tools(name, tools).await {
            Ok(()) => {
                info!(mcp_name = name, tools = tools.len(), "updated MCP tools");
                true
            }
            Err(e) => {
                warn!(mcp_name = name, "failed to update MCP tools: {e:#}");
                false
            }
        }
    }

    async fn try_update_tools(&self, name: &str, tools: &[Tool]) -> Result<()> {
        let record = RegistryRecord::from_raw(
            self.fetch_entry(name)
                .await
                .context("failed to read current record")?,
        );
        let form = build_tool_update(name, &record, tools)?;
        info!(
            mcp_name = name,
            server_specification = %form.server_specification,
            endpoint_specification = %form.endpoint_specification,
            tool_specification = %form.tool_specification,
            "submitting MCP tool update"
        );

        let response = self
            .request(Method::PUT, MCP_ADMIN_PATH, FORM_CONTENT_TYPE)
            .form(&form)
            .send()
            .await
            .context("update request to registry failed")?;
        ensure_ok(response).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str, content_type: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("charset", "utf-8")
            .header("userName", self.username.as_str())
            .header("password", self.password.as_str())
    }
}

/// Pages to walk for `total_count` entries.
///
/// Always one more than the full pages, so an exact multiple of `page_size`
/// ends with an empty page. Kept for compatibility with the registry's paging.
pub fn total_pages(total_count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_count / page_size + 1
}

fn normalize_base_url(addr: &str) -> String {
    let addr = addr.trim().trim_end_matches('/');
    if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    }
}

async fn ensure_ok(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .context("failed to read registry response body")?;
    if status != StatusCode::OK {
        bail!(
            "HTTP {} from registry: {}",
            status.as_u16(),
            truncate_chars(&body, MAX_LOGGED_BODY_CHARS)
        );
    }
    Ok(body)
}

async fn read_ok_json(response: reqwest::Response) -> Result<Value> {
    let body = ensure_ok(response).await?;
    serde_json::from_str(&body).with_context(|| {
        format!(
            "invalid JSON from registry: {}",
            truncate_chars(&body, MAX_LOGGED_BODY_CHARS)
        )
    })
}

fn take_data(mut body: Value) -> Result<Value> {
    match body.get_mut("data").map(Value::take) {
        Some(data @ Value::Object(_)) => Ok(data),
        _ => bail!("registry response has no `data` object"),
    }
}
