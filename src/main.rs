use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use nacos_mcp_registry::{
    config::Settings,
    registry::{RegistryClient, ServerModel, Tool},
};
use serde_json::Value;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nacos-mcp", version, about = "Inspect and update MCP servers in a Nacos registry")]
struct Cli {
    /// Registry address (host:port, optionally with scheme)
    #[arg(long, global = true)]
    addr: Option<String>,

    /// Registry username
    #[arg(long, global = true)]
    username: Option<String>,

    /// Registry password
    #[arg(long, global = true)]
    password: Option<String>,

    /// Include the normalized registry record in output
    #[arg(long, global = true)]
    detail: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one MCP server by name
    Get {
        name: String,
    },
    /// List one page of enabled MCP servers
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 100)]
        size: usize,
    },
    /// List every enabled MCP server
    ListAll,
    /// Replace the tool list of an MCP server
    UpdateTools {
        name: String,
        /// JSON file holding an array of tools ({name, description, inputSchema})
        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let (mut settings, warnings) = Settings::load();
    for warning in warnings {
        warn!("{warning}");
    }
    if let Some(addr) = cli.addr {
        settings.addr = addr;
    }
    if let Some(username) = cli.username {
        settings.username = username;
    }
    if let Some(password) = cli.password {
        settings.password = password;
    }
    let client = RegistryClient::from_settings(&settings)?;
    let detail = cli.detail;

    match cli.command {
        Commands::Get { name } => {
            let server = client.get_server(&name).await;
            print_json(&render(&server, detail)?)?;
        }
        Commands::List { page, size } => {
            let servers = client.list_servers_page(page, size).await;
            print_servers(&servers, detail)?;
        }
        Commands::ListAll => {
            let servers = client.list_servers().await;
            print_servers(&servers, detail)?;
        }
        Commands::UpdateTools { name, file } => {
            let tools = read_tools(&file)?;
            if !client.update_tools(&name, &tools).await {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn read_tools(path: &Path) -> Result<Vec<Tool>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read tools file `{}`", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("tools file `{}` is not valid JSON", path.display()))?;
    let Some(items) = value.as_array() else {
        bail!("tools file `{}` must hold a JSON array", path.display());
    };
    Ok(items.iter().map(Tool::from_raw).collect())
}

fn render(server: &ServerModel, detail: bool) -> Result<Value> {
    if detail {
        return serde_json::to_value(server).context("failed to serialize server");
    }
    Ok(server.to_value())
}

fn print_servers(servers: &[ServerModel], detail: bool) -> Result<()> {
    let rendered = servers
        .iter()
        .map(|s| render(s, detail))
        .collect::<Result<Vec<_>>>()?;
    print_json(&Value::Array(rendered))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_update_tools_with_global_flags() {
        let cli = Cli::try_parse_from([
            "nacos-mcp",
            "update-tools",
            "weather",
            "--file",
            "tools.json",
            "--addr",
            "127.0.0.1:8848",
        ])
        .expect("valid command line");
        assert_eq!(cli.addr.as_deref(), Some("127.0.0.1:8848"));
        assert!(matches!(
            cli.command,
            Commands::UpdateTools { ref name, .. } if name == "weather"
        ));
    }

    #[test]
    fn list_defaults_to_first_page() {
        let cli = Cli::try_parse_from(["nacos-mcp", "list"]).expect("valid command line");
        assert!(matches!(cli.command, Commands::List { page: 1, size: 100 }));
    }

    #[test]
    fn tools_file_must_be_an_array() {
        let dir = std::env::temp_dir().join(format!("nacos-mcp-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let good = dir.join("tools.json");
        fs::write(&good, r#"[{"name":"add","description":"Add"},{"name":"sub"}]"#).unwrap();
        let tools = read_tools(&good).unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[1].description, "");

        let bad = dir.join("object.json");
        fs::write(&bad, r#"{"name":"add"}"#).unwrap();
        assert!(read_tools(&bad).is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
