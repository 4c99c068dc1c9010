use std::{fs, path::PathBuf, time::Duration};

use serde::Deserialize;

use crate::registry::DEFAULT_PAGE_SIZE;

const ENV_ADDR: &str = "NACOS_ADDR";
const ENV_USERNAME: &str = "NACOS_USERNAME";
const ENV_PASSWORD: &str = "NACOS_PASSWORD";
const ENV_PAGE_SIZE: &str = "NACOS_PAGE_SIZE";
const ENV_TIMEOUT_MS: &str = "NACOS_TIMEOUT_MS";
const ENV_CONFIG_FILE: &str = "NACOS_CONFIG_FILE";
const DEFAULT_CONFIG_DIR: &str = ".nacos-mcp";
const DEFAULT_CONFIG_FILENAME: &str = "config.toml";

/// Connection parameters for the registry client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub addr: String,
    pub username: String,
    pub password: String,
    pub page_size: usize,
    pub request_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    registry: RegistrySection,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RegistrySection {
    addr: Option<String>,
    username: Option<String>,
    password: Option<String>,
    page_size: Option<usize>,
    timeout_ms: Option<u64>,
}

impl Settings {
    /// Resolve settings from the process environment (after `.env`) and the
    /// TOML config file. Returns warnings for sources that were skipped.
    pub fn load() -> (Self, Vec<String>) {
        let _ = dotenvy::dotenv();
        let mut warnings = Vec::new();

        let path = config_file_path();
        let file = match fs::read_to_string(&path) {
            Ok(text) if !text.trim().is_empty() => match parse_config_file(&text) {
                Ok(section) => section,
                Err(e) => {
                    warnings.push(format!(
                        "config `{}` is invalid: {e}. Skipped.",
                        path.display()
                    ));
                    RegistrySection::default()
                }
            },
            _ => RegistrySection::default(),
        };

        let settings = Self::resolve(|key| std::env::var(key).ok(), file, &mut warnings);
        (settings, warnings)
    }

    fn resolve(
        env: impl Fn(&str) -> Option<String>,
        file: RegistrySection,
        warnings: &mut Vec<String>,
    ) -> Self {
        let text = |key: &str, fallback: Option<String>| {
            env(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .or(fallback)
                .unwrap_or_default()
        };

        let page_size = match env(ENV_PAGE_SIZE).map(|v| v.trim().parse::<usize>()) {
            Some(Ok(n)) if n > 0 => Some(n),
            Some(_) => {
                warnings.push(format!("{ENV_PAGE_SIZE} must be a positive integer. Ignored."));
                None
            }
            None => None,
        }
        .or(file.page_size.filter(|n| *n > 0))
        .unwrap_or(DEFAULT_PAGE_SIZE);

        let timeout_ms = env(ENV_TIMEOUT_MS)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .or(file.timeout_ms)
            .filter(|ms| *ms > 0);

        Self {
            addr: text(ENV_ADDR, file.addr),
            username: text(ENV_USERNAME, file.username),
            password: text(ENV_PASSWORD, file.password),
            page_size,
            request_timeout: timeout_ms.map(Duration::from_millis),
        }
    }
}

fn parse_config_file(text: &str) -> Result<RegistrySection, String> {
    let parsed: FileConfig = toml::from_str(text).map_err(|e| format!("not valid TOML: {e}"))?;
    Ok(parsed.registry)
}

/// `$NACOS_CONFIG_FILE`, or `~/.nacos-mcp/config.toml`.
pub fn config_file_path() -> PathBuf {
    if let Some(path) = std::env::var_os(ENV_CONFIG_FILE) {
        let p = PathBuf::from(path);
        if !p.as_os_str().is_empty() {
            return p;
        }
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_CONFIG_DIR)
        .join(DEFAULT_CONFIG_FILENAME)
}

/// Returns the current user's home directory in a cross-platform way.
/// - Unix/macOS: `$HOME`
/// - Windows: `$USERPROFILE`, then `$HOMEDRIVE$HOMEPATH`
fn home_dir() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("HOME") {
        return Some(PathBuf::from(home));
    }
    if cfg!(target_os = "windows") {
        if let Some(profile) = std::env::var_os("USERPROFILE") {
            return Some(PathBuf::from(profile));
        }
        if let (Some(drive), Some(path)) =
            (std::env::var_os("HOMEDRIVE"), std::env::var_os("HOMEPATH"))
        {
            let mut p = PathBuf::from(drive);
            p.push(path);
            return Some(p);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_file() {
        let file = parse_config_file(
            r#"
            [registry]
            addr = "file-host:8848"
            username = "file-user"
            password = "file-pw"
            page_size = 20
            "#,
        )
        .unwrap();
        let mut warnings = Vec::new();
        let settings = Settings::resolve(
            env_of(&[("NACOS_ADDR", "env-host:8848"), ("NACOS_PASSWORD", " ")]),
            file,
            &mut warnings,
        );
        assert_eq!(settings.addr, "env-host:8848");
        assert_eq!(settings.username, "file-user");
        assert_eq!(settings.password, "file-pw");
        assert_eq!(settings.page_size, 20);
        assert!(warnings.is_empty());
    }

    #[test]
    fn defaults_apply_without_sources() {
        let mut warnings = Vec::new();
        let settings = Settings::resolve(env_of(&[]), RegistrySection::default(), &mut warnings);
        assert_eq!(settings.addr, "");
        assert_eq!(settings.page_size, 100);
        assert_eq!(settings.request_timeout, None);
    }

    #[test]
    fn bad_page_size_is_reported_and_ignored() {
        let mut warnings = Vec::new();
        let settings = Settings::resolve(
            env_of(&[("NACOS_PAGE_SIZE", "0"), ("NACOS_TIMEOUT_MS", "1500")]),
            RegistrySection::default(),
            &mut warnings,
        );
        assert_eq!(settings.page_size, 100);
        assert_eq!(settings.request_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn missing_registry_table_is_empty() {
        let section = parse_config_file("title = \"x\"").unwrap();
        assert!(section.addr.is_none());
        assert!(parse_config_file("[registry").is_err());
    }
}
