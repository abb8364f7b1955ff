use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{info, warn};

use crate::keybinds::SingleOrVec;
use crate::theme::DEFAULT_THEME;

const APP_DIR: &str = "lightide";
const CONFIG_FILE: &str = "config.json";

/// External programs used by the runner, by role.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct Toolchain {
    pub(crate) python: String,
    pub(crate) node: String,
    pub(crate) cc: String,
    pub(crate) javac: String,
    pub(crate) java: String,
    /// File name of the compiled C binary, placed next to the source.
    pub(crate) c_output: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            node: "node".to_string(),
            cc: "gcc".to_string(),
            javac: "javac".to_string(),
            java: "java".to_string(),
            c_output: "output".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) theme: String,
    pub(crate) assist: bool,
    pub(crate) toolchain: Toolchain,
    pub(crate) completion_server: Vec<String>,
    pub(crate) keybinds: HashMap<String, SingleOrVec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            assist: true,
            toolchain: Toolchain::default(),
            completion_server: vec!["jedi-language-server".to_string()],
            keybinds: HashMap::new(),
        }
    }
}

/// `$XDG_CONFIG_HOME/lightide`, then `%APPDATA%/lightide`, then
/// `~/.config/lightide`. Empty variables count as unset.
fn resolve_config_dir(
    xdg: Option<String>,
    appdata: Option<String>,
    home: Option<String>,
) -> Option<PathBuf> {
    if let Some(xdg) = xdg.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg).join(APP_DIR));
    }
    if let Some(appdata) = appdata.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(appdata).join(APP_DIR));
    }
    home.filter(|v| !v.is_empty())
        .map(|home| PathBuf::from(home).join(".config").join(APP_DIR))
}

pub(crate) fn config_dir() -> Option<PathBuf> {
    resolve_config_dir(
        std::env::var("XDG_CONFIG_HOME").ok(),
        std::env::var("APPDATA").ok(),
        std::env::var("HOME").ok(),
    )
}

pub(crate) fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Where the rolling log files go.
pub(crate) fn log_dir() -> PathBuf {
    config_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join(APP_DIR))
}

/// Malformed JSON is logged and replaced by defaults.
pub(crate) fn parse_config(raw: &str, source: &str) -> Config {
    match serde_json::from_str::<Config>(raw) {
        Ok(config) => config,
        Err(err) => {
            warn!(%source, %err, "invalid config, using defaults");
            Config::default()
        }
    }
}

pub(crate) fn load_config() -> Config {
    let Some(path) = config_file_path() else {
        return Config::default();
    };
    let Ok(raw) = fs::read_to_string(&path) else {
        return Config::default();
    };
    info!(path = %path.display(), "loaded config");
    parse_config(&raw, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_toolchain() {
        let config = Config::default();
        assert!(config.assist);
        assert_eq!(config.theme, "Monokai");
        assert_eq!(config.toolchain.cc, "gcc");
        assert_eq!(config.toolchain.c_output, "output");
        assert_eq!(config.completion_server, vec!["jedi-language-server"]);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let raw = r#"{"assist": false, "toolchain": {"python": "python3"}}"#;
        let config = parse_config(raw, "test");
        assert!(!config.assist);
        assert_eq!(config.toolchain.python, "python3");
        assert_eq!(config.toolchain.node, "node");
        assert_eq!(config.theme, "Monokai");
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let config = parse_config("{ not json", "test");
        assert!(config.assist);
        assert_eq!(config.toolchain, Toolchain::default());
    }

    #[test]
    fn keybind_overrides_accept_string_or_list() {
        let raw = r#"{"keybinds": {"run": "f9", "save": ["ctrl+s", "f2"]}}"#;
        let config = parse_config(raw, "test");
        assert!(matches!(config.keybinds.get("run"), Some(SingleOrVec::Single(s)) if s == "f9"));
        assert!(matches!(
            config.keybinds.get("save"),
            Some(SingleOrVec::Multiple(v)) if v.len() == 2
        ));
    }

    #[test]
    fn config_dir_resolution_order() {
        let s = |v: &str| Some(v.to_string());
        assert_eq!(
            resolve_config_dir(s("/xdg"), s("/app"), s("/home/u")),
            Some(PathBuf::from("/xdg/lightide"))
        );
        assert_eq!(
            resolve_config_dir(s(""), s("/app"), s("/home/u")),
            Some(PathBuf::from("/app/lightide"))
        );
        assert_eq!(
            resolve_config_dir(None, None, s("/home/u")),
            Some(PathBuf::from("/home/u/.config/lightide"))
        );
        assert_eq!(resolve_config_dir(None, None, None), None);
    }
}
