use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    pub site: Option<String>,
    pub input: Option<String>,
    #[serde(alias = "list")]
    pub list_name: Option<String>,
    pub status_field: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub sort: Option<String>,
    pub sort_dir: Option<String>,
    pub view: Option<String>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub export_dir: Option<String>,
    pub proxy: Option<String>,
    #[serde(alias = "header")]
    pub headers: Option<Vec<String>>,
    pub timeout: Option<u64>,
    pub max_records: Option<usize>,
    pub approved_label: Option<String>,
    pub approved_marker: Option<String>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".listboard").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(ConfigFile::default()),
        Ok(contents) => serde_yaml::from_str::<ConfigFile>(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> String {
    r#"# listboard config
#
# Location (default):
#   ~/.listboard/config.yml

# Source (choose one)
# site: https://tenant.sharepoint.com/sites/operations
# input: ./snapshot.json

# List
list_name: ProcApprvlShnitzel3
status_field: _x05e1__x05d8__x05d8__x05d5__x05

# Grid
page: 1
page_size: 10
sort: Created
sort_dir: desc

# Output (optional)
view: all
# output: ./dashboard.html
# output_format: html
# export_dir: ./exports

# HTTP (optional)
# proxy: http://127.0.0.1:8080
# headers:
#   - "Authorization: Bearer <token>"
timeout: 10
max_records: 5000

# Chart colors
# approved_label: "אושר ע\"י המשתמש"
# approved_marker: "אושר"

# Output styling
no_color: false
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &Path) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_file_parses_to_documented_defaults() {
        let cfg: ConfigFile = serde_yaml::from_str(&default_config_yaml()).unwrap();
        assert_eq!(cfg.list_name.as_deref(), Some("ProcApprvlShnitzel3"));
        assert_eq!(cfg.status_field.as_deref(), Some("_x05e1__x05d8__x05d8__x05d5__x05"));
        assert_eq!(cfg.page_size, Some(10));
        assert_eq!(cfg.max_records, Some(5000));
        assert!(cfg.site.is_none());
    }

    #[test]
    fn ensure_default_config_file_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yml");
        assert!(ensure_default_config_file(&path).unwrap());
        assert!(!ensure_default_config_file(&path).unwrap());
        let cfg = load_config(&path, false).unwrap();
        assert_eq!(cfg.sort.as_deref(), Some("Created"));
    }

    #[test]
    fn missing_config_is_optional_only_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yml");
        assert_eq!(load_config(&path, true).unwrap(), ConfigFile::default());
        assert!(load_config(&path, false).unwrap_err().contains("not found"));
    }

    #[test]
    fn aliases_are_accepted() {
        let cfg: ConfigFile =
            serde_yaml::from_str("list: Requests\nheader:\n  - \"X-Token: 1\"\n").unwrap();
        assert_eq!(cfg.list_name.as_deref(), Some("Requests"));
        assert_eq!(cfg.headers.unwrap().len(), 1);
    }

    #[test]
    fn expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("./x.yml"), PathBuf::from("./x.yml"));
    }
}
