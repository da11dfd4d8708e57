//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::job::DIRECTORY_LAYOUTS;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = non_empty(section.get("directory")) {
            config.cache.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("directory_layout")) {
            let v = v.to_lowercase();
            if !DIRECTORY_LAYOUTS.contains(&v.as_str()) {
                return Err(ConfigFileError::InvalidValue {
                    section: "cache".to_string(),
                    key: "directory_layout".to_string(),
                    value: v,
                    reason: format!("must be one of: {}", DIRECTORY_LAYOUTS.join(", ")),
                });
            }
            config.cache.directory_layout = v;
        }
    }

    // [registry] section
    if let Some(section) = ini.section(Some("registry")) {
        if let Some(v) = non_empty(section.get("directory")) {
            config.registry.directory = expand_tilde(v);
        }
    }

    // [engine] section
    if let Some(section) = ini.section(Some("engine")) {
        if let Some(v) = non_empty(section.get("command")) {
            config.engine.command = expand_tilde(v).to_string_lossy().into_owned();
        }
        if let Some(v) = section.get("args") {
            config.engine.args = v.split_whitespace().map(str::to_string).collect();
        }
    }

    // [seed] section
    if let Some(section) = ini.section(Some("seed")) {
        if let Some(v) = section.get("stop_grace_secs") {
            config.seed.stop_grace_secs =
                v.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "seed".to_string(),
                    key: "stop_grace_secs".to_string(),
                    value: v.to_string(),
                    reason: "must be a non-negative integer (seconds)".to_string(),
                })?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section.get("file")) {
            config.logging.file = expand_tilde(v);
        }
    }

    Ok(config)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use crate::config::settings::ConfigFile;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, content).unwrap();
        ConfigFile::load_from(&path)
    }

    #[test]
    fn test_full_config() {
        let config = load(
            r#"
[cache]
directory = /srv/tiles
directory_layout = quadkey

[registry]
directory = /srv/tilesets

[engine]
command = /usr/local/bin/seed-engine
args = --quiet --threads 4

[seed]
stop_grace_secs = 12

[logging]
file = /var/log/tileseed.log
"#,
        )
        .unwrap();

        assert_eq!(config.cache.directory, PathBuf::from("/srv/tiles"));
        assert_eq!(config.cache.directory_layout, "quadkey");
        assert_eq!(config.registry.directory, PathBuf::from("/srv/tilesets"));
        assert_eq!(config.engine.command, "/usr/local/bin/seed-engine");
        assert_eq!(config.engine.args, vec!["--quiet", "--threads", "4"]);
        assert_eq!(config.seed.stop_grace_secs, 12);
        assert_eq!(config.logging.file, PathBuf::from("/var/log/tileseed.log"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = load("[seed]\nstop_grace_secs = 1\n").unwrap();

        assert_eq!(config.seed.stop_grace_secs, 1);
        assert_eq!(config.cache.directory_layout, DEFAULT_DIRECTORY_LAYOUT);
        assert_eq!(config.engine.command, DEFAULT_ENGINE_COMMAND);
    }

    #[test]
    fn test_empty_values_keep_defaults() {
        let config = load("[cache]\ndirectory =\n").unwrap();
        assert_eq!(config.cache.directory, default_cache_dir());
    }

    #[test]
    fn test_invalid_layout() {
        let result = load("[cache]\ndirectory_layout = spiral\n");
        assert!(matches!(
            result,
            Err(ConfigFileError::InvalidValue { ref key, .. }) if key == "directory_layout"
        ));
    }

    #[test]
    fn test_invalid_grace() {
        let result = load("[seed]\nstop_grace_secs = soon\n");
        assert!(matches!(result, Err(ConfigFileError::InvalidValue { .. })));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/tiles");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("tiles"));
        }
        assert_eq!(expand_tilde("/abs/tiles"), PathBuf::from("/abs/tiles"));
    }
}
