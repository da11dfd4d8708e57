//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! Produces the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[cache]
; Root directory for artifacts, lock files and progress logs
directory = {}
; Layout for file caches that do not name one:
;   tc, mp, tms, reverse_tms, quadkey, arcgis
directory_layout = {}

[registry]
; Directory of tileset records, one <id>.json per tileset
directory = {}

[engine]
; Program that produces tiles. It receives the job as JSON in TILESEED_JOB
; and must write the artifact to the path in TILESEED_OUTPUT.
command = {}
; Extra arguments, separated by whitespace
args = {}

[seed]
; Seconds a stopped worker gets to exit before it is killed
stop_grace_secs = {}

[logging]
; Log file shared by the CLI and its workers
file = {}
"#,
        path_to_string(&config.cache.directory),
        config.cache.directory_layout,
        path_to_string(&config.registry.directory),
        config.engine.command,
        config.engine.args.join(" "),
        config.seed.stop_grace_secs,
        path_to_string(&config.logging.file),
    )
}

/// Convert a path to a string, using ~ for home directory if applicable.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
