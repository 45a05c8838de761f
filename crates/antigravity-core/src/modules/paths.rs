//! Data directory resolution, shared by every persisted subsystem.
//!
//! Mirrors the teacher's `modules::account::paths::get_data_dir` precedence
//! (env var override, then home-dir default) so the repo has exactly one
//! data-directory convention, per SPEC_FULL §6.

use std::fs;
use std::path::PathBuf;

/// Directory name under `$HOME` when `ANTIGRAVITY_DATA_DIR` is unset.
pub const DATA_DIR: &str = ".antigravity_tools";

/// Resolve (and create, if missing) the data directory.
///
/// Priority:
/// 1. `ANTIGRAVITY_DATA_DIR` environment variable.
/// 2. `~/.antigravity_tools`.
pub fn get_data_dir() -> PathBuf {
    let data_dir = if let Ok(custom_dir) = std::env::var("ANTIGRAVITY_DATA_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(DATA_DIR)
    };

    if !data_dir.exists() {
        if let Err(e) = fs::create_dir_all(&data_dir) {
            tracing::error!(error = %e, path = %data_dir.display(), "failed to create data directory");
        }
    }

    data_dir
}

/// Write `content` to `dir/name` atomically via a temp-file-then-rename, the
/// same pattern the teacher uses in its config/account persistence.
pub fn write_atomic(dir: &std::path::Path, name: &str, content: &str) -> std::io::Result<()> {
    let final_path = dir.join(name);
    let tmp_path = dir.join(format!("{name}.tmp"));
    fs::write(&tmp_path, content)?;
    fs::rename(&tmp_path, &final_path)
}
