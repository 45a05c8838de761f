//! Test helpers for antigravity-server handler tests.

use tempfile::TempDir;

use crate::state::AppState;

/// A fresh `AppState` rooted at a throwaway temp directory.
///
/// Returns `(AppState, TempDir)` — keep `TempDir` alive for the test duration,
/// otherwise its directory is removed while the state still references it.
pub fn test_app_state() -> (AppState, TempDir) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let state = AppState::new(temp_dir.path().to_path_buf());
    (state, temp_dir)
}
