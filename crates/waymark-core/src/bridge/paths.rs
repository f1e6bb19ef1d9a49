//! Socket path resolution for the bridge.
//!
//! Each embedding application serves one socket, named after the app:
//! `{socket_dir}/{app}.sock`. Directory priority:
//! 1. `WAYMARK_SOCKET_DIR` (explicit override)
//! 2. `XDG_RUNTIME_DIR/waymark` (Linux standard)
//! 3. `~/.waymark` (home directory fallback)
//! 4. System temp dir (last resort)
//!
//! The app name defaults to `WAYMARK_APP` or "default", so a single-app
//! machine needs no configuration at all.

use std::env;
use std::path::PathBuf;

/// Current app name from env or default.
pub fn get_app() -> String {
    env::var("WAYMARK_APP").unwrap_or_else(|_| "default".to_string())
}

/// Socket directory with priority fallback. Empty env values are ignored.
pub fn get_socket_dir() -> PathBuf {
    if let Ok(dir) = env::var("WAYMARK_SOCKET_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    if let Ok(runtime_dir) = env::var("XDG_RUNTIME_DIR") {
        if !runtime_dir.is_empty() {
            return PathBuf::from(runtime_dir).join("waymark");
        }
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".waymark");
    }

    env::temp_dir().join("waymark")
}

/// Validate an app name to prevent path traversal.
///
/// App names must be non-empty, must not start with a hyphen, and may only
/// contain alphanumerics, hyphens, and underscores. Invalid names fall back
/// to "default" with a warning.
pub(crate) fn sanitize_app_name(name: &str) -> String {
    let is_valid = !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if is_valid {
        name.to_string()
    } else {
        tracing::warn!(
            "Invalid app name '{}', using 'default'. Names must contain only alphanumeric, hyphen, underscore.",
            name
        );
        "default".to_string()
    }
}

/// Socket path for an app; `None` uses the current app from [`get_app`].
pub fn get_socket_path(app: Option<&str>) -> PathBuf {
    let app = app.map(String::from).unwrap_or_else(get_app);
    let safe_app = sanitize_app_name(&app);
    get_socket_dir().join(format!("{}.sock", safe_app))
}

/// Ensure the socket directory exists with owner-only permissions (0700):
/// anyone who can reach the socket can drive the UI.
pub fn ensure_socket_dir() -> std::io::Result<()> {
    let dir = get_socket_dir();
    std::fs::create_dir_all(&dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    // Env vars are process-global; serialize the tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn app_name_defaults_without_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("WAYMARK_APP");
        assert_eq!(get_app(), "default");
    }

    #[test]
    fn explicit_socket_dir_wins() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("WAYMARK_SOCKET_DIR", "/tmp/waymark-test-dir");
        assert_eq!(get_socket_dir(), PathBuf::from("/tmp/waymark-test-dir"));
        env::remove_var("WAYMARK_SOCKET_DIR");
    }

    #[test]
    fn empty_socket_dir_override_is_ignored() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("WAYMARK_SOCKET_DIR", "");
        let dir = get_socket_dir();
        assert_ne!(dir, PathBuf::from(""));
        env::remove_var("WAYMARK_SOCKET_DIR");
    }

    #[test]
    fn socket_path_uses_app_name() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("WAYMARK_SOCKET_DIR", "/tmp/waymark-test-dir");
        let path = get_socket_path(Some("notes"));
        assert_eq!(path, PathBuf::from("/tmp/waymark-test-dir/notes.sock"));
        env::remove_var("WAYMARK_SOCKET_DIR");
    }

    #[test]
    fn traversal_attempts_fall_back_to_default() {
        assert_eq!(sanitize_app_name("../../etc/passwd"), "default");
        assert_eq!(sanitize_app_name("-rf"), "default");
        assert_eq!(sanitize_app_name(""), "default");
        assert_eq!(sanitize_app_name("my-app_2"), "my-app_2");
    }
}
