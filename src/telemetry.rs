//! File-backed trace logging. The terminal belongs to the UI, so nothing is
//! ever written to stdout or stderr from here.

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

const DEFAULT_FILTER: &str = "tt=debug";

pub fn tracing_log_path() -> PathBuf {
    env::var("TT_LOG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("tt.log"))
}

/// Logging is on when requested on the command line or via `TT_LOG`.
pub fn tracing_enabled(requested: bool) -> bool {
    requested || env::var_os("TT_LOG").is_some()
}

fn init_tracing_once(requested: bool, once: &OnceLock<()>) {
    if !tracing_enabled(requested) {
        return;
    }

    let _ = once.get_or_init(|| {
        let path = tracing_log_path();
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => file,
            Err(_) => return,
        };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .with_target(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

pub fn init_tracing(requested: bool) {
    init_tracing_once(requested, &TRACING_INIT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn unique_log_path(suffix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        env::temp_dir().join(format!("tt-log-{suffix}-{nanos}.log"))
    }

    #[test]
    fn log_path_prefers_env_override() {
        let _guard = env_lock().lock().unwrap();
        let path = unique_log_path("env");
        env::set_var("TT_LOG_FILE", &path);
        assert_eq!(tracing_log_path(), path);
        env::remove_var("TT_LOG_FILE");
    }

    #[test]
    fn log_path_defaults_to_temp_dir() {
        let _guard = env_lock().lock().unwrap();
        env::remove_var("TT_LOG_FILE");
        assert_eq!(tracing_log_path(), env::temp_dir().join("tt.log"));
    }

    #[test]
    fn enabled_by_flag_or_env() {
        let _guard = env_lock().lock().unwrap();
        env::remove_var("TT_LOG");
        assert!(!tracing_enabled(false));
        assert!(tracing_enabled(true));

        env::set_var("TT_LOG", "1");
        assert!(tracing_enabled(false));
        env::remove_var("TT_LOG");
    }

    #[test]
    fn init_creates_file_only_when_enabled() {
        let _guard = env_lock().lock().unwrap();
        env::remove_var("TT_LOG");

        let disabled_path = unique_log_path("disabled");
        env::set_var("TT_LOG_FILE", &disabled_path);
        init_tracing_once(false, &OnceLock::new());
        assert!(!disabled_path.exists());

        let enabled_path = unique_log_path("enabled");
        env::set_var("TT_LOG_FILE", &enabled_path);
        init_tracing_once(true, &OnceLock::new());
        assert!(enabled_path.exists());

        env::remove_var("TT_LOG_FILE");
        let _ = fs::remove_file(enabled_path);
    }
}
