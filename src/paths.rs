use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the log file path: `<exe_dir>/logs/chart_ocr.log`
pub fn get_log_file() -> PathBuf {
    get_logs_dir().join("chart_ocr.log")
}

/// Returns the per-user config directory: `<config_dir>/chart-ocr/`
pub fn get_user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chart-ocr"))
}

/// Implicit config.json locations, in lookup order.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![get_exe_dir().join("config.json")];
    if let Some(dir) = get_user_config_dir() {
        paths.push(dir.join("config.json"));
    }
    paths
}

/// Ensures the log directory exists. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_search_starts_next_to_executable() {
        let paths = config_search_paths();
        assert_eq!(paths[0], get_exe_dir().join("config.json"));
        assert!(paths.iter().all(|p| p.ends_with("config.json")));
    }
}
