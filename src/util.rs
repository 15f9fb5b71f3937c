use std::path::PathBuf;

use chrono::{DateTime, Local};

const CONFIG_PATH: &str = "THERMO_GUARD_CONFIG";

pub fn get_config_path() -> Option<PathBuf> {
    let path_from_env = std::env::var(CONFIG_PATH);
    path_from_env.ok().map(PathBuf::from)
}

const LOG_DIR: &str = "THERMO_GUARD_LOG_DIR";

pub fn get_log_dir() -> Option<PathBuf> {
    let dir_from_env = std::env::var(LOG_DIR);
    dir_from_env.ok().map(PathBuf::from)
}

/// File name of the diagnostic log for a run started at `started`
///
/// Format: `log_YYYY_MM_DD_HH_MM_SS.txt`
pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("log_{}.txt", started.format("%Y_%m_%d_%H_%M_%S"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_log_file_name_format() {
        let started = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(log_file_name(started), "log_2024_03_07_09_05_01.txt");
    }
}
