//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }

    fn sections(&self) -> Vec<String> {
        let mut sections = self.config.sections();
        sections.sort();
        sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[paths]
positions_file = state/positions.csv

[tracker:NSE:SBIN-EQ]
strategy = SMA Crossover
trade_type = Intraday
quantity = 10
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("paths", "positions_file"),
            Some("state/positions.csv".to_string())
        );
        assert_eq!(
            adapter.get_string("tracker:NSE:SBIN-EQ", "strategy"),
            Some("SMA Crossover".to_string())
        );
        assert_eq!(adapter.get_int("tracker:NSE:SBIN-EQ", "quantity", 0), 10);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[paths]\ndata_dir = data\n").unwrap();
        assert_eq!(adapter.get_string("paths", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[session]\npool_size = abc\n").unwrap();
        assert_eq!(adapter.get_int("session", "pool_size", 10), 10);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter = FileConfigAdapter::from_string("[session]\nspeed = 2.5\n").unwrap();
        assert_eq!(adapter.get_double("session", "speed", 1.0), 2.5);
    }

    #[test]
    fn get_bool_parses_common_spellings() {
        let adapter =
            FileConfigAdapter::from_string("[session]\na = true\nb = no\nc = 1\n").unwrap();
        assert!(adapter.get_bool("session", "a", false));
        assert!(!adapter.get_bool("session", "b", true));
        assert!(adapter.get_bool("session", "c", false));
    }

    #[test]
    fn sections_lists_all_sections_sorted() {
        let content = "[tracker:NSE:TCS-EQ]\nstrategy = x\n[paths]\ndata_dir = d\n\
            [tracker:NSE:SBIN-EQ]\nstrategy = y\n";
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.sections(),
            vec![
                "paths".to_string(),
                "tracker:nse:sbin-eq".to_string(),
                "tracker:nse:tcs-eq".to_string(),
            ]
        );
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[paths]\ndata_dir = /var/data\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("paths", "data_dir"),
            Some("/var/data".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(result.is_err());
    }
}
