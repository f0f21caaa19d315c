//! INI file configuration adapter.

use crate::domain::error::KdtraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, KdtraderError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| KdtraderError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, KdtraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| KdtraderError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
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
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
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
    fn from_string_parses_sections() {
        let content = r#"
[data]
dir = ./data
default_suffix = .TW

[market]
index = ^TWII
sma_period = 20
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(adapter.get_string("data", "dir"), Some("./data".to_string()));
        assert_eq!(adapter.get_string("market", "index"), Some("^TWII".to_string()));
        assert_eq!(adapter.get_int("market", "sma_period", 0), 20);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[data]\ndir = d\n").unwrap();
        assert_eq!(adapter.get_string("data", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_defaults_for_missing_or_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[indicators]\nrsi = abc\n").unwrap();
        assert_eq!(adapter.get_int("indicators", "rsi", 14), 14);
        assert_eq!(adapter.get_int("indicators", "missing", 42), 42);
    }

    #[test]
    fn get_double_returns_value_or_default() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = 250000.5\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "initial_capital", 0.0), 250000.5);
        assert_eq!(adapter.get_double("backtest", "missing", 99.9), 99.9);
    }

    #[test]
    fn get_bool_accepts_common_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[market]\na = true\nb = yes\nc = 1\nd = off\ne = FALSE\nf = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("market", "a", false));
        assert!(adapter.get_bool("market", "b", false));
        assert!(adapter.get_bool("market", "c", false));
        assert!(!adapter.get_bool("market", "d", true));
        assert!(!adapter.get_bool("market", "e", true));
        assert!(adapter.get_bool("market", "f", true));
        assert!(!adapter.get_bool("market", "missing", false));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[scan]\nsubscribers = subs.csv\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("scan", "subscribers"),
            Some("subs.csv".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(KdtraderError::ConfigParse { .. })));
    }
}
