//! INI file configuration adapter.
//!
//! Nested settings use dotted section names, e.g.
//! `[stock_filters.long.trend_detection.thresholds]`.

use crate::domain::error::ScreenerError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScreenerError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| ScreenerError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, ScreenerError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| ScreenerError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
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

    fn has_section(&self, section: &str) -> bool {
        let wanted = section.to_lowercase();
        self.config.sections().iter().any(|s| *s == wanted)
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
    fn from_string_parses_dotted_sections() {
        let content = r#"
[email.smtp]
server = smtp.example.com
port = 587

[stock_filters.long.trend_detection.thresholds]
rsi_lower = 40
price_data_period = 6mo
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("email.smtp", "server"),
            Some("smtp.example.com".to_string())
        );
        assert_eq!(adapter.get_int("email.smtp", "port", 0), 587);
        assert_eq!(
            adapter.get_string("stock_filters.long.trend_detection.thresholds", "price_data_period"),
            Some("6mo".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[paths]\nstock_scores = a.csv\n").unwrap();
        assert_eq!(adapter.get_string("paths", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[analysis]\nstock_limit = abc\n").unwrap();
        assert_eq!(adapter.get_int("analysis", "stock_limit", 42), 42);
        assert_eq!(adapter.get_int("analysis", "missing", 7), 7);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter = FileConfigAdapter::from_string("[portfolio]\nnegative_weight = 12.5\n").unwrap();
        assert_eq!(adapter.get_double("portfolio", "negative_weight", 0.0), 12.5);
        assert_eq!(adapter.get_double("portfolio", "missing", 99.9), 99.9);
    }

    #[test]
    fn get_bool_values() {
        let adapter =
            FileConfigAdapter::from_string("[flags]\na = true\nb = no\nc = maybe\n").unwrap();
        assert!(adapter.get_bool("flags", "a", false));
        assert!(!adapter.get_bool("flags", "b", true));
        assert!(adapter.get_bool("flags", "c", true));
    }

    #[test]
    fn get_list_splits_and_trims() {
        let adapter =
            FileConfigAdapter::from_string("[portfolio]\nexclude_stocks = SPY, QQQ ,,IWM\n").unwrap();
        assert_eq!(adapter.get_list("portfolio", "exclude_stocks"), vec!["SPY", "QQQ", "IWM"]);
        assert!(adapter.get_list("portfolio", "missing").is_empty());
    }

    #[test]
    fn has_section_is_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[Portfolio]\nnegative_weight = 10\n").unwrap();
        assert!(adapter.has_section("portfolio"));
        assert!(adapter.has_section("PORTFOLIO"));
        assert!(!adapter.has_section("paths"));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[paths]\nstock_scores = /data/scores.csv\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("paths", "stock_scores"),
            Some("/data/scores.csv".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(ScreenerError::ConfigParse { .. })));
    }
}
