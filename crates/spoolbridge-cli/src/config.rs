//! Configuration for the spoolbridge daemon
//!
//! Settings come from an optional TOML file and are then overridden by
//! `SPOOLBRIDGE_*` environment variables:
//!
//! ```toml
//! [spoolman]
//! url = "http://192.168.1.20:7912"
//! tag = "Tag"
//! timeout_secs = 5
//! healthcheck_interval_secs = 3600   # 0 disables the periodic check
//!
//! [logging]
//! level = "info"
//!
//! [[printers]]
//! id = "01S00C000000001"
//! ip = "192.168.1.50"
//! access_code = "12345678"
//! ```
//!
//! Printers can also be declared as `SPOOLBRIDGE_PRINTER_<N>_ID`, `_IP` and
//! `_CODE`, where `<N>` groups the three variables of one printer.

use serde::Deserialize;
use spoolbridge_catalog::SpoolmanConfig;
use spoolbridge_core::constants::{
    DEFAULT_CATALOG_TIMEOUT_SECS, DEFAULT_HEALTHCHECK_INTERVAL_SECS, DEFAULT_TAG_FIELD,
};
use spoolbridge_core::{Error, Result, TagField};
use spoolbridge_telemetry::PrinterConfig;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

const ENV_PREFIX: &str = "SPOOLBRIDGE_";
const PRINTER_ENV_PREFIX: &str = "SPOOLBRIDGE_PRINTER_";

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub spoolman: SpoolmanSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub printers: Vec<PrinterEntry>,
}

/// Inventory service settings
#[derive(Debug, Clone, Deserialize)]
pub struct SpoolmanSection {
    /// Service root (default: http://localhost:7912)
    #[serde(default = "default_url")]
    pub url: String,

    /// Name of the spool extra field holding the claiming tray UUID (default: Tag)
    #[serde(default = "default_tag")]
    pub tag: String,

    /// Per-request timeout in seconds (default: 5)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Seconds between health checks, 0 to disable (default: 3600)
    #[serde(default = "default_healthcheck_interval_secs")]
    pub healthcheck_interval_secs: u64,
}

impl Default for SpoolmanSection {
    fn default() -> Self {
        Self {
            url: default_url(),
            tag: default_tag(),
            timeout_secs: default_timeout_secs(),
            healthcheck_interval_secs: default_healthcheck_interval_secs(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Default filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// One printer as written in the config file
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct PrinterEntry {
    pub id: String,
    pub ip: String,
    pub access_code: String,
}

impl std::fmt::Debug for PrinterEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrinterEntry")
            .field("id", &self.id)
            .field("ip", &self.ip)
            .finish_non_exhaustive()
    }
}

fn default_url() -> String {
    SpoolmanConfig::default().base_url
}

fn default_tag() -> String {
    DEFAULT_TAG_FIELD.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_CATALOG_TIMEOUT_SECS
}

fn default_healthcheck_interval_secs() -> u64 {
    DEFAULT_HEALTHCHECK_INTERVAL_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Apply `SPOOLBRIDGE_*` overrides from the process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are ignored.
    pub fn apply_process_env(&mut self) -> Result<Vec<String>> {
        self.apply_env(utf8_vars(std::env::vars_os()))
    }

    /// Apply `SPOOLBRIDGE_*` overrides.
    ///
    /// Printer variables are grouped by their `<N>` index. A complete group
    /// replaces a file entry with the same id or is appended. Returns the
    /// indices of incomplete groups, which are skipped.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut printer_vars: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();

        for (name, value) in vars {
            if let Some(rest) = name.strip_prefix(PRINTER_ENV_PREFIX) {
                if let Some((index, field)) = rest.rsplit_once('_') {
                    printer_vars
                        .entry(index.to_string())
                        .or_default()
                        .insert(field.to_ascii_lowercase(), value);
                }
                continue;
            }

            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match key {
                "SPOOLMAN_URL" => self.spoolman.url = value,
                "SPOOLMAN_TAG" => self.spoolman.tag = value,
                "SPOOLMAN_TIMEOUT_SECS" => self.spoolman.timeout_secs = parse_secs(&name, &value)?,
                "HEALTHCHECK_INTERVAL_SECS" => {
                    self.spoolman.healthcheck_interval_secs = parse_secs(&name, &value)?;
                }
                "LOG_LEVEL" => self.logging.level = value,
                _ => {}
            }
        }

        let mut skipped = Vec::new();
        for (index, mut fields) in printer_vars {
            let (Some(id), Some(ip), Some(access_code)) =
                (fields.remove("id"), fields.remove("ip"), fields.remove("code"))
            else {
                skipped.push(index);
                continue;
            };

            let entry = PrinterEntry { id, ip, access_code };
            match self.printers.iter_mut().find(|p| p.id == entry.id) {
                Some(existing) => *existing = entry,
                None => self.printers.push(entry),
            }
        }

        Ok(skipped)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.spoolman.url.trim().is_empty() {
            return Err(Error::MissingConfig("spoolman.url".to_string()));
        }
        if self.spoolman.tag.trim().is_empty() {
            return Err(Error::MissingConfig("spoolman.tag".to_string()));
        }
        if self.spoolman.timeout_secs == 0 {
            return Err(Error::Config("spoolman.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn spoolman_config(&self) -> SpoolmanConfig {
        SpoolmanConfig {
            base_url: self.spoolman.url.clone(),
            timeout: Duration::from_secs(self.spoolman.timeout_secs),
        }
    }

    pub fn tag_field(&self) -> TagField {
        TagField::new(self.spoolman.tag.clone())
    }

    /// Health check period, or `None` when disabled
    pub fn healthcheck_interval(&self) -> Option<Duration> {
        match self.spoolman.healthcheck_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn printer_configs(&self) -> Vec<PrinterConfig> {
        self.printers
            .iter()
            .map(|p| PrinterConfig {
                id: p.id.clone(),
                ip: p.ip.clone(),
                access_code: p.access_code.clone(),
            })
            .collect()
    }
}

fn parse_secs(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name}: expected whole seconds, got '{value}'")))
}

fn utf8_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AppConfig::parse("").unwrap();

        assert_eq!(config.spoolman.url, "http://localhost:7912");
        assert_eq!(config.spoolman.tag, "Tag");
        assert_eq!(config.spoolman.timeout_secs, 5);
        assert_eq!(config.healthcheck_interval(), Some(Duration::from_secs(3600)));
        assert_eq!(config.logging.level, "info");
        assert!(config.printers.is_empty());
    }

    #[test]
    fn test_parse_full_file() {
        let config = AppConfig::parse(
            r#"
            [spoolman]
            url = "http://192.168.1.20:7912"
            tag = "RFID"
            timeout_secs = 10
            healthcheck_interval_secs = 0

            [logging]
            level = "debug"

            [[printers]]
            id = "01S00C000000001"
            ip = "192.168.1.50"
            access_code = "12345678"
            "#,
        )
        .unwrap();

        assert_eq!(config.spoolman_config().timeout, Duration::from_secs(10));
        assert_eq!(config.tag_field().key(), "rfid");
        assert_eq!(config.healthcheck_interval(), None);
        assert_eq!(config.logging.level, "debug");

        let printers = config.printer_configs();
        assert_eq!(printers.len(), 1);
        assert_eq!(printers[0].access_code, "12345678");
    }

    #[test]
    fn test_parse_invalid_file() {
        let result = AppConfig::parse("[spoolman]\ntimeout_secs = \"soon\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = AppConfig::parse("[spoolman]\nurl = \"http://file:7912\"").unwrap();

        let skipped = config
            .apply_env(env(&[
                ("SPOOLBRIDGE_SPOOLMAN_URL", "http://env:7912"),
                ("SPOOLBRIDGE_SPOOLMAN_TAG", "Serial"),
                ("SPOOLBRIDGE_SPOOLMAN_TIMEOUT_SECS", "3"),
                ("SPOOLBRIDGE_HEALTHCHECK_INTERVAL_SECS", "600"),
                ("SPOOLBRIDGE_LOG_LEVEL", "warn"),
                ("PATH", "/usr/bin"),
            ]))
            .unwrap();

        assert!(skipped.is_empty());
        assert_eq!(config.spoolman.url, "http://env:7912");
        assert_eq!(config.spoolman.tag, "Serial");
        assert_eq!(config.spoolman.timeout_secs, 3);
        assert_eq!(config.healthcheck_interval(), Some(Duration::from_secs(600)));
        assert_eq!(config.logging.level, "warn");
    }

    #[rstest]
    #[case("SPOOLBRIDGE_SPOOLMAN_TIMEOUT_SECS", "five")]
    #[case("SPOOLBRIDGE_HEALTHCHECK_INTERVAL_SECS", "-1")]
    fn test_env_rejects_bad_seconds(#[case] name: &str, #[case] value: &str) {
        let mut config = AppConfig::default();
        let result = config.apply_env(env(&[(name, value)]));
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains(name)));
    }

    #[test]
    fn test_env_printers_grouped_by_index() {
        let mut config = AppConfig::default();

        let skipped = config
            .apply_env(env(&[
                ("SPOOLBRIDGE_PRINTER_1_ID", "P1"),
                ("SPOOLBRIDGE_PRINTER_2_IP", "10.0.0.3"),
                ("SPOOLBRIDGE_PRINTER_1_IP", "10.0.0.2"),
                ("SPOOLBRIDGE_PRINTER_2_ID", "P2"),
                ("SPOOLBRIDGE_PRINTER_1_CODE", "code1"),
                ("SPOOLBRIDGE_PRINTER_2_CODE", "code2"),
            ]))
            .unwrap();

        assert!(skipped.is_empty());
        let ids: Vec<&str> = config.printers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2"]);
        assert_eq!(config.printers[1].ip, "10.0.0.3");
    }

    #[test]
    fn test_incomplete_env_printer_skipped() {
        let mut config = AppConfig::default();

        let skipped = config
            .apply_env(env(&[
                ("SPOOLBRIDGE_PRINTER_1_ID", "P1"),
                ("SPOOLBRIDGE_PRINTER_1_IP", "10.0.0.2"),
            ]))
            .unwrap();

        assert_eq!(skipped, vec!["1".to_string()]);
        assert!(config.printers.is_empty());
    }

    #[test]
    fn test_env_printer_replaces_file_entry() {
        let mut config = AppConfig::parse(
            "[[printers]]\nid = \"P1\"\nip = \"10.0.0.2\"\naccess_code = \"old\"",
        )
        .unwrap();

        config
            .apply_env(env(&[
                ("SPOOLBRIDGE_PRINTER_A_ID", "P1"),
                ("SPOOLBRIDGE_PRINTER_A_IP", "10.0.0.9"),
                ("SPOOLBRIDGE_PRINTER_A_CODE", "new"),
            ]))
            .unwrap();

        assert_eq!(config.printers.len(), 1);
        assert_eq!(config.printers[0].ip, "10.0.0.9");
        assert_eq!(config.printers[0].access_code, "new");
    }

    #[test]
    fn test_debug_hides_access_code() {
        let entry = PrinterEntry {
            id: "P1".to_string(),
            ip: "10.0.0.2".to_string(),
            access_code: "12345678".to_string(),
        };
        assert!(!format!("{entry:?}").contains("12345678"));
    }

    #[rstest]
    #[case("[spoolman]\nurl = \"\"")]
    #[case("[spoolman]\ntag = \" \"")]
    #[case("[spoolman]\ntimeout_secs = 0")]
    fn test_validate_rejects(#[case] content: &str) {
        let config = AppConfig::parse(content).unwrap();
        assert!(config.validate().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_env_vars_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let vars = vec![
            (
                OsString::from("SPOOLBRIDGE_PRINTER_0_ID"),
                OsString::from("01S00C000000001"),
            ),
            (
                OsString::from("SPOOLBRIDGE_PRINTER_0_IP"),
                OsString::from("192.168.1.50"),
            ),
            (
                OsString::from("SPOOLBRIDGE_PRINTER_0_CODE"),
                OsString::from("12345678"),
            ),
            (
                OsString::from_vec(b"SPOOLBRIDGE_\xff".to_vec()),
                OsString::from("x"),
            ),
            (
                OsString::from("SPOOLBRIDGE_SPOOLMAN_URL"),
                OsString::from_vec(b"http://\xfe".to_vec()),
            ),
        ];

        let mut config = AppConfig::default();
        let skipped = config.apply_env(utf8_vars(vars)).unwrap();

        assert!(skipped.is_empty());
        assert_eq!(config.spoolman.url, "http://localhost:7912");
        assert_eq!(config.printers.len(), 1);
        assert_eq!(config.printers[0].id, "01S00C000000001");
    }
}
