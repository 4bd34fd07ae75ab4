use crate::report::report_topic;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Identity of one printer, as configured.
#[derive(Clone, PartialEq, Eq)]
pub struct PrinterConfig {
    /// Serial number, also used in report topics
    pub id: String,
    /// LAN address of the printer
    pub ip: String,
    /// LAN access code
    pub access_code: String,
}

/// TLS port of the printer's LAN MQTT broker.
pub const MQTT_PORT: u16 = 8883;

/// Fixed username of the printer's LAN MQTT broker.
pub const MQTT_USERNAME: &str = "bblp";

impl PrinterConfig {
    /// `mosquitto_sub` arguments that print this printer's reports in the
    /// `<topic> <payload>` form the bridge reads.
    ///
    /// The broker uses a self-signed certificate; add `--cafile` for it.
    pub fn subscribe_args(&self) -> Vec<String> {
        vec![
            "-v".to_string(),
            "-h".to_string(),
            self.ip.clone(),
            "-p".to_string(),
            MQTT_PORT.to_string(),
            "-u".to_string(),
            MQTT_USERNAME.to_string(),
            "-P".to_string(),
            self.access_code.clone(),
            "--insecure".to_string(),
            "-t".to_string(),
            report_topic(&self.id),
        ]
    }
}

impl fmt::Debug for PrinterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrinterConfig")
            .field("id", &self.id)
            .field("ip", &self.ip)
            .field("access_code", &"<redacted>")
            .finish()
    }
}

/// Connection state of a printer's telemetry feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterStatus {
    Disconnected,
    Connected,
}

impl fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Read-only view of a printer. Never carries the access code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrinterInfo {
    pub printer_id: String,
    pub ip: String,
    pub status: PrinterStatus,
    /// Feeder units in the last feeder report
    pub ams_unit_count: Option<usize>,
    /// Loaded trays in the last feeder report
    pub active_tray_count: Option<usize>,
    pub last_message: Option<DateTime<Utc>>,
    pub last_ams_message: Option<DateTime<Utc>>,
}

impl PrinterInfo {
    pub fn new(config: &PrinterConfig) -> Self {
        Self {
            printer_id: config.id.clone(),
            ip: config.ip.clone(),
            status: PrinterStatus::Disconnected,
            ams_unit_count: None,
            active_tray_count: None,
            last_message: None,
            last_ams_message: None,
        }
    }
}
