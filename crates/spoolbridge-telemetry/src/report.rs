//! Printer report decoding.
//!
//! Printers publish JSON reports on `device/<serial>/report`. Feeder data is
//! nested under `print.ams.ams`, one entry per unit:
//!
//! ```json
//! {"print": {"ams": {"ams": [
//!     {"id": "0", "temp": "24.5", "humidity": "4", "tray": [{"id": "0", "remain": 80}]}
//! ]}}}
//! ```
//!
//! Most reports are partial status pushes without that array; those decode
//! to `None` and never reach the reconciler.

use serde_json::Value;
use spoolbridge_core::{RawUnit, UnitSnapshot};
use tracing::{debug, warn};

const TOPIC_PREFIX: &str = "device/";
const TOPIC_SUFFIX: &str = "/report";

/// Report topic for a printer serial.
#[must_use]
pub fn report_topic(printer_id: &str) -> String {
    format!("{TOPIC_PREFIX}{printer_id}{TOPIC_SUFFIX}")
}

/// Extract the printer serial from a report topic.
#[must_use]
pub fn printer_id_from_topic(topic: &str) -> Option<&str> {
    topic
        .strip_prefix(TOPIC_PREFIX)?
        .strip_suffix(TOPIC_SUFFIX)
        .filter(|id| !id.is_empty() && !id.contains('/'))
}

/// Decode the feeder units of a report.
///
/// Returns `None` when the payload is not JSON or carries no feeder array.
/// Units that fail to decode, including those with an id outside 0-3, are
/// dropped with a warning.
#[must_use]
pub fn decode_report(payload: &[u8]) -> Option<Vec<UnitSnapshot>> {
    let report: Value = match serde_json::from_slice(payload) {
        Ok(report) => report,
        Err(e) => {
            debug!(error = %e, "Report is not valid JSON");
            return None;
        }
    };

    let units = report.pointer("/print/ams/ams")?.as_array()?;

    let snapshots = units
        .iter()
        .filter_map(|unit| {
            let raw: RawUnit = match serde_json::from_value(unit.clone()) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(error = %e, "Dropping malformed feeder unit");
                    return None;
                }
            };
            UnitSnapshot::try_from(raw)
                .inspect_err(|e| warn!(error = %e, "Dropping feeder unit"))
                .ok()
        })
        .collect();

    Some(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use spoolbridge_core::AmsUnitId;

    #[rstest]
    #[case("device/01S00C000000001/report", Some("01S00C000000001"))]
    #[case("device/01S00C000000001/request", None)]
    #[case("device//report", None)]
    #[case("device/a/b/report", None)]
    #[case("printer/01S00C000000001/report", None)]
    fn test_printer_id_from_topic(#[case] topic: &str, #[case] expected: Option<&str>) {
        assert_eq!(printer_id_from_topic(topic), expected);
    }

    #[test]
    fn test_report_topic_roundtrip() {
        let topic = report_topic("01P00A000000002");
        assert_eq!(topic, "device/01P00A000000002/report");
        assert_eq!(printer_id_from_topic(&topic), Some("01P00A000000002"));
    }

    #[test]
    fn test_decode_feeder_report() {
        let payload = json!({
            "print": {
                "command": "push_status",
                "ams": {
                    "ams": [
                        {"id": "0", "temp": "24.5", "humidity": "4", "tray": [
                            {"id": "0", "remain": 80, "tray_uuid": "A1B2C3D4E5F60718293A4B5C6D7E8F90",
                             "tray_color": "FF6A13FF", "tray_sub_brands": "PLA Basic", "tray_weight": "1000"},
                            {"id": "1"}
                        ]},
                        {"id": "1", "temp": "25.0", "humidity": "3", "tray": []}
                    ],
                    "tray_now": "0"
                }
            }
        })
        .to_string();

        let units = decode_report(payload.as_bytes()).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].unit, AmsUnitId::A);
        assert_eq!(units[0].trays.len(), 2);
        assert!(units[0].trays[1].is_empty_slot());
        assert_eq!(units[1].unit, AmsUnitId::B);
    }

    #[rstest]
    #[case(json!({"print": {"command": "push_status", "mc_percent": 42}}))]
    #[case(json!({"print": {"ams": {"tray_now": "255"}}}))]
    #[case(json!({"print": {"ams": {"ams": "not-a-list"}}}))]
    #[case(json!({"info": {"command": "get_version"}}))]
    fn test_decode_without_feeder_data(#[case] report: Value) {
        assert!(decode_report(report.to_string().as_bytes()).is_none());
    }

    #[test]
    fn test_decode_invalid_json() {
        assert!(decode_report(b"{not json").is_none());
    }

    #[test]
    fn test_decode_drops_unmappable_units() {
        let payload = json!({"print": {"ams": {"ams": [
            {"id": "7", "tray": []},
            {"id": "2", "tray": []},
            {"tray": []}
        ]}}})
        .to_string();

        let units = decode_report(payload.as_bytes()).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].unit, AmsUnitId::C);
    }
}
