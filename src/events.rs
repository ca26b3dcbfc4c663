/*
 * Part of mlat-decoder-core - an ADS-B multilateration decoder core.
 * Based on mlat-client (https://github.com/mutability/mlat-client)
 * Copyright 2023, Timothy Mullican <timothy.j.mullican@gmail.com>
 * Copyright 2015, Oliver Jowett <oliver@mutability.co.uk>
 */

//! Structured payloads for the metadata events the reader emits (mode
//! changes, timestamp jumps, epoch rollovers, Radarcape status/position).
//!
//! The teacher modelled these as a `BTreeMap<String, EventData>`; a
//! variant per event kind lets the field names in §6 stay but drops the
//! stringly-typed lookups.

use crate::mode::Mode;

#[derive(Clone, Debug, PartialEq)]
pub enum EventData {
    ModeChange {
        mode: Mode,
        frequency: u64,
        epoch: Option<&'static str>,
    },
    TimestampJump {
        last_timestamp: u64,
    },
    EpochRollover,
    RadarcapeStatus {
        settings: Vec<&'static str>,
        timestamp_pps_delta: i32,
        gps_status: Option<GpsStatus>,
    },
    RadarcapePosition {
        lat: f32,
        lon: f32,
        alt: f32,
    },
}

/// Decoded GPS status byte from a Radarcape status frame, present only
/// when the high bit (0x80) of the raw byte is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GpsStatus {
    pub fix_3d: bool,
    pub tracking_sats: bool,
    pub antenna_ok: bool,
    pub pps_ok: bool,
    pub clock_stable: bool,
    pub survey_complete: bool,
}

impl GpsStatus {
    /// Decodes the six boolean subfields from a raw status byte, or
    /// `None` if bit 0x80 (the "status valid" marker) is clear.
    pub fn decode(raw: u8) -> Option<Self> {
        if raw & 0x80 == 0 {
            return None;
        }
        Some(GpsStatus {
            fix_3d: raw & 0x01 != 0,
            tracking_sats: raw & 0x02 != 0,
            antenna_ok: raw & 0x04 != 0,
            pps_ok: raw & 0x08 != 0,
            clock_stable: raw & 0x10 != 0,
            survey_complete: raw & 0x20 != 0,
        })
    }
}

/// Decodes the eight-bit Radarcape settings byte into the label set
/// described in §6: one label from each of the seven mutually exclusive
/// pairs below, selected by its bit.
pub fn decode_settings(raw: u8) -> Vec<&'static str> {
    let pairs: [(u8, &str, &str); 7] = [
        (0x01, "avrmlat", "beast"),
        (0x02, "all_frames", "filtered_frames"),
        (0x04, "check_crc", "no_crc"),
        (0x08, "gps_timestamps", "legacy_timestamps"),
        (0x10, "no_rtscts", "rtscts"),
        (0x20, "fec", "no_fec"),
        (0x40, "no_modeac", "modeac"),
    ];
    pairs
        .iter()
        .map(|&(bit, set, clear)| if raw & bit != 0 { set } else { clear })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gps_status_absent_without_valid_bit() {
        assert_eq!(GpsStatus::decode(0x3F), None);
    }

    #[test]
    fn gps_status_decodes_all_subfields() {
        let status = GpsStatus::decode(0xBF).unwrap();
        assert!(status.fix_3d);
        assert!(status.tracking_sats);
        assert!(status.antenna_ok);
        assert!(status.pps_ok);
        assert!(status.clock_stable);
        assert!(status.survey_complete);
    }

    #[test]
    fn gps_status_all_clear_but_valid() {
        let status = GpsStatus::decode(0x80).unwrap();
        assert!(!status.fix_3d);
        assert!(!status.survey_complete);
    }

    #[test]
    fn settings_decode_picks_one_label_per_bit() {
        let labels = decode_settings(0x00);
        assert_eq!(
            labels,
            vec![
                "beast",
                "filtered_frames",
                "no_crc",
                "legacy_timestamps",
                "rtscts",
                "no_fec",
                "modeac",
            ]
        );
        let labels = decode_settings(0xFF);
        assert_eq!(
            labels,
            vec![
                "avrmlat",
                "all_frames",
                "check_crc",
                "gps_timestamps",
                "no_rtscts",
                "fec",
                "no_modeac",
            ]
        );
    }
}
