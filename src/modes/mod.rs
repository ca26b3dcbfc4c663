/*
 * Part of mlat-decoder-core - an ADS-B multilateration decoder core.
 * Based on mlat-client (https://github.com/mutability/mlat-client)
 * Copyright 2023, Timothy Mullican <timothy.j.mullican@gmail.com>
 * Copyright 2015, Oliver Jowett <oliver@mutability.co.uk>
 */

pub mod altitude;
pub mod crc;
pub mod message;

// Special DF values for non-Mode-S messages and reader-emitted events.
// Real Mode S downlink formats occupy 0..31.
pub const DF_MODEAC: u32 = 32;
pub const DF_EVENT_TIMESTAMP_JUMP: u32 = 33;
pub const DF_EVENT_MODE_CHANGE: u32 = 34;
pub const DF_EVENT_EPOCH_ROLLOVER: u32 = 35;
pub const DF_EVENT_RADARCAPE_STATUS: u32 = 36;
pub const DF_EVENT_RADARCAPE_POSITION: u32 = 37;

/// Human-readable name for one of the `DF_EVENT_*` sentinels, or `None`
/// for a real Mode S DF or `DF_MODEAC`.
pub fn event_name(df: u32) -> Option<&'static str> {
    match df {
        DF_EVENT_TIMESTAMP_JUMP => Some("TIMESTAMP_JUMP"),
        DF_EVENT_MODE_CHANGE => Some("MODE_CHANGE"),
        DF_EVENT_EPOCH_ROLLOVER => Some("EPOCH_ROLLOVER"),
        DF_EVENT_RADARCAPE_STATUS => Some("RADARCAPE_STATUS"),
        DF_EVENT_RADARCAPE_POSITION => Some("RADARCAPE_POSITION"),
        _ => None,
    }
}
