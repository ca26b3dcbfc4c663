/*
 * Part of mlat-decoder-core - an ADS-B multilateration decoder core.
 * Based on mlat-client (https://github.com/mutability/mlat-client)
 * Copyright 2023, Timothy Mullican <timothy.j.mullican@gmail.com>
 * Copyright 2015, Oliver Jowett <oliver@mutability.co.uk>
 */

//! The decoded `Message` value type and the field decoder that builds one
//! from a raw Mode S / Mode A/C payload.

use std::fmt;

use crate::events::EventData;
use crate::modes::altitude::{decode_ac12, decode_ac13};
use crate::modes::crc::residual;
use crate::modes::{DF_MODEAC, DF_EVENT_MODE_CHANGE};

/// One decoded Mode S/A/C frame, or one metadata event.
///
/// `valid ⇒ payload.len() ∈ {2, 7, 14}`. `even_cpr` and `odd_cpr` are
/// never both set. Event messages (`df >= DF_MODEAC`) carry `eventdata`
/// and no `payload`.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub timestamp: u64,
    pub signal: u8,
    pub df: u32,
    pub nuc: u32,
    pub even_cpr: bool,
    pub odd_cpr: bool,
    pub valid: bool,
    pub crc_residual: Option<u32>,
    pub address: Option<u32>,
    pub altitude: Option<i32>,
    pub eventdata: Option<EventData>,
    pub payload: Option<Vec<u8>>,
}

impl Message {
    /// Decodes a raw 2/7/14-byte payload into a `Message`, per the field
    /// decoder's DF dispatch table. An unsupported length or unknown DF
    /// leaves the message with `valid = false` and no derived fields.
    pub fn from_frame(timestamp: u64, signal: u8, payload: Vec<u8>) -> Self {
        let mut msg = Message {
            timestamp,
            signal,
            df: 0,
            nuc: 0,
            even_cpr: false,
            odd_cpr: false,
            valid: false,
            crc_residual: None,
            address: None,
            altitude: None,
            eventdata: None,
            payload: None,
        };

        if payload.len() == 2 {
            msg.df = DF_MODEAC;
            msg.address = Some(((payload[0] as u32) << 8) | payload[1] as u32);
            msg.valid = true;
            msg.payload = Some(payload);
            return msg;
        }

        let df = ((payload[0] >> 3) & 0x1F) as u32;
        msg.df = df;

        let length_ok = if df < 16 {
            payload.len() == 7
        } else {
            payload.len() == 14
        };
        if !length_ok {
            msg.payload = Some(payload);
            return msg;
        }

        let crc = residual(&payload);
        msg.crc_residual = Some(crc);

        match df {
            0 | 4 | 16 | 20 => {
                msg.address = Some(crc);
                msg.altitude = decode_ac13(((payload[2] as u32 & 0x1F) << 8) | payload[3] as u32);
                msg.valid = true;
            }
            5 | 21 | 24 => {
                msg.address = Some(crc);
                msg.valid = true;
            }
            11 => {
                msg.valid = (crc & !0x7F) == 0;
                if msg.valid {
                    msg.address = Some(
                        ((payload[1] as u32) << 16) | ((payload[2] as u32) << 8) | payload[3] as u32,
                    );
                }
            }
            17 | 18 => {
                // DF18 uses the same decode, with tolerant CRC checking
                // (DF18 frames may be relayed by a TIS-B ground station
                // and do not carry a parity-protected address).
                msg.valid = crc == 0 || df == 18;
                if msg.valid {
                    msg.address = Some(
                        ((payload[1] as u32) << 16) | ((payload[2] as u32) << 8) | payload[3] as u32,
                    );
                    let metype = payload[4] >> 3;
                    if (9..=18).contains(&metype) || (20..22).contains(&metype) {
                        msg.nuc = if metype == 22 {
                            0
                        } else if metype <= 18 {
                            18 - metype as u32
                        } else {
                            29 - metype as u32
                        };
                        if payload[6] & 0x04 != 0 {
                            msg.odd_cpr = true;
                        } else {
                            msg.even_cpr = true;
                        }
                        msg.altitude = decode_ac12(
                            ((payload[5] as u32) << 4) | ((payload[6] as u32 & 0xF0) >> 4),
                        );

                        if cpr_fields_are_implausible(&payload) {
                            msg.valid = false;
                        }
                    }
                }
            }
            _ => {}
        }

        msg.payload = Some(payload);
        msg
    }

    /// Builds a standalone metadata-event message; carries no payload.
    pub fn event(df: u32, timestamp: u64, eventdata: EventData) -> Self {
        Message {
            timestamp,
            signal: 0,
            df,
            nuc: 0,
            even_cpr: false,
            odd_cpr: false,
            valid: true,
            crc_residual: None,
            address: None,
            altitude: None,
            eventdata: Some(eventdata),
            payload: None,
        }
    }

    pub fn is_event(&self) -> bool {
        self.df >= DF_MODEAC + 1
    }
}

/// True if a DF17/18 airborne-position ME field's CPR latitude or
/// longitude subfield is entirely zero — treated as implausible rather
/// than a legitimate position near 0°/0°.
fn cpr_fields_are_implausible(payload: &[u8]) -> bool {
    let lat_field = (((payload[7] as u32) << 8) | payload[8] as u32) & 0x7FFF;
    let lon_field = (((payload[9] as u32) << 8) | payload[10] as u32) & 0x7FFF;
    lat_field == 0 || lon_field == 0
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Some(data) => {
                for byte in data {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            None => match &self.eventdata {
                Some(ev) => write!(f, "DF{}@{}:{:?}", self.df, self.timestamp, ev),
                None => write!(f, "DF{}@{}", self.df, self.timestamp),
            },
        }
    }
}
