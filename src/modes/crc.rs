/*
 * Part of mlat-decoder-core - an ADS-B multilateration decoder core.
 * Based on mlat-client (https://github.com/mutability/mlat-client)
 * Copyright 2023, Timothy Mullican <timothy.j.mullican@gmail.com>
 * Copyright 2015, Oliver Jowett <oliver@mutability.co.uk>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Table-driven Mode S CRC-24 over the 0xFFF409 generator polynomial.
//!
//! `T[b]` is the remainder of `b << 16` after eight shift-and-XOR steps
//! against the generator; `crc()` folds a buffer through that table one
//! byte at a time, and `residual()` additionally XORs in the trailing
//! three bytes of a frame so a well-formed DF17/DF18 frame yields 0.

use hex_slice::AsHex;
use log::trace;

const GENERATOR: u32 = 0xFFF409;

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut byte = 0usize;
    while byte < 256 {
        let mut rem = (byte as u32) << 16;
        let mut bit = 0;
        while bit < 8 {
            if rem & 0x800000 != 0 {
                rem = (rem << 1) ^ GENERATOR;
            } else {
                rem <<= 1;
            }
            bit += 1;
        }
        table[byte] = rem & 0xFFFFFF;
        byte += 1;
    }
    table
}

static CRC_TABLE: [u32; 256] = build_table();

/// CRC-24 of `buf`, starting from a zero remainder.
pub fn crc(buf: &[u8]) -> u32 {
    let mut rem: u32 = 0;
    for &b in buf {
        rem = ((rem & 0xFFFF) << 8) ^ CRC_TABLE[(b as u32 ^ (rem >> 16)) as usize];
    }
    trace!("crc({:#02x}) = {:#08x}", buf.as_hex(), rem);
    rem
}

/// CRC residual of a full Mode S frame: `crc()` of everything but the
/// trailing three bytes, XORed with those three bytes. Zero for a valid
/// DF17/DF18 frame; for DF11 only the low 7 bits (the interrogator ID)
/// are expected to be nonzero.
///
/// Panics if `frame` has fewer than 3 bytes; callers only call this on
/// already length-checked 7- or 14-byte frames.
pub fn residual(frame: &[u8]) -> u32 {
    let len = frame.len();
    assert!(len >= 3, "residual() requires at least 3 bytes");
    let mut rem = crc(&frame[..len - 3]);
    rem ^= (frame[len - 3] as u32) << 16;
    rem ^= (frame[len - 2] as u32) << 8;
    rem ^= frame[len - 1] as u32;
    rem
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_entry_zero_is_zero() {
        assert_eq!(CRC_TABLE[0], 0);
    }

    #[test]
    fn canonical_df17_residual_is_zero() {
        let frame = hex::decode("8D4840D6202CC371C32CE0576098").unwrap();
        assert_eq!(residual(&frame), 0);
    }

    #[test]
    fn bit_flip_breaks_residual() {
        let mut frame = hex::decode("8D4840D6202CC371C32CE0576098").unwrap();
        frame[5] ^= 0x01;
        assert_ne!(residual(&frame), 0);
    }

    #[test]
    fn constructed_short_frame_round_trips() {
        // Any 7-byte frame whose trailing 3 bytes equal crc() of the first
        // 4 is a zero-residual frame, independent of DF field contents.
        let mut frame = vec![0x5Du8, 0xA5, 0xC6, 0x43];
        let c = crc(&frame);
        frame.push((c >> 16) as u8);
        frame.push((c >> 8) as u8);
        frame.push(c as u8);
        assert_eq!(residual(&frame), 0);
    }

    #[test]
    #[should_panic]
    fn residual_panics_on_short_frame() {
        residual(&[0u8, 1u8]);
    }
}
