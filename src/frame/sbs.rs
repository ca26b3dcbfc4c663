/*
 * Part of mlat-decoder-core - an ADS-B multilateration decoder core.
 * Based on mlat-client (https://github.com/mutability/mlat-client)
 * Copyright 2023, Timothy Mullican <timothy.j.mullican@gmail.com>
 * Copyright 2015, Oliver Jowett <oliver@mutability.co.uk>
 */

//! SBS/Kinetic binary framing: `DLE STX [type spare ts(3) data(N)] DLE ETX
//! [crc(2)]`, with `0x10` doubled wherever it appears in an escaped
//! region. The Mode S payload itself is stored XOR-scrambled against its
//! own CRC and must be unscrambled before decoding.

use crate::error::{FramingError, ReaderError};
use crate::frame::{read_escaped, Escaped};
use crate::modes::crc::crc as mode_s_crc;
use crate::modes::message::Message;
use crate::reader::{FeedOutcome, Reader};

const DLE: u8 = 0x10;
const STX: u8 = 0x02;
const ETX: u8 = 0x03;

enum SbsBody {
    Done(Vec<u8>, usize),
    Incomplete,
    Malformed,
}

/// Scans from `start` (just past `DLE STX`) for the `DLE ETX` terminator,
/// collapsing doubled `0x10` bytes along the way. Returns the unescaped
/// body and the position just after the terminator.
fn read_sbs_body(buf: &[u8], start: usize) -> SbsBody {
    let mut data = Vec::with_capacity(19);
    let mut pos = start;
    loop {
        if data.len() > 19 {
            return SbsBody::Malformed;
        }
        if pos >= buf.len() {
            return SbsBody::Incomplete;
        }
        let b = buf[pos];
        if b != DLE {
            data.push(b);
            pos += 1;
            continue;
        }
        if pos + 1 >= buf.len() {
            return SbsBody::Incomplete;
        }
        match buf[pos + 1] {
            DLE => {
                data.push(DLE);
                pos += 2;
            }
            ETX => return SbsBody::Done(data, pos + 2),
            _ => return SbsBody::Malformed,
        }
    }
}

fn body_len_for_type(type_byte: u8) -> Option<usize> {
    match type_byte {
        0x01 | 0x05 => Some(14),
        0x07 => Some(7),
        0x09 => Some(2),
        _ => None,
    }
}

/// Reverses the XOR-scrambling applied to the trailing three bytes of a
/// 7- or 14-byte Mode S payload: those bytes are `original XOR crc`,
/// where `crc` is the CRC-24 residual-generator run over the leading
/// `len - 3` bytes.
fn unscramble(data: &[u8]) -> Vec<u8> {
    let len = data.len();
    let mut out = data.to_vec();
    let c = mode_s_crc(&data[..len - 3]);
    out[len - 3] ^= (c >> 16) as u8;
    out[len - 2] ^= (c >> 8) as u8;
    out[len - 1] ^= c as u8;
    out
}

impl Reader {
    pub(crate) fn feed_sbs(
        &mut self,
        buf: &[u8],
        max_messages: usize,
    ) -> Result<FeedOutcome, ReaderError> {
        let mut messages = Vec::with_capacity(buf.len() / 16 + 1);
        let mut pos = 0usize;
        let mut fault: Option<ReaderError> = None;

        'records: while pos < buf.len() {
            if max_messages != 0 && messages.len() >= max_messages {
                break;
            }
            if pos + 1 >= buf.len() {
                break;
            }
            if buf[pos] != DLE || buf[pos + 1] != STX {
                fault = Some(FramingError::MissingSbsHeader.into());
                break;
            }

            let (body, after_etx) = match read_sbs_body(buf, pos + 2) {
                SbsBody::Done(body, next) => (body, next),
                SbsBody::Incomplete => break 'records,
                SbsBody::Malformed => {
                    fault = Some(FramingError::UnescapedSbsMarker.into());
                    break 'records;
                }
            };

            // Two more escaped bytes (a wrapper checksum over the framed
            // record) follow the terminator before the next record can
            // start; this decoder does not validate them.
            let after_crc = match read_escaped(buf, after_etx, 2, DLE) {
                Escaped::Done(_, next) => next,
                Escaped::Incomplete => break 'records,
                Escaped::Malformed => {
                    fault = Some(FramingError::UnescapedSbsMarker.into());
                    break 'records;
                }
            };

            pos = after_crc;

            if body.len() < 5 {
                fault = Some(FramingError::SbsFrameTooShort { len: body.len() }.into());
                break 'records;
            }
            let type_byte = body[0];
            let data_len = match body_len_for_type(type_byte) {
                Some(n) => n,
                None => continue 'records, // unknown record type, skipped silently
            };
            if body.len() != 5 + data_len {
                fault = Some(FramingError::SbsFrameTooShort { len: body.len() }.into());
                break 'records;
            }

            let raw_ts24 = body[2] as u32 | (body[3] as u32) << 8 | (body[4] as u32) << 16;
            let data = &body[5..5 + data_len];

            let payload = if data_len == 2 {
                data.to_vec()
            } else {
                unscramble(data)
            };

            let adjusted = (raw_ts24.wrapping_add((14 - data_len as u32) * 160)) & 0x00FF_FFFF;
            let ts = self.timestamps.widen_24bit(adjusted);

            let msg = Message::from_frame(ts, 0, payload);
            self.accept_and_push(msg, &mut messages);
        }

        self.finish(pos, messages, fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;

    fn escape_10(bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        for &b in bytes {
            out.push(b);
            if b == DLE {
                out.push(DLE);
            }
        }
        out
    }

    fn wrap(body: &[u8]) -> Vec<u8> {
        let mut out = vec![DLE, STX];
        out.extend(escape_10(body));
        out.push(DLE);
        out.push(ETX);
        out.extend([0x00, 0x00]); // unvalidated wrapper checksum
        out
    }

    #[test]
    fn unknown_record_type_is_skipped_silently() {
        let mut reader = Reader::new(Mode::Sbs);
        let body = [0xFF, 0x00, 0x01, 0x00, 0x00];
        let input = wrap(&body);
        let outcome = reader.feed(&input, 0).unwrap();
        assert!(outcome.messages.is_empty());
        assert_eq!(outcome.consumed, input.len());
    }

    #[test]
    fn short_body_is_a_framing_error() {
        let mut reader = Reader::new(Mode::Sbs);
        let body = [0x01, 0x00, 0x00];
        let input = wrap(&body);
        let err = reader.feed(&input, 0).unwrap_err();
        assert_eq!(
            err,
            ReaderError::Framing(FramingError::SbsFrameTooShort { len: 3 })
        );
    }

    #[test]
    fn modeac_record_decodes_with_no_unscrambling() {
        let mut reader = Reader::new(Mode::Sbs);
        // type=0x09 (Mode A/C), spare, ts=5 little-endian 24-bit, data=2 bytes.
        let body = [0x09, 0x00, 0x05, 0x00, 0x00, 0x12, 0x34];
        let input = wrap(&body);
        let outcome = reader.feed(&input, 0).unwrap();
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.messages[0].df, crate::modes::DF_MODEAC);
        assert_eq!(outcome.consumed, input.len());
    }

    #[test]
    fn long_frame_is_unscrambled_before_decoding() {
        let mut reader = Reader::new(Mode::Sbs);
        // A canonical DF11 all-call reply with a correct residual, then
        // scrambled by XORing its own CRC into the trailing three bytes
        // (the inverse of what `unscramble` undoes).
        let mut df11 = vec![0x28u8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let c = mode_s_crc(&df11[..4]);
        df11[4] = (c >> 16) as u8;
        df11[5] = (c >> 8) as u8;
        df11[6] = c as u8;

        let mut body = vec![0x01u8, 0x00, 0x07, 0x00, 0x00];
        body.extend_from_slice(&df11[..4]);
        body.push(df11[4] ^ (c >> 16) as u8);
        body.push(df11[5] ^ (c >> 8) as u8);
        body.push(df11[6] ^ c as u8);
        let input = wrap(&body);
        let outcome = reader.feed(&input, 0).unwrap();
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.messages[0].df, 11);
        assert!(outcome.messages[0].valid);
    }

    #[test]
    fn incomplete_body_waits_for_more_input() {
        let mut reader = Reader::new(Mode::Sbs);
        let input = vec![DLE, STX, 0x01, 0x00];
        let outcome = reader.feed(&input, 0).unwrap();
        assert_eq!(outcome.consumed, 0);
        assert!(outcome.messages.is_empty());
    }

    #[test]
    fn missing_header_raises_immediately() {
        let mut reader = Reader::new(Mode::Sbs);
        let input = vec![0x00, 0x00, 0x00];
        let err = reader.feed(&input, 0).unwrap_err();
        assert_eq!(err, ReaderError::Framing(FramingError::MissingSbsHeader));
    }
}
