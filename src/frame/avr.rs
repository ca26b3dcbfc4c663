/*
 * Part of mlat-decoder-core - an ADS-B multilateration decoder core.
 * Based on mlat-client (https://github.com/mutability/mlat-client)
 * Copyright 2023, Timothy Mullican <timothy.j.mullican@gmail.com>
 * Copyright 2015, Oliver Jowett <oliver@mutability.co.uk>
 */

//! AVR line-oriented ASCII framing: `M [hex…] ; [CR|LF]*`, where `M`
//! selects whether a timestamp (and, for `<`, a signal level) precedes
//! the hex payload.

use crate::error::{FramingError, ReaderError};
use crate::modes::message::Message;
use crate::reader::{FeedOutcome, Reader};
use crate::timestamp::TimestampStatus;

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn decode_hex(field: &[u8]) -> Result<Vec<u8>, FramingError> {
    if field.len() % 2 != 0 {
        return Err(FramingError::OddAvrHexLength { len: field.len() });
    }
    let mut out = Vec::with_capacity(field.len() / 2);
    for pair in field.chunks(2) {
        let hi = hex_digit(pair[0]).ok_or(FramingError::InvalidAvrHex)?;
        let lo = hex_digit(pair[1]).ok_or(FramingError::InvalidAvrHex)?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

impl Reader {
    pub(crate) fn feed_avr(
        &mut self,
        buf: &[u8],
        max_messages: usize,
    ) -> Result<FeedOutcome, ReaderError> {
        let mut messages = Vec::with_capacity(buf.len() / 5 + 1);
        let mut pos = 0usize;
        let mut fault: Option<ReaderError> = None;

        'records: while pos < buf.len() {
            if max_messages != 0 && messages.len() >= max_messages {
                break;
            }
            let marker = buf[pos];
            let has_timestamp = matches!(marker, b'@' | b'%' | b'<');
            let has_signal = marker == b'<';
            if !has_timestamp && !matches!(marker, b'*' | b':') {
                fault = Some(FramingError::LostSync { byte: marker }.into());
                break;
            }

            let body_start = pos + 1;
            let semi = match buf[body_start..].iter().position(|&b| b == b';') {
                Some(offset) => body_start + offset,
                None => break 'records, // record not terminated yet
            };
            let mut cursor = body_start;

            let raw_ts: u64 = if has_timestamp {
                if semi - cursor < 12 {
                    fault = Some(FramingError::OddAvrHexLength { len: semi - cursor }.into());
                    break 'records;
                }
                let bytes = match decode_hex(&buf[cursor..cursor + 12]) {
                    Ok(b) => b,
                    Err(e) => {
                        fault = Some(e.into());
                        break 'records;
                    }
                };
                cursor += 12;
                bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
            } else {
                0
            };

            if has_signal {
                if semi - cursor < 2 {
                    fault = Some(FramingError::OddAvrHexLength { len: semi - cursor }.into());
                    break 'records;
                }
                cursor += 2; // signal level is present but not modelled
            }

            let payload = match decode_hex(&buf[cursor..semi]) {
                Ok(p) => p,
                Err(e) => {
                    fault = Some(e.into());
                    break 'records;
                }
            };
            if !matches!(payload.len(), 2 | 7 | 14) {
                fault = Some(FramingError::BadAvrPayloadLength { len: payload.len() }.into());
                break 'records;
            }

            let mut next = semi + 1;
            if next < buf.len() && matches!(buf[next], b'\r' | b'\n') {
                let first = buf[next];
                next += 1;
                if next < buf.len() {
                    let second = buf[next];
                    if (first == b'\r' && second == b'\n') || (first == b'\n' && second == b'\r') {
                        next += 1;
                    }
                }
            }
            pos = next;

            let is_modeac = payload.len() == 2;
            let ts = if is_modeac {
                raw_ts
            } else {
                if self.timestamps.check(raw_ts, self.frequency()) == TimestampStatus::Outlier
                    && self.timestamps.is_outlier_limit_exceeded()
                    && self.want_events
                {
                    messages.push(Message::event(
                        crate::modes::DF_EVENT_TIMESTAMP_JUMP,
                        self.timestamps.last_timestamp(),
                        crate::events::EventData::TimestampJump {
                            last_timestamp: self.timestamps.last_timestamp(),
                        },
                    ));
                }
                self.timestamps.update(raw_ts, self.frequency(), false);
                raw_ts
            };

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

    #[test]
    fn modeac_record_with_no_timestamp_marker() {
        let mut reader = Reader::new(Mode::Avr);
        let input = b"*1234;\r\n".to_vec();
        let outcome = reader.feed(&input, 0).unwrap();
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.messages[0].df, crate::modes::DF_MODEAC);
        assert_eq!(outcome.consumed, input.len());
    }

    #[test]
    fn timestamped_record_parses_48_bit_timestamp() {
        let mut reader = Reader::new(Mode::AvrMlat);
        // marker '@', 12 hex ts digits = 1, then 4 hex digits ModeA/C payload.
        let input = b"@0000000000011234;\n".to_vec();
        let outcome = reader.feed(&input, 0).unwrap();
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.messages[0].timestamp, 1);
    }

    #[test]
    fn missing_terminator_waits_for_more_input() {
        let mut reader = Reader::new(Mode::Avr);
        let input = b"*1234".to_vec();
        let outcome = reader.feed(&input, 0).unwrap();
        assert_eq!(outcome.consumed, 0);
        assert!(outcome.messages.is_empty());
    }

    #[test]
    fn odd_payload_length_is_a_framing_error() {
        let mut reader = Reader::new(Mode::Avr);
        let input = b"*123;\n".to_vec();
        let err = reader.feed(&input, 0).unwrap_err();
        assert_eq!(err, ReaderError::Framing(FramingError::OddAvrHexLength { len: 3 }));
    }

    #[test]
    fn wrong_payload_byte_length_is_a_framing_error() {
        let mut reader = Reader::new(Mode::Avr);
        let input = b"*123456;\n".to_vec(); // 3 bytes: not 2/7/14
        let err = reader.feed(&input, 0).unwrap_err();
        assert_eq!(
            err,
            ReaderError::Framing(FramingError::BadAvrPayloadLength { len: 3 })
        );
    }

    #[test]
    fn invalid_hex_digit_is_a_framing_error() {
        let mut reader = Reader::new(Mode::Avr);
        let input = b"*12zz;\n".to_vec();
        let err = reader.feed(&input, 0).unwrap_err();
        assert_eq!(err, ReaderError::Framing(FramingError::InvalidAvrHex));
    }

    #[test]
    fn unrecognised_marker_raises_lost_sync() {
        let mut reader = Reader::new(Mode::Avr);
        let input = b"?1234;\n".to_vec();
        let err = reader.feed(&input, 0).unwrap_err();
        assert_eq!(err, ReaderError::Framing(FramingError::LostSync { byte: b'?' }));
    }
}
