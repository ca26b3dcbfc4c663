/*
 * Part of mlat-decoder-core - an ADS-B multilateration decoder core.
 * Based on mlat-client (https://github.com/mutability/mlat-client)
 * Copyright 2023, Timothy Mullican <timothy.j.mullican@gmail.com>
 * Copyright 2015, Oliver Jowett <oliver@mutability.co.uk>
 */

//! Error types surfaced by the reader and frame parsers.
//!
//! The frame parsers use a two-phase reporting scheme: a malformed frame
//! does not abort the call that discovers it. Instead the parser returns
//! whatever well-formed messages it already decoded, records the fault,
//! and `Reader::feed` raises it as a [`ReaderError`] on the *next* call.
//! This keeps already-decoded messages from being thrown away just
//! because a later byte in the same buffer was garbage.

use thiserror::Error;

/// A framing-level fault: the wire protocol's own envelope (escape
/// sequences, length counts, start/end markers) was violated.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum FramingError {
    #[error("lost sync: expected a 0x1a marker, found {byte:#04x}")]
    LostSync { byte: u8 },
    #[error("unknown Beast/Radarcape message type byte {type_byte:#04x}")]
    UnknownBeastType { type_byte: u8 },
    #[error("0x1a escape byte was not doubled")]
    UnescapedMarker,
    #[error("0x10 escape byte was not doubled in SBS frame")]
    UnescapedSbsMarker,
    #[error("SBS frame missing DLE STX header")]
    MissingSbsHeader,
    #[error("SBS frame too short: {len} bytes")]
    SbsFrameTooShort { len: usize },
    #[error("unterminated AVR record (no trailing ';')")]
    UnterminatedAvrRecord,
    #[error("AVR record has odd hex digit count: {len}")]
    OddAvrHexLength { len: usize },
    #[error("AVR record has invalid hex digit")]
    InvalidAvrHex,
    #[error("AVR record payload length {len} is not 2, 7, or 14 bytes")]
    BadAvrPayloadLength { len: usize },
}

/// A field-decode fault: the envelope was fine but the payload inside it
/// could not be turned into a [`crate::modes::message::Message`].
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ModeError {
    #[error("Mode S payload has unsupported length {len} (expected 7 or 14)")]
    BadPayloadLength { len: usize },
}

/// Errors `Reader::feed` can return. A `Framing` or `Mode` error reported
/// here describes a fault from the *previous* call's input, deferred by
/// the two-phase scheme described in the module docs.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ReaderError {
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),
    #[error("decode error: {0}")]
    Mode(#[from] ModeError),
    #[error("feed() called before a wire format was selected")]
    NoModeSelected,
}
