/*
 * Part of mlat-decoder-core - an ADS-B multilateration decoder core.
 * Based on mlat-client (https://github.com/mutability/mlat-client)
 * Copyright 2023, Timothy Mullican <timothy.j.mullican@gmail.com>
 * Copyright 2015, Oliver Jowett <oliver@mutability.co.uk>
 */

//! The wire format a [`crate::reader::Reader`] is currently decoding.
//!
//! Not to be confused with [`crate::modes`]'s `DF_*` constants, which tag
//! the *kind of message* rather than the *wire format* it arrived in.

use std::fmt;

/// Timestamp counter frequency, in Hz, associated with a [`Mode`].
const BEAST_FREQUENCY: u64 = 12_000_000;
const RADARCAPE_FREQUENCY: u64 = 1_000_000_000;
const SBS_FREQUENCY: u64 = 20_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// No wire format selected yet; `feed` is not callable.
    None,
    /// Mode S Beast binary, 12 MHz free-running counter.
    Beast,
    /// Radarcape binary, GPS-disciplined nanosecond-since-midnight clock.
    Radarcape,
    /// Radarcape binary running firmware that emulates plain Beast timing.
    RadarcapeEmulated,
    /// AVR text, no timestamps (frequency 0, outlier checking disabled).
    Avr,
    /// AVR text carrying synthetic 12 MHz mlat timestamps.
    AvrMlat,
    /// SBS/Kinetic framed binary, 20 MHz wrapping counter.
    Sbs,
}

impl Mode {
    /// The timestamp counter frequency associated with this mode, in Hz.
    /// Zero means timestamps carry no timing information at all.
    pub fn frequency(self) -> u64 {
        match self {
            Mode::None => 0,
            Mode::Beast | Mode::AvrMlat => BEAST_FREQUENCY,
            Mode::Radarcape | Mode::RadarcapeEmulated => RADARCAPE_FREQUENCY,
            Mode::Avr => 0,
            Mode::Sbs => SBS_FREQUENCY,
        }
    }

    /// The epoch label reported alongside a mode-change event, if any.
    pub fn epoch(self) -> Option<&'static str> {
        match self {
            Mode::Radarcape | Mode::RadarcapeEmulated => Some("utc_midnight"),
            _ => None,
        }
    }

    /// Does this mode's hardware timestamp encode whole seconds since UTC
    /// midnight (Radarcape), rather than a free-running counter?
    pub fn is_radarcape(self) -> bool {
        matches!(self, Mode::Radarcape | Mode::RadarcapeEmulated)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::None => "NONE",
            Mode::Beast => "BEAST",
            Mode::Radarcape => "RADARCAPE",
            Mode::RadarcapeEmulated => "RADARCAPE_EMULATED",
            Mode::Avr => "AVR",
            Mode::AvrMlat => "AVRMLAT",
            Mode::Sbs => "SBS",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
