/*
 * Part of mlat-decoder-core - an ADS-B multilateration decoder core.
 * Based on mlat-client (https://github.com/mutability/mlat-client)
 * Copyright 2023, Timothy Mullican <timothy.j.mullican@gmail.com>
 * Copyright 2015, Oliver Jowett <oliver@mutability.co.uk>
 */

//! The stateful façade: owns the current wire mode, filters, seen-address
//! set, and dispatches `feed` to the parser for that mode.

use std::collections::HashSet;

use crate::error::ReaderError;
use crate::filter::{Filter, FilterOptions};
use crate::mode::Mode;
use crate::modes::message::Message;
use crate::timestamp::TimestampState;

/// Result of one `feed` call.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeedOutcome {
    pub consumed: usize,
    pub messages: Vec<Message>,
    pub error_pending: bool,
}

pub struct Reader {
    mode: Mode,
    frequency: u64,
    epoch: Option<&'static str>,

    pub(crate) timestamps: TimestampState,
    pub radarcape_utc_bugfix: bool,

    pub allow_mode_change: bool,
    pub want_zero_timestamps: bool,
    pub want_mlat_messages: bool,
    pub want_invalid_messages: bool,
    pub want_events: bool,

    pub filter: Filter,
    pub seen: Option<HashSet<u32>>,

    pub received_messages: u64,
    pub suppressed_messages: u64,
    pub mlat_messages: u64,

    pub(crate) pending_error: Option<ReaderError>,
}

impl Reader {
    pub fn new(mode: Mode) -> Self {
        let mut reader = Reader {
            mode: Mode::None,
            frequency: 0,
            epoch: None,
            timestamps: TimestampState::new(),
            radarcape_utc_bugfix: false,
            allow_mode_change: true,
            // A hardware timestamp of 0 after frame-start-offset clamping
            // is a normal artifact of an early counter value, not a
            // signal that no timing information is available; only a
            // consumer that specifically wants to exclude those frames
            // needs to turn this off.
            want_zero_timestamps: true,
            want_mlat_messages: false,
            want_invalid_messages: false,
            want_events: true,
            filter: Filter::new(),
            seen: None,
            received_messages: 0,
            suppressed_messages: 0,
            mlat_messages: 0,
            pending_error: None,
        };
        reader.set_mode(mode);
        reader
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    pub fn epoch(&self) -> Option<&'static str> {
        self.epoch
    }

    /// The baseline hardware timestamp currently tracked for this mode.
    pub fn last_timestamp(&self) -> u64 {
        self.timestamps.last_timestamp()
    }

    /// Switches wire format, resetting the derived `frequency`/`epoch`
    /// pair. Does not touch timestamp-tracking state; a mode change
    /// detected mid-stream (Radarcape status frame) goes through this
    /// same setter so jump detection sees a consistent frequency.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.frequency = mode.frequency();
        self.epoch = mode.epoch();
    }

    /// Feeds a byte window to the parser for the current mode.
    ///
    /// `max_messages == 0` means unbounded. Returns the number of bytes
    /// consumed, the decoded/event messages in wire order, and whether a
    /// framing fault was deferred (see [`crate::error`]).
    pub fn feed(&mut self, buf: &[u8], max_messages: usize) -> Result<FeedOutcome, ReaderError> {
        if let Some(err) = self.pending_error.take() {
            return Err(err);
        }
        match self.mode {
            Mode::None => Err(ReaderError::NoModeSelected),
            Mode::Beast | Mode::Radarcape | Mode::RadarcapeEmulated => {
                self.feed_beast(buf, max_messages)
            }
            Mode::Avr | Mode::AvrMlat => self.feed_avr(buf, max_messages),
            Mode::Sbs => self.feed_sbs(buf, max_messages),
        }
    }

    /// Shared two-phase error finalisation: a fault discovered after at
    /// least one message was already decoded is deferred to the next
    /// `feed`; a fault discovered with nothing yet decoded is raised now.
    pub(crate) fn finish(
        &mut self,
        consumed: usize,
        messages: Vec<Message>,
        fault: Option<ReaderError>,
    ) -> Result<FeedOutcome, ReaderError> {
        match fault {
            None => Ok(FeedOutcome {
                consumed,
                messages,
                error_pending: false,
            }),
            Some(err) => {
                if messages.is_empty() {
                    Err(err)
                } else {
                    self.pending_error = Some(err);
                    Ok(FeedOutcome {
                        consumed,
                        messages,
                        error_pending: true,
                    })
                }
            }
        }
    }

    /// Runs the filter over a decoded message and, if accepted, appends
    /// it to `out`. Always bumps `received_messages`; bumps
    /// `suppressed_messages` on rejection.
    pub(crate) fn accept_and_push(&mut self, msg: Message, out: &mut Vec<Message>) {
        self.received_messages += 1;
        let last_timestamp = self.timestamps.last_timestamp();
        let outliers = self.timestamps.outliers();
        let options = FilterOptions {
            want_zero_timestamps: self.want_zero_timestamps,
            want_invalid_messages: self.want_invalid_messages,
            want_mlat_messages: self.want_mlat_messages,
        };
        if self.filter.accept(
            &msg,
            last_timestamp,
            outliers,
            options,
            &mut self.mlat_messages,
            &mut self.seen,
        ) {
            out.push(msg);
        } else {
            self.suppressed_messages += 1;
        }
    }
}
