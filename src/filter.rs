/*
 * Part of mlat-decoder-core - an ADS-B multilateration decoder core.
 * Based on mlat-client (https://github.com/mutability/mlat-client)
 * Copyright 2023, Timothy Mullican <timothy.j.mullican@gmail.com>
 * Copyright 2015, Oliver Jowett <oliver@mutability.co.uk>
 */

//! Per-DF and per-address accept filtering, applied after field decode.
//!
//! The `want_*` toggles live on [`crate::reader::Reader`] (they are
//! reader-wide configuration, not accept-list data); `accept` takes them
//! as parameters rather than duplicating them here.

use std::collections::{HashMap, HashSet};

use crate::modes::message::Message;
use crate::modes::DF_MODEAC;
use crate::timestamp::MAGIC_MLAT;

/// Accept-list configuration consulted by [`Filter::accept`].
///
/// With no filters installed (`default_filter` and `specific_filter`
/// both empty) every `valid` message is accepted, matching the "no
/// filters installed ⇒ accept" rule.
#[derive(Debug, Default)]
pub struct Filter {
    /// DF → accept-everything-of-this-DF.
    pub default_filter: HashMap<u32, bool>,
    /// DF → set of specifically-accepted addresses.
    pub specific_filter: HashMap<u32, HashSet<u32>>,
    /// Accepted Mode A/C squawks; `None` means no Mode A/C filter
    /// installed (Mode A/C messages are accepted unconditionally).
    pub modeac_filter: Option<HashSet<u32>>,
}

/// The reader-wide toggles `Filter::accept` needs alongside its own
/// accept lists.
#[derive(Debug, Clone, Copy)]
pub struct FilterOptions {
    pub want_zero_timestamps: bool,
    pub want_invalid_messages: bool,
    pub want_mlat_messages: bool,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    fn has_any_filter(&self) -> bool {
        !self.default_filter.is_empty() || !self.specific_filter.is_empty()
    }

    /// Decides whether `msg` passes, given the reader's current
    /// `last_timestamp` and `outliers` count, and updates `mlat_messages`
    /// / `seen` as a side effect of the decision (per §4.8).
    pub fn accept(
        &self,
        msg: &Message,
        last_timestamp: u64,
        outliers: u32,
        options: FilterOptions,
        mlat_messages: &mut u64,
        seen: &mut Option<HashSet<u32>>,
    ) -> bool {
        if msg.timestamp == MAGIC_MLAT && !options.want_mlat_messages {
            *mlat_messages += 1;
            return false;
        }
        if outliers > 0 {
            return false;
        }
        if msg.timestamp < last_timestamp {
            return false;
        }

        if msg.df == DF_MODEAC {
            if let Some(allowed) = &self.modeac_filter {
                let squawk = msg.address.unwrap_or(0);
                return allowed.contains(&squawk);
            }
        }

        if !msg.valid {
            return options.want_invalid_messages;
        }

        if matches!(msg.df, 11 | 17 | 18) {
            if let (Some(set), Some(addr)) = (seen.as_mut(), msg.address) {
                set.insert(addr);
            }
        }

        if msg.timestamp == 0 && !options.want_zero_timestamps {
            return false;
        }

        if !self.has_any_filter() {
            return true;
        }

        if self.default_filter.get(&msg.df).copied().unwrap_or(false) {
            return true;
        }
        if let Some(addr) = msg.address {
            if let Some(addrs) = self.specific_filter.get(&msg.df) {
                if addrs.contains(&addr) {
                    return true;
                }
            }
        }
        false
    }
}
