/*
 * Part of mlat-decoder-core - an ADS-B multilateration decoder core.
 * Based on mlat-client (https://github.com/mutability/mlat-client)
 * Copyright 2023, Timothy Mullican <timothy.j.mullican@gmail.com>
 * Copyright 2015, Oliver Jowett <oliver@mutability.co.uk>
 */

//! Streaming Mode S / ADS-B decoder core: turns a byte stream in one of
//! several receiver wire formats (Beast, Radarcape, AVR, SBS) into
//! [`modes::message::Message`] values, tracking per-mode clock state and
//! applying an accept-list filter along the way.
//!
//! [`reader::Reader`] is the entry point: construct one with a
//! [`mode::Mode`], then call [`reader::Reader::feed`] repeatedly as bytes
//! arrive.

pub mod error;
pub mod events;
pub mod filter;
pub mod frame;
pub mod mode;
pub mod modes;
pub mod reader;
pub mod timestamp;

pub use error::{FramingError, ModeError, ReaderError};
pub use events::{decode_settings, EventData, GpsStatus};
pub use filter::{Filter, FilterOptions};
pub use mode::Mode;
pub use modes::message::Message;
pub use reader::{FeedOutcome, Reader};
pub use timestamp::{is_synthetic, MAGIC_MLAT, MAGIC_UAT};
