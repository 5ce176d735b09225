// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A pull-model, resumable, byte-level parser for FLAC streams.
//!
//! The parser segments a FLAC byte stream into an ordered sequence of records — the stream
//! marker, metadata blocks, and individual audio frames — decoding header metadata along the
//! way without decoding any audio itself. Bytes may be handed to [`parse`] in chunks of any
//! size, including one byte at a time; an incomplete trailing structure is buffered internally
//! and resumed on the next call.
//!
//! ```no_run
//! let mut state = flac_frame_parser::init(false);
//! let records = flac_frame_parser::parse(&[0u8; 0], &mut state).unwrap();
//! let _ = records;
//! let _last = flac_frame_parser::flush(&mut state);
//! ```

mod bitstream;
mod boundary;
mod error;
mod frame;
mod metadata;
mod record;
mod state;

pub use error::{DecodeOutcome, ParseError, ParseResult};
pub use record::{ChannelMode, FrameMetadata, Record, StreamFormat};
pub use state::{flush, init, parse, ParserState, Phase};
