// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `error` module defines the parser's error type and the three-way outcome used by every
//! sub-decoder to distinguish a hard failure from "not enough bytes yet".

use std::error::Error as StdError;
use std::fmt;

/// `ParseError` enumerates every way a FLAC byte stream can be rejected by the parser.
///
/// Each variant carries a diagnostic `pos` where one is meaningful. This is the crate's only
/// error type; there is no wrapped I/O error because the parser itself performs no I/O of its
/// own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The parser is in non-streaming mode and the input did not begin with the FLAC stream
    /// marker.
    NotStream { pos: u64 },
    /// A frame header's block-size code was the reserved value `0000`.
    InvalidBlockSize,
    /// A frame header's sample-rate code was the reserved value `1111`.
    InvalidSampleRate,
    /// A UTF-8-style variable-length sample or frame number was malformed.
    InvalidUtf8Num,
    /// A candidate frame header's CRC-8 did not match.
    InvalidHeaderCrc,
    /// A frame header decoded, but failed a consistency check against the established stream
    /// format or the previous frame.
    InvalidHeader { pos: u64 },
    /// The frame boundary finder exhausted its search window without finding a next valid sync.
    InvalidFrame { pos: u64 },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ParseError::NotStream { pos } => {
                write!(f, "flac: missing stream marker at position {pos}")
            }
            ParseError::InvalidBlockSize => write!(f, "flac: block size set to reserved value"),
            ParseError::InvalidSampleRate => write!(f, "flac: sample rate set to reserved value"),
            ParseError::InvalidUtf8Num => write!(f, "flac: utf8-style coded number is malformed"),
            ParseError::InvalidHeaderCrc => write!(f, "flac: frame header crc does not match"),
            ParseError::InvalidHeader { pos } => {
                write!(f, "flac: frame header failed consistency check at position {pos}")
            }
            ParseError::InvalidFrame { pos } => {
                write!(f, "flac: no valid frame boundary found from position {pos}")
            }
        }
    }
}

impl StdError for ParseError {}

/// The result type returned by the crate's public operations (`parse`).
pub type ParseResult<T> = Result<T, ParseError>;

/// The three-way outcome of a sub-decoder: a value was decoded, more bytes are needed before a
/// decision can be made, or the input is definitively invalid.
///
/// This is kept distinct from `ParseResult` because `NeedsMore` is not a failure: it tells the
/// caller to retain its buffered bytes and wait for the next `parse` call rather than propagate
/// an error.
#[derive(Debug)]
pub enum DecodeOutcome<T> {
    Ok(T),
    NeedsMore,
    Invalid(ParseError),
}

impl<T> DecodeOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DecodeOutcome<U> {
        match self {
            DecodeOutcome::Ok(v) => DecodeOutcome::Ok(f(v)),
            DecodeOutcome::NeedsMore => DecodeOutcome::NeedsMore,
            DecodeOutcome::Invalid(e) => DecodeOutcome::Invalid(e),
        }
    }

    pub fn is_needs_more(&self) -> bool {
        matches!(self, DecodeOutcome::NeedsMore)
    }
}
