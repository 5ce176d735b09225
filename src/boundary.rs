// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frame boundary search (component D of the parser): locating the next validating sync once a
//! frame is already in flight.

use log::{trace, warn};

use crate::error::ParseError;
use crate::frame::{decode_header, BlockingStrategy, DecodedHeader};
use crate::record::{FrameMetadata, StreamFormat};

const SYNC_LENGTH: usize = 2;

/// The result of scanning for the next frame boundary.
pub enum BoundaryOutcome {
    /// A next header validated at `offset`; `header` describes it.
    Found { offset: usize, header: DecodedHeader },
    /// No in-scope occurrence decided one way or the other yet; retain and wait for more bytes.
    NeedsMore,
    /// The scope ended before `format.max_frame_size` could be reached, because the queue itself
    /// ran out; this is not fatal, just undecided.
    NotFoundDataLimited,
    /// The scope was bounded by `max_frame_size` and no validating sync turned up inside it.
    NotFoundMaxFrameSizeExceeded,
}

/// Searches `data` (the bytes of the current, in-flight frame starting at its own validated sync)
/// for the next sync occurrence whose header both decodes and passes its consistency checks.
///
/// `data[0..]` is assumed to start at the current frame's sync; the search begins past it.
pub fn find_next_boundary(
    data: &[u8],
    base_pos: u64,
    format: Option<&StreamFormat>,
    blocking_strategy: Option<BlockingStrategy>,
    current_metadata: Option<&FrameMetadata>,
) -> BoundaryOutcome {
    let min_frame_size = format.map(|f| f.min_frame_size as usize).unwrap_or(0);
    let max_frame_size = format.and_then(|f| if f.max_frame_size > 0 { Some(f.max_frame_size as usize) } else { None });

    let start = SYNC_LENGTH.max(min_frame_size);
    let scope_end_by_format = max_frame_size.map(|m| m + SYNC_LENGTH);
    let end = match scope_end_by_format {
        Some(limit) => data.len().min(limit),
        None => data.len(),
    };

    if start >= data.len() {
        return match scope_end_by_format {
            Some(limit) if limit <= data.len() => BoundaryOutcome::NotFoundMaxFrameSizeExceeded,
            _ => BoundaryOutcome::NeedsMore,
        };
    }

    let wanted: u16 = match blocking_strategy {
        Some(BlockingStrategy::Fixed) => 0xfff8,
        Some(BlockingStrategy::Variable) => 0xfff9,
        None => 0xfff8,
    };
    let wanted_alt: u16 = match blocking_strategy {
        Some(_) => wanted,
        None => 0xfff9,
    };

    let mut offset = start;
    while offset + 1 < end {
        let word = u16::from_be_bytes([data[offset], data[offset + 1]]);
        if word != wanted && word != wanted_alt {
            offset += 1;
            continue;
        }

        let candidate_pos = base_pos + offset as u64;
        trace!("boundary candidate at pos {candidate_pos}");

        let candidate = &data[offset..];
        match decode_header(candidate, candidate_pos, format, blocking_strategy, current_metadata) {
            crate::error::DecodeOutcome::Ok(header) => {
                return BoundaryOutcome::Found { offset, header };
            }
            crate::error::DecodeOutcome::NeedsMore => {
                // The candidate might validate once more bytes arrive; since occurrences are
                // tried in order and this one is undecidable, the whole search is undecidable.
                return BoundaryOutcome::NeedsMore;
            }
            crate::error::DecodeOutcome::Invalid(e) => {
                warn!("discarding candidate at pos {candidate_pos}: {e}");
                offset += 1;
                continue;
            }
        }
    }

    match scope_end_by_format {
        Some(limit) if limit <= data.len() => BoundaryOutcome::NotFoundMaxFrameSizeExceeded,
        _ => BoundaryOutcome::NotFoundDataLimited,
    }
}

/// Builds the fatal error for an exhausted, `max_frame_size`-bounded search.
pub fn exhausted_error(pos: u64) -> ParseError {
    ParseError::InvalidFrame { pos }
}
