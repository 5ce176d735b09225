// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The top-level parser state machine (component E): phase dispatch, input buffering, output
//! accumulation, and the flush contract.

use log::{debug, error, trace, warn};

use crate::boundary::{exhausted_error, find_next_boundary, BoundaryOutcome};
use crate::error::{DecodeOutcome, ParseError, ParseResult};
use crate::frame::{decode_header, synthesize_format, BlockingStrategy};
use crate::metadata::{decode_stream_info, MetadataBlockHeader, BLOCK_TYPE_STREAM_INFO, STREAM_INFO_BODY_LEN};
use crate::record::{FrameMetadata, Record, StreamFormat};

const STREAM_MARKER: &[u8; 4] = b"fLaC";
/// Stream marker plus the smallest legal metadata block header+body (STREAMINFO, 4 + 34 bytes).
const STREAM_PHASE_MINIMUM: usize = 4 + MetadataBlockHeader::LEN + STREAM_INFO_BODY_LEN;

/// Which phase of the FLAC stream the parser is currently positioned at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stream,
    MetadataBlock,
    Frame,
}

/// Parser state, owned exclusively by the caller across `parse`/`flush` calls.
pub struct ParserState {
    queue: Vec<u8>,
    phase: Phase,
    pos: u64,
    format: Option<StreamFormat>,
    blocking_strategy: Option<BlockingStrategy>,
    current_metadata: Option<FrameMetadata>,
    streaming_mode: bool,
}

/// Creates a fresh parser. When `streaming_mode` is set, input lacking the stream marker and
/// metadata is accepted and assumed to begin directly at a frame boundary.
pub fn init(streaming_mode: bool) -> ParserState {
    ParserState {
        queue: Vec::new(),
        phase: Phase::Stream,
        pos: 0,
        format: None,
        blocking_strategy: None,
        current_metadata: None,
        streaming_mode,
    }
}

/// Feeds `chunk` into the parser, returning every record that became decidable as a result.
///
/// Bytes left over at the end of `chunk` (an incomplete header, block, or frame) are retained in
/// `state`'s internal queue for the next call.
pub fn parse(chunk: &[u8], state: &mut ParserState) -> ParseResult<Vec<Record>> {
    let mut buf = std::mem::take(&mut state.queue);
    buf.extend_from_slice(chunk);

    let mut consumed = 0usize;
    let mut records = Vec::new();

    loop {
        match state.phase {
            Phase::Stream => match advance_stream(&buf, consumed, state) {
                StepOutcome::NeedsMore => break,
                StepOutcome::Advance(n) => {
                    if n > 0 {
                        records.push(Record::OpaqueBuffer(buf[consumed..consumed + n].to_vec()));
                    }
                    consumed += n;
                }
                StepOutcome::Fatal(e) => return fail(e),
            },
            Phase::MetadataBlock => {
                match advance_metadata_block(&buf, consumed, state, &mut records) {
                    StepOutcome::NeedsMore => break,
                    StepOutcome::Advance(n) => consumed += n,
                    StepOutcome::Fatal(e) => return fail(e),
                }
            }
            Phase::Frame => match advance_frame(&buf, consumed, state, &mut records) {
                StepOutcome::NeedsMore => break,
                StepOutcome::Advance(n) => consumed += n,
                StepOutcome::Fatal(e) => return fail(e),
            },
        }
    }

    state.queue = buf[consumed..].to_vec();
    trace!("parse: consumed {consumed} bytes, {} bytes retained", state.queue.len());
    Ok(records)
}

/// Drains whatever bytes remain buffered as the final, un-terminated frame. The boundary finder
/// can never close the last frame of a stream on its own, since it only ever learns a frame's
/// extent by finding the *next* one.
pub fn flush(state: &mut ParserState) -> Record {
    let data = std::mem::take(&mut state.queue);
    let final_len = data.len() as u64;
    let metadata = state.current_metadata.clone().unwrap_or(FrameMetadata {
        starting_sample_number: 0,
        samples: 0,
        sample_rate: 0,
        sample_size: 0,
        channels: 0,
        channel_mode: crate::record::ChannelMode::Independent,
    });
    debug!("flush: pos={} final_len={final_len}", state.pos);
    state.pos += final_len;
    Record::FrameBuffer { data, metadata }
}

/// Logs and returns a fatal parse error. Centralized so every `Phase` handler's failure is
/// reported the same way regardless of which check raised it.
fn fail(e: ParseError) -> ParseResult<Vec<Record>> {
    error!("parse failed: {e}");
    Err(e)
}

enum StepOutcome {
    /// Advance `consumed` by this many bytes; the phase may or may not have changed.
    Advance(usize),
    NeedsMore,
    Fatal(ParseError),
}

fn advance_stream(buf: &[u8], consumed: usize, state: &mut ParserState) -> StepOutcome {
    let remaining = &buf[consumed..];

    if remaining.len() < STREAM_PHASE_MINIMUM {
        return StepOutcome::NeedsMore;
    }

    if remaining.starts_with(STREAM_MARKER) {
        state.pos += 4;
        state.phase = Phase::MetadataBlock;
        return StepOutcome::Advance(4);
    }

    if state.streaming_mode {
        trace!("no stream marker found, entering streaming mode at pos {}", state.pos);
        state.phase = Phase::Frame;
        return StepOutcome::Advance(0);
    }

    StepOutcome::Fatal(ParseError::NotStream { pos: state.pos })
}

fn advance_metadata_block(
    buf: &[u8],
    consumed: usize,
    state: &mut ParserState,
    records: &mut Vec<Record>,
) -> StepOutcome {
    let remaining = &buf[consumed..];

    if remaining.len() < MetadataBlockHeader::LEN {
        return StepOutcome::NeedsMore;
    }

    let header = MetadataBlockHeader::decode(remaining).expect("length checked above");
    let total_len = MetadataBlockHeader::LEN + header.block_len as usize;

    if remaining.len() < total_len {
        return StepOutcome::NeedsMore;
    }

    records.push(Record::OpaqueBuffer(remaining[..total_len].to_vec()));

    if header.block_type == BLOCK_TYPE_STREAM_INFO && header.block_len as usize == STREAM_INFO_BODY_LEN {
        let body: [u8; STREAM_INFO_BODY_LEN] =
            remaining[MetadataBlockHeader::LEN..total_len].try_into().expect("length checked above");
        let format = decode_stream_info(&body);
        debug!("stream info decoded: {format:?}");
        records.push(Record::StreamFormat(format.clone()));
        state.format = Some(format);
    }

    state.pos += total_len as u64;

    if header.is_last {
        if !state.streaming_mode && state.format.is_none() {
            warn!("last metadata block reached at pos {} without a STREAMINFO block", state.pos);
            return StepOutcome::Fatal(ParseError::InvalidHeader { pos: state.pos });
        }
        state.phase = Phase::Frame;
    }

    StepOutcome::Advance(total_len)
}

fn advance_frame(
    buf: &[u8],
    consumed: usize,
    state: &mut ParserState,
    records: &mut Vec<Record>,
) -> StepOutcome {
    let remaining = &buf[consumed..];

    match &state.current_metadata {
        None => {
            if remaining.is_empty() {
                return StepOutcome::NeedsMore;
            }

            match decode_header(remaining, state.pos, state.format.as_ref(), state.blocking_strategy, None) {
                DecodeOutcome::NeedsMore => StepOutcome::NeedsMore,
                DecodeOutcome::Invalid(e) => StepOutcome::Fatal(e),
                DecodeOutcome::Ok(header) => {
                    if state.blocking_strategy.is_none() {
                        state.blocking_strategy = Some(header.blocking_strategy);
                    }

                    if state.format.is_none() && state.streaming_mode {
                        let synthesized = synthesize_format(&header);
                        debug!("synthesized stream format from first frame: {synthesized:?}");
                        records.push(Record::StreamFormat(synthesized.clone()));
                        state.format = Some(synthesized);
                    }

                    state.current_metadata = Some(header.metadata);
                    StepOutcome::Advance(0)
                }
            }
        }
        Some(current) => {
            match find_next_boundary(
                remaining,
                state.pos,
                state.format.as_ref(),
                state.blocking_strategy,
                Some(current),
            ) {
                BoundaryOutcome::Found { offset, header } => {
                    let frame_bytes = remaining[..offset].to_vec();
                    let finished = state.current_metadata.take().expect("checked above");
                    records.push(Record::FrameBuffer { data: frame_bytes, metadata: finished });
                    state.pos += offset as u64;
                    state.current_metadata = Some(header.metadata);
                    StepOutcome::Advance(offset)
                }
                BoundaryOutcome::NeedsMore => StepOutcome::NeedsMore,
                BoundaryOutcome::NotFoundDataLimited => StepOutcome::NeedsMore,
                BoundaryOutcome::NotFoundMaxFrameSizeExceeded => {
                    StepOutcome::Fatal(exhausted_error(state.pos))
                }
            }
        }
    }
}
