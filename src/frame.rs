// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frame header decoding and validation (component C of the parser).

use log::{trace, warn};

use crate::bitstream::{self, crc8, resolve_block_size, resolve_sample_rate, Cursor};
use crate::error::{DecodeOutcome, ParseError};
use crate::record::{ChannelMode, FrameMetadata, StreamFormat};

/// Whether a stream's frame numbering counts frames or samples. Once observed on the first
/// frame, this is fixed for the lifetime of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingStrategy {
    Fixed,
    Variable,
}

/// A successfully decoded and validated frame header.
pub struct DecodedHeader {
    pub metadata: FrameMetadata,
    pub blocking_strategy: BlockingStrategy,
    /// Total number of header bytes consumed, from the sync word through the CRC-8 byte.
    pub header_len: usize,
}

/// Decodes and validates a candidate frame header starting at the beginning of `buf`.
///
/// `format`, if known, gates the consistency checks and resolves "inherit from STREAMINFO"
/// codes. `established_blocking_strategy`, once observed, must agree with the header's blocking
/// bit. `previous`, if present, is the metadata of the frame immediately before this one, used
/// for the sample-number continuity check.
///
/// `pos` is the absolute stream offset of `buf[0]`, used only to annotate errors.
pub fn decode_header(
    buf: &[u8],
    pos: u64,
    format: Option<&StreamFormat>,
    established_blocking_strategy: Option<BlockingStrategy>,
    previous: Option<&FrameMetadata>,
) -> DecodeOutcome<DecodedHeader> {
    trace!("decoding candidate frame header at pos {pos}");

    let mut cursor = Cursor::new(buf);

    let Some(b0) = cursor.read_u8() else { return DecodeOutcome::NeedsMore };
    let Some(b1) = cursor.read_u8() else { return DecodeOutcome::NeedsMore };

    if b0 != 0xff || (b1 & 0xfe) != 0xf8 {
        warn!("pos {pos}: sync pattern mismatch");
        return DecodeOutcome::Invalid(ParseError::InvalidHeader { pos });
    }

    let blocking_strategy =
        if (b1 & 0x01) == 0 { BlockingStrategy::Fixed } else { BlockingStrategy::Variable };

    if let Some(established) = established_blocking_strategy {
        if established != blocking_strategy {
            warn!("pos {pos}: blocking strategy {blocking_strategy:?} disagrees with established {established:?}");
            return DecodeOutcome::Invalid(ParseError::InvalidHeader { pos });
        }
    }

    let Some(b2) = cursor.read_u8() else { return DecodeOutcome::NeedsMore };
    let block_size_code = b2 >> 4;
    let sample_rate_code = b2 & 0x0f;

    let Some(b3) = cursor.read_u8() else { return DecodeOutcome::NeedsMore };
    let channel_assignment_code = b3 >> 4;
    let sample_size_code = (b3 >> 1) & 0x07;
    let reserved_bit = b3 & 0x01;

    if reserved_bit != 0 {
        warn!("pos {pos}: reserved header bit set");
        return DecodeOutcome::Invalid(ParseError::InvalidHeader { pos });
    }

    let (channels, channel_mode) = match channel_assignment_code {
        0..=7 => (channel_assignment_code + 1, ChannelMode::Independent),
        8 => (2, ChannelMode::LeftSide),
        9 => (2, ChannelMode::RightSide),
        10 => (2, ChannelMode::MidSide),
        _ => {
            warn!("pos {pos}: reserved channel assignment code {channel_assignment_code}");
            return DecodeOutcome::Invalid(ParseError::InvalidHeader { pos });
        }
    };

    let sample_size = match sample_size_code {
        0b000 => format.map(|f| u32::from(f.sample_size)).unwrap_or(0),
        0b001 => 8,
        0b010 => 12,
        0b011 => {
            warn!("pos {pos}: reserved sample-size code {sample_size_code:#05b}");
            return DecodeOutcome::Invalid(ParseError::InvalidHeader { pos });
        }
        0b100 => 16,
        0b101 => 20,
        0b110 => 24,
        0b111 => {
            warn!("pos {pos}: reserved sample-size code {sample_size_code:#05b}");
            return DecodeOutcome::Invalid(ParseError::InvalidHeader { pos });
        }
        _ => unreachable!("3-bit code"),
    };

    let number = match bitstream::read_utf8_num(&mut cursor) {
        None => return DecodeOutcome::NeedsMore,
        Some(Err(e)) => {
            warn!("pos {pos}: {e}");
            return DecodeOutcome::Invalid(e);
        }
        Some(Ok(v)) => v,
    };

    let block_size = match resolve_block_size(block_size_code, &mut cursor) {
        None => return DecodeOutcome::NeedsMore,
        Some(Err(e)) => {
            warn!("pos {pos}: {e}");
            return DecodeOutcome::Invalid(e);
        }
        Some(Ok(v)) => v,
    };

    let sample_rate_resolved = match resolve_sample_rate(sample_rate_code, &mut cursor) {
        None => return DecodeOutcome::NeedsMore,
        Some(Err(e)) => {
            warn!("pos {pos}: {e}");
            return DecodeOutcome::Invalid(e);
        }
        Some(Ok(v)) => v,
    };

    let sample_rate = match sample_rate_resolved.hz {
        Some(hz) => hz,
        None => format.map(|f| f.sample_rate).unwrap_or(0),
    };

    let Some(crc_byte) = cursor.read_u8() else { return DecodeOutcome::NeedsMore };

    let header_len = cursor.consumed();
    let computed_crc = crc8(&buf[..header_len - 1]);
    if computed_crc != crc_byte {
        warn!("pos {pos}: header crc mismatch (computed {computed_crc:#04x}, found {crc_byte:#04x})");
        return DecodeOutcome::Invalid(ParseError::InvalidHeaderCrc);
    }

    let starting_sample_number = match blocking_strategy {
        BlockingStrategy::Variable => number,
        BlockingStrategy::Fixed => match format.map(|f| f.min_block_size) {
            Some(min_block_size) if min_block_size > 0 => number * u64::from(min_block_size),
            _ => number * u64::from(block_size.samples),
        },
    };

    let metadata = FrameMetadata {
        starting_sample_number,
        samples: block_size.samples,
        sample_rate,
        sample_size,
        channels,
        channel_mode,
    };

    if let Some(format) = format {
        if metadata.channels != format.channels
            || metadata.sample_rate != format.sample_rate
            || metadata.sample_size != u32::from(format.sample_size)
        {
            warn!("pos {pos}: frame header disagrees with established stream format");
            return DecodeOutcome::Invalid(ParseError::InvalidHeader { pos });
        }

        if format.max_block_size > 0 && metadata.samples > u32::from(format.max_block_size) {
            warn!("pos {pos}: block size {} exceeds max_block_size {}", metadata.samples, format.max_block_size);
            return DecodeOutcome::Invalid(ParseError::InvalidHeader { pos });
        }
    }

    if let Some(previous) = previous {
        if metadata.starting_sample_number != previous.starting_sample_number + u64::from(previous.samples)
        {
            warn!(
                "pos {pos}: starting_sample_number {} is not continuous with previous frame (expected {})",
                metadata.starting_sample_number,
                previous.starting_sample_number + u64::from(previous.samples)
            );
            return DecodeOutcome::Invalid(ParseError::InvalidHeader { pos });
        }
    }

    DecodeOutcome::Ok(DecodedHeader { metadata, blocking_strategy, header_len })
}

/// Synthesizes a `StreamFormat` from the first validated frame of a streaming-mode session, per
/// the first-frame synthesis rule: block-size bounds are only known under fixed blocking, and
/// every other field is left unknown.
pub fn synthesize_format(header: &DecodedHeader) -> StreamFormat {
    let (min_block_size, max_block_size) = match header.blocking_strategy {
        BlockingStrategy::Fixed => {
            let samples = header.metadata.samples as u16;
            (samples, samples)
        }
        BlockingStrategy::Variable => (0, 0),
    };

    StreamFormat {
        min_block_size,
        max_block_size,
        min_frame_size: 0,
        max_frame_size: 0,
        sample_rate: header.metadata.sample_rate,
        channels: header.metadata.channels,
        sample_size: header.metadata.sample_size as u8,
        total_samples: None,
        md5_signature: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_header(
        block_size_code: u8,
        sample_rate_code: u8,
        channels_code: u8,
        sample_size_code: u8,
        frame_index: u8,
    ) -> Vec<u8> {
        let mut bytes = vec![
            0xff,
            0xf8,
            (block_size_code << 4) | sample_rate_code,
            (channels_code << 4) | (sample_size_code << 1),
        ];
        bytes.push(frame_index);
        let crc = crc8(&bytes);
        bytes.push(crc);
        bytes
    }

    #[test]
    fn decodes_minimal_fixed_header() {
        // block_size code 0x8 -> 256 samples, sample_rate code 0x8 -> 32000 Hz,
        // channels code 0x0 -> mono, sample_size code 0b100 -> 16 bits, frame index 0.
        let bytes = encode_header(0x8, 0x8, 0x0, 0b100, 0);
        match decode_header(&bytes, 0, None, None, None) {
            DecodeOutcome::Ok(decoded) => {
                assert_eq!(decoded.metadata.samples, 256);
                assert_eq!(decoded.metadata.sample_rate, 32_000);
                assert_eq!(decoded.metadata.channels, 1);
                assert_eq!(decoded.metadata.sample_size, 16);
                assert_eq!(decoded.metadata.starting_sample_number, 0);
                assert_eq!(decoded.header_len, bytes.len());
                assert_eq!(decoded.blocking_strategy, BlockingStrategy::Fixed);
            }
            _ => panic!("expected Ok"),
        }
    }

    #[test]
    fn needs_more_on_truncated_header() {
        let bytes = encode_header(0x8, 0x8, 0x0, 0b100, 0);
        assert!(decode_header(&bytes[..4], 0, None, None, None).is_needs_more());
    }

    #[test]
    fn rejects_bad_crc() {
        let mut bytes = encode_header(0x8, 0x8, 0x0, 0b100, 0);
        *bytes.last_mut().unwrap() ^= 0xff;
        match decode_header(&bytes, 0, None, None, None) {
            DecodeOutcome::Invalid(ParseError::InvalidHeaderCrc) => {}
            _ => panic!("expected InvalidHeaderCrc"),
        }
    }

    #[test]
    fn rejects_blocking_strategy_mismatch() {
        let bytes = encode_header(0x8, 0x8, 0x0, 0b100, 0);
        match decode_header(&bytes, 0, None, Some(BlockingStrategy::Variable), None) {
            DecodeOutcome::Invalid(ParseError::InvalidHeader { .. }) => {}
            _ => panic!("expected InvalidHeader"),
        }
    }

    #[test]
    fn rejects_format_mismatch() {
        let bytes = encode_header(0x8, 0x8, 0x0, 0b100, 0);
        let format = StreamFormat {
            min_block_size: 256,
            max_block_size: 256,
            min_frame_size: 0,
            max_frame_size: 0,
            sample_rate: 44_100,
            channels: 2,
            sample_size: 16,
            total_samples: None,
            md5_signature: None,
        };
        match decode_header(&bytes, 0, Some(&format), None, None) {
            DecodeOutcome::Invalid(ParseError::InvalidHeader { .. }) => {}
            _ => panic!("expected InvalidHeader"),
        }
    }

    #[test]
    fn enforces_sample_number_continuity() {
        let bytes = encode_header(0x8, 0x8, 0x0, 0b100, 1);
        let previous = FrameMetadata {
            starting_sample_number: 0,
            samples: 256,
            sample_rate: 32_000,
            sample_size: 16,
            channels: 1,
            channel_mode: ChannelMode::Independent,
        };
        match decode_header(&bytes, 0, None, None, Some(&previous)) {
            DecodeOutcome::Ok(decoded) => {
                assert_eq!(decoded.metadata.starting_sample_number, 256);
            }
            _ => panic!("expected Ok"),
        }
    }

    #[test]
    fn rejects_reserved_channel_assignment() {
        let bytes = encode_header(0x8, 0x8, 0xd, 0b100, 0);
        match decode_header(&bytes, 0, None, None, None) {
            DecodeOutcome::Invalid(ParseError::InvalidHeader { .. }) => {}
            _ => panic!("expected InvalidHeader"),
        }
    }

    #[test]
    fn maps_stereo_modes() {
        let bytes = encode_header(0x8, 0x8, 0x9, 0b100, 0);
        match decode_header(&bytes, 0, None, None, None) {
            DecodeOutcome::Ok(decoded) => {
                assert_eq!(decoded.metadata.channels, 2);
                assert_eq!(decoded.metadata.channel_mode, ChannelMode::RightSide);
            }
            _ => panic!("expected Ok"),
        }
    }

    #[test]
    fn synthesizes_format_from_fixed_frame() {
        let bytes = encode_header(0x8, 0x8, 0x0, 0b100, 0);
        let decoded = match decode_header(&bytes, 0, None, None, None) {
            DecodeOutcome::Ok(decoded) => decoded,
            _ => panic!("expected Ok"),
        };
        let format = synthesize_format(&decoded);
        assert_eq!(format.min_block_size, 256);
        assert_eq!(format.max_block_size, 256);
        assert_eq!(format.sample_rate, 32_000);
        assert_eq!(format.total_samples, None);
    }
}
