// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The tagged output record emitted by the parser, and the two data structures attached to it:
//! the stream-wide `StreamFormat` and the per-frame `FrameMetadata`.

/// Stream-wide format parameters, emitted once: either decoded from a STREAMINFO metadata block,
/// or synthesized from the first validated frame when the parser is running in streaming mode.
///
/// A field value of `0` (or `None` for the MD5 signature) means the source stream did not state
/// that value; this "unknown" convention must be preserved rather than papered over with a
/// default, since callers (e.g. seeking or duration logic) rely on being able to tell the two
/// apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFormat {
    /// Minimum block size across the stream, in samples. `0` if unknown.
    pub min_block_size: u16,
    /// Maximum block size across the stream, in samples. `0` if unknown.
    pub max_block_size: u16,
    /// Minimum frame size across the stream, in bytes. `0` if unknown.
    pub min_frame_size: u32,
    /// Maximum frame size across the stream, in bytes. `0` if unknown.
    pub max_frame_size: u32,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels, `1..=8`.
    pub channels: u8,
    /// Bits per sample, `4..=32`.
    pub sample_size: u8,
    /// Total number of inter-channel samples in the stream. `None` if unknown.
    pub total_samples: Option<u64>,
    /// MD5 signature of the original, unencoded audio data. `None` if unknown.
    pub md5_signature: Option<[u8; 16]>,
}

/// How the channels of a frame are coded: independently, or via one of FLAC's two-channel
/// stereo decorrelation schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    /// All channels are coded independently.
    Independent,
    /// Channel 0 is left, channel 1 is the left-minus-right difference.
    LeftSide,
    /// Channel 0 is the difference, channel 1 is right.
    RightSide,
    /// Channel 0 is the mid (average), channel 1 is the difference.
    MidSide,
}

/// Per-frame metadata decoded from a frame header, attached to the corresponding frame buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameMetadata {
    /// Inter-channel sample index of the first sample in this frame.
    pub starting_sample_number: u64,
    /// Block size of this frame, in samples.
    pub samples: u32,
    /// Sample rate in Hz, resolved against `StreamFormat` if the header used the "inherit" code.
    pub sample_rate: u32,
    /// Bits per sample, resolved against `StreamFormat` if the header used the "inherit" code.
    pub sample_size: u32,
    /// Number of channels, `1..=8`.
    pub channels: u8,
    /// Stereo decorrelation mode, if any.
    pub channel_mode: ChannelMode,
}

/// A tagged output record. Concatenating the payloads of every `OpaqueBuffer` and `FrameBuffer`
/// record, in emission order, reproduces the parser's consumed input exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// The stream's format parameters, emitted exactly once.
    StreamFormat(StreamFormat),
    /// An opaque, byte-exact passthrough of the stream marker or a metadata block (header and
    /// body).
    OpaqueBuffer(Vec<u8>),
    /// A complete, byte-exact frame, along with its decoded metadata.
    FrameBuffer { data: Vec<u8>, metadata: FrameMetadata },
}
