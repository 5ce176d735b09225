// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Metadata block header decoding and STREAMINFO body decoding (component B of the parser).
//!
//! Every other metadata block type passes through as an opaque payload; only STREAMINFO's body
//! is interpreted, since it is the only block the frame decoder needs to resolve "inherit from
//! STREAMINFO" fields and to bound the frame boundary search.

use crate::bitstream::Cursor;
use crate::record::StreamFormat;

/// The length, in bytes, of a STREAMINFO block body.
pub const STREAM_INFO_BODY_LEN: usize = 34;

/// The 4-byte header that precedes every metadata block: `is_last:1 | type:7 | length:24`.
pub struct MetadataBlockHeader {
    pub is_last: bool,
    pub block_type: u8,
    pub block_len: u32,
}

impl MetadataBlockHeader {
    pub const LEN: usize = 4;

    /// Decodes a metadata block header from the first 4 bytes of `buf`. Returns `None` if fewer
    /// than 4 bytes are available.
    pub fn decode(buf: &[u8]) -> Option<MetadataBlockHeader> {
        let mut cursor = Cursor::new(buf);

        let first = cursor.read_u8()?;
        let is_last = (first & 0x80) != 0;
        let block_type = first & 0x7f;
        let block_len = cursor.read_be_u24()?;

        Some(MetadataBlockHeader { is_last, block_type, block_len })
    }
}

/// The metadata block type code for STREAMINFO; every other code (`1..=6` known, `7..=126`
/// reserved, `127` invalid/forbidden) is treated as opaque.
pub const BLOCK_TYPE_STREAM_INFO: u8 = 0;

/// Decodes a STREAMINFO body (exactly [`STREAM_INFO_BODY_LEN`] bytes) into a [`StreamFormat`].
///
/// The caller is responsible for ensuring `body` has the expected length; this function simply
/// reads the fixed bit layout defined by the FLAC format and maps all-zero fields to "unknown",
/// per FLAC's own unknown-value convention.
pub fn decode_stream_info(body: &[u8; STREAM_INFO_BODY_LEN]) -> StreamFormat {
    let mut cursor = Cursor::new(body);

    // <16> minimum block size, <16> maximum block size, in samples.
    let min_block_size = cursor.read_be_u16().expect("fixed-size body");
    let max_block_size = cursor.read_be_u16().expect("fixed-size body");

    // <24> minimum frame size, <24> maximum frame size, in bytes.
    let min_frame_size = cursor.read_be_u24().expect("fixed-size body");
    let max_frame_size = cursor.read_be_u24().expect("fixed-size body");

    // The next 64 bits pack <20> sample rate, <3> channels-1, <5> bits-per-sample-1, and <36>
    // total samples, back to back and not byte-aligned past the sample rate field.
    let packed = cursor.read_bytes(8).expect("fixed-size body");
    let combined = u64::from_be_bytes(packed.try_into().expect("8 bytes"));

    let sample_rate = ((combined >> 44) & 0xf_ffff) as u32;
    let channels = (((combined >> 41) & 0x7) + 1) as u8;
    let sample_size = (((combined >> 36) & 0x1f) + 1) as u8;
    let total_samples_raw = combined & 0xf_ffff_ffff;

    // <128> MD5 signature of the unencoded audio data.
    let md5_bytes = cursor.read_bytes(16).expect("fixed-size body");
    let md5_signature: [u8; 16] = md5_bytes.try_into().expect("16 bytes");

    StreamFormat {
        min_block_size,
        max_block_size,
        min_frame_size,
        max_frame_size,
        sample_rate,
        channels,
        sample_size,
        total_samples: if total_samples_raw == 0 { None } else { Some(total_samples_raw) },
        md5_signature: if md5_signature == [0u8; 16] { None } else { Some(md5_signature) },
    }
}
