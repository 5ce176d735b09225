//! Synthetic FLAC stream builders shared by the scenario tests. Every fixture here is built
//! by hand from the format's bit layout rather than sourced from a real file, since none of the
//! canonical fixtures (`noise.flac`, `two_meta_blocks.flac`, `only_frames.flac`,
//! `noise_and_junk.flac`) ship with this crate; the builders reproduce the structural properties
//! those fixtures are described by.

use flac_frame_parser::*;

pub const STREAM_MARKER: &[u8; 4] = b"fLaC";

/// The length, in bytes, of a STREAMINFO block body (must match `metadata::STREAM_INFO_BODY_LEN`).
pub const STREAM_INFO_BODY_LEN: usize = 34;

/// A 4-byte metadata block header: `is_last:1 | type:7 | length:24`.
pub fn metadata_block_header(is_last: bool, block_type: u8, len: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(4);
    bytes.push((u8::from(is_last) << 7) | (block_type & 0x7f));
    bytes.extend_from_slice(&len.to_be_bytes()[1..]);
    bytes
}

/// A 34-byte STREAMINFO body. `total_samples == 0` and `md5 == None` encode "unknown" per the
/// format's own convention.
#[allow(clippy::too_many_arguments)]
pub fn stream_info_body(
    min_block_size: u16,
    max_block_size: u16,
    min_frame_size: u32,
    max_frame_size: u32,
    sample_rate: u32,
    channels: u8,
    sample_size: u8,
    total_samples: u64,
    md5: Option<[u8; 16]>,
) -> [u8; STREAM_INFO_BODY_LEN] {
    let mut body = [0u8; STREAM_INFO_BODY_LEN];
    body[0..2].copy_from_slice(&min_block_size.to_be_bytes());
    body[2..4].copy_from_slice(&max_block_size.to_be_bytes());
    body[4..7].copy_from_slice(&min_frame_size.to_be_bytes()[1..]);
    body[7..10].copy_from_slice(&max_frame_size.to_be_bytes()[1..]);

    let combined: u64 = (u64::from(sample_rate) << 44)
        | (u64::from(channels - 1) << 41)
        | (u64::from(sample_size - 1) << 36)
        | (total_samples & 0xf_ffff_ffff);
    body[10..18].copy_from_slice(&combined.to_be_bytes());

    if let Some(md5) = md5 {
        body[18..34].copy_from_slice(&md5);
    }

    body
}

/// A complete `STREAMINFO` metadata block: header plus body.
pub fn stream_info_block(is_last: bool, body: &[u8; STREAM_INFO_BODY_LEN]) -> Vec<u8> {
    let mut bytes = metadata_block_header(is_last, 0, STREAM_INFO_BODY_LEN as u32);
    bytes.extend_from_slice(body);
    bytes
}

/// An opaque, non-STREAMINFO metadata block (e.g. a padding block) of `len` zeroed body bytes.
pub fn padding_block(is_last: bool, len: u32) -> Vec<u8> {
    let mut bytes = metadata_block_header(is_last, 1, len);
    bytes.extend(std::iter::repeat(0u8).take(len as usize));
    bytes
}

/// CRC-8 over a frame header, matching `bitstream::crc8`'s poly/init (duplicated here since the
/// crate does not expose it publicly).
fn crc8(bytes: &[u8]) -> u8 {
    let mut crc: u8 = 0;
    for &byte in bytes {
        crc ^= byte;
        for _ in 0..8 {
            crc = if (crc & 0x80) != 0 { (crc << 1) ^ 0x07 } else { crc << 1 };
        }
    }
    crc
}

/// A fixed-blocking-strategy frame: header fields plus `payload_len` zeroed body bytes.
///
/// `frame_index` must be `< 128` so it fits in a single-byte UTF-8-style coded number, which is
/// all every scenario below needs.
pub fn fixed_frame(
    block_size_code: u8,
    sample_rate_code: u8,
    channel_assignment_code: u8,
    sample_size_code: u8,
    frame_index: u8,
    payload_len: usize,
) -> Vec<u8> {
    assert!(frame_index < 0x80, "frame index must fit a single UTF-8-style byte");
    let mut bytes = vec![
        0xff,
        0xf8, // fixed blocking strategy
        (block_size_code << 4) | sample_rate_code,
        (channel_assignment_code << 4) | (sample_size_code << 1),
        frame_index,
    ];
    let crc = crc8(&bytes);
    bytes.push(crc);
    bytes.extend(std::iter::repeat(0u8).take(payload_len));
    bytes
}

/// Total bytes represented by `records`, reconstructed by summing each record's payload. Since
/// every `Record` variant other than `StreamFormat` is an exact passthrough of consumed input,
/// this equals the number of stream bytes the records were built from.
pub fn total_bytes(records: &[Record]) -> usize {
    records
        .iter()
        .map(|r| match r {
            Record::StreamFormat(_) => 0,
            Record::OpaqueBuffer(b) => b.len(),
            Record::FrameBuffer { data, .. } => data.len(),
        })
        .sum()
}
