//! Wire framing for the request/reply stream
//!
//! Each message is a 4-byte little-endian payload length followed by
//! `block_size * 2` little-endian f32 values in **row-major [N, 2]** order:
//! element `[i][0]` is the audio column, element `[i][1]` the metadata
//! column. In a request the audio column carries the mono input block and
//! the metadata column carries, in its first three rows, the channel id,
//! azimuth, and elevation (cast to integer); the remaining rows are
//! reserved zero. The reply carries the stereo output in the same layout:
//! `[i][0]` left, `[i][1]` right.

use bf_core::Sample;

/// Bytes per frame row: one audio f32 plus one metadata f32.
const ROW_BYTES: usize = 8;

/// Decoded request with reusable audio storage.
pub struct Request {
    pub audio: Vec<Sample>,
    pub channel: i32,
    pub azimuth: i32,
    pub elevation: i32,
}

impl Request {
    pub fn new(block_size: usize) -> Self {
        Self {
            audio: vec![0.0; block_size],
            channel: 0,
            azimuth: 0,
            elevation: 0,
        }
    }

    /// Expected payload size for this block size.
    pub fn payload_len(&self) -> usize {
        self.audio.len() * ROW_BYTES
    }

    /// Decode a request payload in place. Returns false (leaving previous
    /// contents untouched) if the byte length does not match the block
    /// size.
    pub fn decode(&mut self, payload: &[u8]) -> bool {
        if payload.len() != self.payload_len() {
            return false;
        }

        for (i, row) in payload.chunks_exact(ROW_BYTES).enumerate() {
            self.audio[i] = f32::from_le_bytes([row[0], row[1], row[2], row[3]]);
            let meta = f32::from_le_bytes([row[4], row[5], row[6], row[7]]);
            match i {
                0 => self.channel = meta as i32,
                1 => self.azimuth = meta as i32,
                2 => self.elevation = meta as i32,
                _ => {}
            }
        }
        true
    }
}

/// Encode a stereo reply, length prefix included.
pub fn encode_reply(left: &[Sample], right: &[Sample], buf: &mut Vec<u8>) {
    buf.clear();
    let payload_len = (left.len() * ROW_BYTES) as u32;
    buf.extend_from_slice(&payload_len.to_le_bytes());
    for (l, r) in left.iter().zip(right) {
        buf.extend_from_slice(&l.to_le_bytes());
        buf.extend_from_slice(&r.to_le_bytes());
    }
}
