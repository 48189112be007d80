// Copyright (C) 2022 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use bytes::Bytes;

use crate::rtp::{RawPacketBuilder, PAYLOAD_TYPE_JPEG};

pub(crate) const SSRC: u32 = 0x4cac_c3d1;

/// Arbitrary but valid 8-bit luma and chroma tables.
pub(crate) static QTABLES: [u8; 128] = [16; 128];

pub(crate) fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::new().filter_or("RTPJPEG_LOG", "info"))
        .is_test(true)
        .try_init();
}

/// Builds a single RTP/JPEG packet.
///
/// Defaults to a continuation fragment (no quantization table header) of a
/// 160x120 type 1 image with in-band tables.
#[derive(Clone)]
pub(crate) struct Fragment<'a> {
    pub(crate) seq: u16,
    pub(crate) timestamp: u32,
    pub(crate) ssrc: u32,
    pub(crate) payload_type: u8,
    pub(crate) mark: bool,
    pub(crate) type_specific: u8,
    pub(crate) offset: u32,
    pub(crate) image_type: u8,
    pub(crate) q: u8,
    pub(crate) width_blocks: u8,
    pub(crate) height_blocks: u8,
    pub(crate) qtable_precision: u8,
    pub(crate) qtable: Option<&'a [u8]>,
}

impl Default for Fragment<'_> {
    fn default() -> Self {
        Fragment {
            seq: 0,
            timestamp: 0,
            ssrc: SSRC,
            payload_type: PAYLOAD_TYPE_JPEG,
            mark: false,
            type_specific: 0,
            offset: 0,
            image_type: 1,
            q: 255,
            width_blocks: 20,
            height_blocks: 15,
            qtable_precision: 0,
            qtable: None,
        }
    }
}

impl Fragment<'_> {
    /// A first fragment, carrying [`QTABLES`].
    pub(crate) fn first() -> Self {
        Fragment {
            qtable: Some(&QTABLES[..]),
            ..Fragment::default()
        }
    }

    pub(crate) fn build(&self, payload: &[u8]) -> Bytes {
        let mut body = vec![self.type_specific];
        body.extend_from_slice(&self.offset.to_be_bytes()[1..]);
        body.extend_from_slice(&[self.image_type, self.q, self.width_blocks, self.height_blocks]);
        if let Some(t) = self.qtable {
            body.extend_from_slice(&[0, self.qtable_precision]);
            body.extend_from_slice(&(t.len() as u16).to_be_bytes());
            body.extend_from_slice(t);
        }
        body.extend_from_slice(payload);
        RawPacketBuilder {
            sequence_number: self.seq,
            timestamp: self.timestamp,
            payload_type: self.payload_type,
            ssrc: self.ssrc,
            mark: self.mark,
        }
        .build(body)
        .unwrap()
    }
}

/// Splits `entropy_coded` into the packets of one frame, `chunk` bytes each.
pub(crate) fn frame_packets(
    first_seq: u16,
    timestamp: u32,
    entropy_coded: &[u8],
    chunk: usize,
) -> Vec<Bytes> {
    let n = (entropy_coded.len() + chunk - 1) / chunk;
    entropy_coded
        .chunks(chunk)
        .enumerate()
        .map(|(i, c)| {
            let base = Fragment {
                seq: first_seq.wrapping_add(i as u16),
                timestamp,
                offset: (i * chunk) as u32,
                mark: i + 1 == n,
                ..Fragment::default()
            };
            if i == 0 {
                Fragment {
                    qtable: Some(&QTABLES[..]),
                    ..base
                }
                .build(c)
            } else {
                base.build(c)
            }
        })
        .collect()
}
