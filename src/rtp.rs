// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handles RTP data as described in
//! [RFC 3550 section 5.1](https://datatracker.ietf.org/doc/html/rfc3550#section-5.1).

use bytes::{Buf, Bytes};

use crate::error::check_len;
use crate::Error;

/// The minimum length of an RTP header (no CSRCs or extensions).
pub const MIN_HEADER_LEN: usize = 12;

/// The static payload type assigned to JPEG by
/// [RFC 3551](https://datatracker.ietf.org/doc/html/rfc3551#section-6).
pub const PAYLOAD_TYPE_JPEG: u8 = 26;

/// The RTP clock rate of JPEG video, in Hz.
pub const JPEG_CLOCK_RATE: u32 = 90_000;

/// A validated RTP packet borrowed from a receive buffer.
///
/// Parsing copies the fixed header fields out; the CSRC list and payload stay
/// as slices into the original buffer.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|X|  CC   |M|     PT      |       sequence number         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           synchronization source (SSRC) identifier            |
/// +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
/// |            contributing source (CSRC) identifiers             |
/// |                             ....                              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// Padding and header extensions are flagged but not stripped: the payload is
/// everything after the CSRC list. Consumers which can't handle those flags
/// (such as [`crate::codec::jpeg::Depacketizer`]) reject the packet.
#[derive(Copy, Clone)]
pub struct RawPacket<'a> {
    first: u8,
    second: u8,
    sequence_number: u16,
    timestamp: u32,
    ssrc: u32,
    csrcs: &'a [u8],
    payload: &'a [u8],
}

impl<'a> RawPacket<'a> {
    /// Validates an RTP packet.
    pub fn parse(data: &'a [u8]) -> Result<Self, Error> {
        check_fixed_header(data)?;
        let csrc_count = usize::from(data[0] & 0b0000_1111);
        let csrc_end = MIN_HEADER_LEN + 4 * csrc_count;
        check_len(data, csrc_end)?;
        let mut hdr = &data[..MIN_HEADER_LEN];
        let first = hdr.get_u8();
        let second = hdr.get_u8();
        let sequence_number = hdr.get_u16();
        let timestamp = hdr.get_u32();
        let ssrc = hdr.get_u32();
        Ok(RawPacket {
            first,
            second,
            sequence_number,
            timestamp,
            ssrc,
            csrcs: &data[MIN_HEADER_LEN..csrc_end],
            payload: &data[csrc_end..],
        })
    }

    #[inline]
    pub fn version(&self) -> u8 {
        self.first >> 6
    }

    #[inline]
    pub fn has_padding(&self) -> bool {
        (self.first & 0b0010_0000) != 0
    }

    #[inline]
    pub fn has_extension(&self) -> bool {
        (self.first & 0b0001_0000) != 0
    }

    #[inline]
    pub fn csrc_count(&self) -> u8 {
        self.first & 0b0000_1111
    }

    #[inline]
    pub fn mark(&self) -> bool {
        (self.second & 0b1000_0000) != 0
    }

    #[inline]
    pub fn payload_type(&self) -> u8 {
        self.second & 0b0111_1111
    }

    #[inline]
    pub fn sequence_number(&self) -> u16 {
        self.sequence_number
    }

    #[inline]
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    #[inline]
    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    /// Iterates over the contributing source identifiers.
    pub fn csrcs(&self) -> impl Iterator<Item = u32> + 'a {
        self.csrcs
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
    }

    /// Returns everything after the fixed header and CSRC list.
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }
}

impl std::fmt::Debug for RawPacket<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawPacket")
            .field("padding", &self.has_padding())
            .field("extension", &self.has_extension())
            .field("csrc_count", &self.csrc_count())
            .field("mark", &self.mark())
            .field("payload_type", &self.payload_type())
            .field("sequence_number", &self.sequence_number)
            .field("timestamp", &self.timestamp)
            .field("ssrc", &format_args!("{:08x}", self.ssrc))
            .field(
                "payload",
                &crate::hex::LimitedHex::new(self.payload, crate::hex::DEBUG_MAX_BYTES),
            )
            .finish()
    }
}

/// The fields needed to place a packet in a [`crate::jitter::JitterBuffer`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PacketKey {
    pub sequence_number: u16,
    pub ssrc: u32,
}

/// Parses only the sequence number and SSRC.
///
/// Fails in the same ways as [`RawPacket::parse`] on a short buffer or wrong
/// version, but doesn't look at the CSRC count.
#[inline]
pub fn parse_minimal(data: &[u8]) -> Result<PacketKey, Error> {
    check_fixed_header(data)?;
    Ok(PacketKey {
        sequence_number: u16::from_be_bytes([data[2], data[3]]),
        ssrc: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
    })
}

fn check_fixed_header(data: &[u8]) -> Result<(), Error> {
    check_len(data, MIN_HEADER_LEN)?;
    let version = data[0] >> 6;
    if version != 2 {
        return Err(Error::UnsupportedVersion(version));
    }
    Ok(())
}

/// Testing API; exposed for benchmarks and fuzz tests.
#[doc(hidden)]
pub struct RawPacketBuilder {
    pub sequence_number: u16,
    pub timestamp: u32,
    pub payload_type: u8,
    pub ssrc: u32,
    pub mark: bool,
}

impl RawPacketBuilder {
    pub fn build<P: IntoIterator<Item = u8>>(self, payload: P) -> Result<Bytes, &'static str> {
        if self.payload_type >= 0x80 {
            return Err("payload type too large");
        }
        let data: Bytes = [
            2 << 6, // version=2, no padding, no extensions, no CSRCs.
            if self.mark { 0b1000_0000 } else { 0 } | self.payload_type,
        ]
        .into_iter()
        .chain(self.sequence_number.to_be_bytes())
        .chain(self.timestamp.to_be_bytes())
        .chain(self.ssrc.to_be_bytes())
        .chain(payload)
        .collect();
        if data.len() > usize::from(u16::MAX) {
            return Err("payload too long");
        }
        Ok(data)
    }
}
