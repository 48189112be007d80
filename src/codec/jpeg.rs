// Copyright (C) 2023 Niclas Olmenius
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [JPEG](https://www.itu.int/rec/T-REC-T.81-199209-I/en)-encoded video
//! carried as described in [RFC 2435](https://www.rfc-editor.org/rfc/rfc2435.txt).

use arrayvec::ArrayVec;
use bytes::Buf;
use log::{debug, trace};

use crate::error::{check_len, try_append};
use crate::rtp::RawPacket;
use crate::Error;

use super::jfif::{make_headers, QuantTables, MAX_HEADER_LEN};

/// Default capacity of a frame: synthesized headers plus entropy-coded data.
pub const DEFAULT_MAX_FRAME_LEN: usize = 25 * 1024;

/// Largest width or height representable in the RTP/JPEG main header.
pub const MAX_DIMENSION: u16 = 2040;

/// The RTP/JPEG main header, from
/// [RFC 2435 section 3.1](https://datatracker.ietf.org/doc/html/rfc2435#section-3.1).
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// | Type-specific |              Fragment Offset                  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      Type     |       Q       |     Width     |     Height    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FragmentHeader {
    pub type_specific: u8,

    /// Byte offset of this fragment within the frame's entropy-coded data.
    pub fragment_offset: u32,

    /// The `Type` field; 0 means 4:2:2 and 1 means 4:2:0 sampling.
    pub image_type: u8,
    pub q: u8,

    /// Width in pixels.
    pub width: u16,

    /// Height in pixels.
    pub height: u16,
}

impl FragmentHeader {
    pub const LEN: usize = 8;

    /// Parses the header from an RTP payload, returning it and the rest.
    pub fn parse(payload: &[u8]) -> Result<(Self, &[u8]), Error> {
        check_len(payload, Self::LEN)?;
        let mut p = payload;
        let type_specific = p.get_u8();
        let fragment_offset = p.get_uint(3) as u32;
        let image_type = p.get_u8();
        let q = p.get_u8();
        let width = u16::from(p.get_u8()) * 8;
        let height = u16::from(p.get_u8()) * 8;
        if q == 0 {
            return Err(Error::InvalidArgument("q=0 is reserved"));
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Error::InvalidArgument("image dimensions too large"));
        }
        Ok((
            FragmentHeader {
                type_specific,
                fragment_offset,
                image_type,
                q,
                width,
                height,
            },
            p,
        ))
    }

    /// Returns true if `other` may belong to the same frame as `self`.
    fn same_frame(&self, other: &FragmentHeader) -> bool {
        self.type_specific == other.type_specific
            && self.image_type == other.image_type
            && self.q == other.q
            && self.width == other.width
            && self.height == other.height
    }
}

/// The quantization table header, from
/// [RFC 2435 section 3.1.8](https://datatracker.ietf.org/doc/html/rfc2435#section-3.1.8).
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      MBZ      |   Precision   |             Length            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                    Quantization Table Data                    |
/// |                              ...                              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone)]
pub struct QuantTableHeader<'a> {
    pub mbz: u8,
    pub precision: u8,
    pub data: &'a [u8],
}

impl<'a> QuantTableHeader<'a> {
    pub const LEN: usize = 4;

    /// Parses the header and table data, returning them and the rest.
    pub fn parse(payload: &'a [u8]) -> Result<(Self, &'a [u8]), Error> {
        check_len(payload, Self::LEN)?;
        let mut p = payload;
        let mbz = p.get_u8();
        let precision = p.get_u8();
        let length = usize::from(p.get_u16());
        if length == 0 {
            return Err(Error::InvalidArgument("empty quantization table"));
        }
        check_len(payload, Self::LEN + length)?;
        let (data, rest) = p.split_at(length);
        Ok((
            QuantTableHeader {
                mbz,
                precision,
                data,
            },
            rest,
        ))
    }
}

impl std::fmt::Debug for QuantTableHeader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuantTableHeader")
            .field("mbz", &self.mbz)
            .field("precision", &self.precision)
            .field("length", &self.data.len())
            .finish()
    }
}

/// A complete frame, as handed to the callback of [`Depacketizer::push`].
///
/// Borrows the depacketizer's buffer, which is reused as soon as the callback
/// returns. Copy out anything which must outlive it.
#[derive(Copy, Clone)]
pub struct Frame<'a> {
    width: u16,
    height: u16,
    timestamp: u32,
    data: &'a [u8],
    jfif_header_len: usize,
}

impl<'a> Frame<'a> {
    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// The RTP timestamp of the frame, in 90 kHz units.
    #[inline]
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    /// The whole image: synthesized headers followed by entropy-coded data.
    ///
    /// There's no trailing EOI marker unless the sender included one;
    /// decoders generally tolerate its absence.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub fn jfif_header_len(&self) -> usize {
        self.jfif_header_len
    }

    #[inline]
    pub fn jfif_header(&self) -> &'a [u8] {
        &self.data[..self.jfif_header_len]
    }

    #[inline]
    pub fn entropy_coded(&self) -> &'a [u8] {
        &self.data[self.jfif_header_len..]
    }
}

impl std::fmt::Debug for Frame<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("timestamp", &self.timestamp)
            .field("jfif_header_len", &self.jfif_header_len)
            .field(
                "entropy_coded",
                &crate::hex::LimitedHex::new(self.entropy_coded(), crate::hex::DEBUG_MAX_BYTES),
            )
            .finish()
    }
}

/// State of the frame being assembled, set by its first fragment.
#[derive(Copy, Clone, Debug)]
struct FrameStart {
    header: FragmentHeader,
    timestamp: u32,
}

/// Combines fragmented RTP/JPEG packets of one SSRC into complete images.
///
/// Packets must already be in order and deduplicated, as produced by
/// [`crate::jitter::JitterBuffer`]. A fragment with offset 0 starts a new
/// frame, discarding any incomplete one; later fragments must match its
/// header and continue exactly where the previous fragment ended. When a
/// packet with the marker bit completes a frame, the callback given to
/// [`Depacketizer::push`] receives it.
///
/// Only `Type` 1 (4:2:0) without restart markers is accepted, with
/// quantization tables sent in-band as two 8-bit tables (`Q` 128 to 255).
/// The frame lives in a `CAP`-byte inline buffer which must fit the
/// synthesized headers.
pub struct Depacketizer<const CAP: usize = DEFAULT_MAX_FRAME_LEN> {
    ssrc: u32,
    payload_type: u8,

    /// `None` when idle.
    start: Option<FrameStart>,

    /// The JFIF stream assembled so far.
    data: ArrayVec<u8, CAP>,
    jfif_header_len: usize,
}

impl<const CAP: usize> Depacketizer<CAP> {
    const FITS_HEADERS: () = assert!(
        CAP > MAX_HEADER_LEN,
        "frame capacity must exceed the JFIF header length"
    );

    /// Creates a depacketizer for the given SSRC.
    ///
    /// `payload_type` is the RTP payload type to treat as JPEG; normally
    /// [`crate::rtp::PAYLOAD_TYPE_JPEG`].
    pub fn new(ssrc: u32, payload_type: u8) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::FITS_HEADERS;
        Depacketizer {
            ssrc,
            payload_type,
            start: None,
            data: ArrayVec::new(),
            jfif_header_len: 0,
        }
    }

    #[inline]
    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    /// Returns true if no frame is in progress.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.start.is_none()
    }

    /// Discards any frame in progress.
    pub fn reset(&mut self) {
        self.start = None;
        self.data.clear();
        self.jfif_header_len = 0;
    }

    /// Processes the next packet of the stream.
    ///
    /// Calls `on_frame` (at most once) if this packet completes a frame.
    ///
    /// Packets which are rejected before their fragment is examined (wrong
    /// payload type, unsupported flags, malformed RTP/JPEG header) leave the
    /// frame in progress alone. Once a fragment is examined, any error
    /// discards the frame in progress.
    pub fn push<F>(&mut self, pkt: &RawPacket<'_>, on_frame: F) -> Result<(), Error>
    where
        F: FnOnce(Frame<'_>),
    {
        trace!("push {:?}", pkt);
        if pkt.has_padding() || pkt.has_extension() || pkt.csrc_count() != 0 {
            return Err(Error::NotSupported(
                "RTP padding, header extensions, and CSRCs",
            ));
        }
        if pkt.payload_type() != self.payload_type {
            return Err(Error::NotSupported("payload type other than JPEG"));
        }
        if pkt.ssrc() != self.ssrc {
            return Err(Error::InvalidArgument("packet is for another SSRC"));
        }

        let (hdr, payload) = FragmentHeader::parse(pkt.payload())?;
        if hdr.image_type != 1 || hdr.type_specific != 0 || hdr.q < 128 {
            return Err(Error::NotSupported(
                "only type 1, type-specific 0, and in-band quantization tables",
            ));
        }
        trace!("fragment {:?}", &hdr);

        let r = if hdr.fragment_offset == 0 {
            self.start_frame(hdr, pkt.timestamp(), payload)
        } else {
            self.continue_frame(&hdr, payload)
        };
        if let Err(e) = r {
            debug!(
                "discarding frame at seq={:04x} offset={}: {}",
                pkt.sequence_number(),
                hdr.fragment_offset,
                e
            );
            self.reset();
            return Err(e);
        }

        if !pkt.mark() {
            return Ok(());
        }
        let r = self.finish_frame(on_frame);
        self.reset();
        r
    }

    fn start_frame(
        &mut self,
        hdr: FragmentHeader,
        timestamp: u32,
        payload: &[u8],
    ) -> Result<(), Error> {
        self.reset();
        self.start = Some(FrameStart {
            header: hdr,
            timestamp,
        });

        let (qt, rest) = QuantTableHeader::parse(payload)?;
        trace!("quantization tables {:?}", &qt);
        if (qt.precision & 0b11) != 0 {
            return Err(Error::NotSupported("16-bit quantization tables"));
        }
        let tables = QuantTables::from_bytes(qt.data)?;
        self.jfif_header_len = make_headers(
            &mut self.data,
            hdr.image_type,
            (hdr.width >> 3) as u8,
            (hdr.height >> 3) as u8,
            &tables,
            0,
        )?;
        try_append(&mut self.data, rest)
    }

    fn continue_frame(&mut self, hdr: &FragmentHeader, payload: &[u8]) -> Result<(), Error> {
        let start = self
            .start
            .as_ref()
            .ok_or(Error::InvalidState("no frame in progress"))?;
        if !start.header.same_frame(hdr) {
            return Err(Error::InvalidState(
                "fragment header doesn't match the frame's first fragment",
            ));
        }
        let have = self.data.len() - self.jfif_header_len;
        if usize::try_from(hdr.fragment_offset) != Ok(have) {
            return Err(Error::InvalidState("fragment offset doesn't follow previous fragment"));
        }
        try_append(&mut self.data, payload)
    }

    fn finish_frame<F>(&self, on_frame: F) -> Result<(), Error>
    where
        F: FnOnce(Frame<'_>),
    {
        let start = self
            .start
            .as_ref()
            .ok_or(Error::InvalidState("no frame in progress"))?;
        if self.data.len() <= self.jfif_header_len {
            return Err(Error::InvalidState("frame has no entropy-coded data"));
        }
        let frame = Frame {
            width: start.header.width,
            height: start.header.height,
            timestamp: start.timestamp,
            data: self.data.as_slice(),
            jfif_header_len: self.jfif_header_len,
        };
        debug!(
            "frame {}x{} ts={} len={}",
            frame.width,
            frame.height,
            frame.timestamp,
            frame.data.len()
        );
        on_frame(frame);
        Ok(())
    }
}

impl<const CAP: usize> std::fmt::Debug for Depacketizer<CAP> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Depacketizer")
            .field("ssrc", &format_args!("{:08x}", self.ssrc))
            .field("payload_type", &self.payload_type)
            .field("start", &self.start)
            .field("len", &self.data.len())
            .field("jfif_header_len", &self.jfif_header_len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtp::PAYLOAD_TYPE_JPEG;
    use crate::testutil::{init_logging, Fragment, SSRC};
    use crate::ErrorKind;

    const HEADER_LEN: usize = MAX_HEADER_LEN - 6;

    /// Pushes `data` and returns the frames emitted, as owned copies.
    fn push<const CAP: usize>(
        d: &mut Depacketizer<CAP>,
        data: &[u8],
    ) -> Result<Vec<(u16, u16, u32, Vec<u8>, usize)>, Error> {
        let pkt = RawPacket::parse(data).unwrap();
        let mut frames = Vec::new();
        d.push(&pkt, |f| {
            frames.push((
                f.width(),
                f.height(),
                f.timestamp(),
                f.data().to_vec(),
                f.jfif_header_len(),
            ))
        })?;
        Ok(frames)
    }

    fn payload(len: usize, seed: u8) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_add(seed)).collect()
    }

    #[test]
    fn complete_frame() {
        init_logging();
        let mut d = Depacketizer::<DEFAULT_MAX_FRAME_LEN>::new(SSRC, PAYLOAD_TYPE_JPEG);
        let p0 = payload(700, 0);
        let p1 = payload(300, 1);
        let f0 = Fragment {
            seq: 1,
            timestamp: 90_000,
            ..Fragment::first()
        }
        .build(&p0);
        let f1 = Fragment {
            seq: 2,
            timestamp: 90_000,
            offset: 700,
            mark: true,
            ..Fragment::default()
        }
        .build(&p1);

        assert!(push(&mut d, &f0).unwrap().is_empty());
        assert!(!d.is_idle());
        let frames = push(&mut d, &f1).unwrap();
        assert_eq!(frames.len(), 1);
        let (width, height, timestamp, data, header_len) = &frames[0];
        assert_eq!((*width, *height, *timestamp), (160, 120, 90_000));
        assert_eq!(*header_len, HEADER_LEN);
        assert_eq!(data.len(), HEADER_LEN + 700 + 300);
        assert_eq!(&data[..2], &[0xff, 0xd8]);
        assert_eq!(&data[HEADER_LEN - 14..HEADER_LEN - 12], &[0xff, 0xda]);
        assert_eq!(&data[HEADER_LEN..HEADER_LEN + 700], &p0[..]);
        assert_eq!(&data[HEADER_LEN + 700..], &p1[..]);
        assert!(d.is_idle());
    }

    #[test]
    fn single_packet_frame() {
        let mut d = Depacketizer::<2048>::new(SSRC, PAYLOAD_TYPE_JPEG);
        let f = Fragment {
            mark: true,
            ..Fragment::first()
        }
        .build(b"scan");
        let frames = push(&mut d, &f).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0].3[HEADER_LEN..], b"scan");
    }

    #[test]
    fn fragment_gap() {
        let mut d = Depacketizer::<DEFAULT_MAX_FRAME_LEN>::new(SSRC, PAYLOAD_TYPE_JPEG);
        push(&mut d, &Fragment::first().build(&payload(500, 0))).unwrap();
        push(
            &mut d,
            &Fragment {
                offset: 500,
                ..Fragment::default()
            }
            .build(&payload(600, 0)),
        )
        .unwrap();
        let e = push(
            &mut d,
            &Fragment {
                offset: 1200,
                mark: true,
                ..Fragment::default()
            }
            .build(&payload(10, 0)),
        )
        .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidState);
        assert!(d.is_idle());

        // The fragment which would have been next doesn't revive the frame.
        let e = push(
            &mut d,
            &Fragment {
                offset: 1100,
                mark: true,
                ..Fragment::default()
            }
            .build(&payload(10, 0)),
        )
        .unwrap_err();
        assert_eq!(e, Error::InvalidState("no frame in progress"));
        assert!(d.is_idle());
    }

    #[test]
    fn overflow() {
        let mut d = Depacketizer::<1024>::new(SSRC, PAYLOAD_TYPE_JPEG);
        push(&mut d, &Fragment::first().build(&payload(300, 0))).unwrap();
        let e = push(
            &mut d,
            &Fragment {
                offset: 300,
                mark: true,
                ..Fragment::default()
            }
            .build(&payload(200, 0)),
        )
        .unwrap_err();
        assert_eq!(
            e,
            Error::OutOfCapacity {
                needed: HEADER_LEN + 500,
                capacity: 1024
            }
        );
        assert!(d.is_idle());

        // The first fragment alone can overflow too.
        let e = push(&mut d, &Fragment::first().build(&payload(500, 0))).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::OutOfCapacity);
        assert!(d.is_idle());
    }

    #[test]
    fn header_mismatch() {
        let mut d = Depacketizer::<DEFAULT_MAX_FRAME_LEN>::new(SSRC, PAYLOAD_TYPE_JPEG);
        for bad in [
            Fragment {
                q: 254,
                ..Fragment::default()
            },
            Fragment {
                width_blocks: 21,
                ..Fragment::default()
            },
            Fragment {
                height_blocks: 14,
                ..Fragment::default()
            },
        ] {
            push(&mut d, &Fragment::first().build(&payload(10, 0))).unwrap();
            let e = push(
                &mut d,
                &Fragment {
                    offset: 10,
                    mark: true,
                    ..bad
                }
                .build(&payload(10, 0)),
            )
            .unwrap_err();
            assert_eq!(e.kind(), ErrorKind::InvalidState);
            assert!(d.is_idle());
        }
    }

    #[test]
    fn new_frame_discards_incomplete() {
        let mut d = Depacketizer::<DEFAULT_MAX_FRAME_LEN>::new(SSRC, PAYLOAD_TYPE_JPEG);
        push(
            &mut d,
            &Fragment {
                timestamp: 1,
                ..Fragment::first()
            }
            .build(b"old frame"),
        )
        .unwrap();
        let frames = push(
            &mut d,
            &Fragment {
                timestamp: 2,
                mark: true,
                ..Fragment::first()
            }
            .build(b"new"),
        )
        .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].2, 2);
        assert_eq!(&frames[0].3[HEADER_LEN..], b"new");
    }

    #[test]
    fn empty_frame() {
        let mut d = Depacketizer::<DEFAULT_MAX_FRAME_LEN>::new(SSRC, PAYLOAD_TYPE_JPEG);
        let e = push(
            &mut d,
            &Fragment {
                mark: true,
                ..Fragment::first()
            }
            .build(b""),
        )
        .unwrap_err();
        assert_eq!(e, Error::InvalidState("frame has no entropy-coded data"));
        assert!(d.is_idle());
    }

    #[test]
    fn unsupported() {
        let mut d = Depacketizer::<DEFAULT_MAX_FRAME_LEN>::new(SSRC, PAYLOAD_TYPE_JPEG);
        push(&mut d, &Fragment::first().build(b"in progress")).unwrap();

        let cases = [
            (
                Fragment {
                    q: 80,
                    ..Fragment::first()
                },
                ErrorKind::NotSupported,
            ),
            (
                Fragment {
                    image_type: 0,
                    ..Fragment::first()
                },
                ErrorKind::NotSupported,
            ),
            (
                Fragment {
                    type_specific: 1,
                    ..Fragment::first()
                },
                ErrorKind::NotSupported,
            ),
            (
                Fragment {
                    payload_type: 96,
                    ..Fragment::first()
                },
                ErrorKind::NotSupported,
            ),
            (
                Fragment {
                    ssrc: SSRC + 1,
                    ..Fragment::first()
                },
                ErrorKind::InvalidArgument,
            ),
            (
                Fragment {
                    q: 0,
                    ..Fragment::first()
                },
                ErrorKind::InvalidArgument,
            ),
        ];
        for (f, kind) in cases {
            assert_eq!(push(&mut d, &f.build(b"x")).unwrap_err().kind(), kind);
        }

        let mut padded = Fragment::first().build(b"x").to_vec();
        padded[0] |= 0b0010_0000;
        assert_eq!(
            push(&mut d, &padded).unwrap_err().kind(),
            ErrorKind::NotSupported
        );

        // None of those disturbed the frame in progress.
        assert!(!d.is_idle());
        let frames = push(
            &mut d,
            &Fragment {
                offset: 11,
                mark: true,
                ..Fragment::default()
            }
            .build(b"!"),
        )
        .unwrap();
        assert_eq!(&frames[0].3[HEADER_LEN..], b"in progress!");
    }

    #[test]
    fn bad_quant_tables() {
        let mut d = Depacketizer::<DEFAULT_MAX_FRAME_LEN>::new(SSRC, PAYLOAD_TYPE_JPEG);
        let tables = [7u8; 128];

        let e = push(
            &mut d,
            &Fragment {
                qtable_precision: 1,
                ..Fragment::first()
            }
            .build(b"x"),
        )
        .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::NotSupported);
        assert!(d.is_idle());

        let e = push(
            &mut d,
            &Fragment {
                qtable: Some(&tables[..64]),
                ..Fragment::first()
            }
            .build(b"x"),
        )
        .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::NotSupported);

        let e = push(
            &mut d,
            &Fragment {
                qtable: Some(&[]),
                ..Fragment::first()
            }
            .build(b"x"),
        )
        .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);

        // No quantization table header at all.
        let e = push(
            &mut d,
            &Fragment {
                qtable: None,
                ..Fragment::first()
            }
            .build(b"xy"),
        )
        .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::TooShort);
        assert!(d.is_idle());
    }

    #[test]
    fn parse_headers() {
        let (hdr, rest) =
            FragmentHeader::parse(&[0, 0x01, 0x02, 0x03, 1, 255, 255, 1, 0xaa]).unwrap();
        assert_eq!(
            hdr,
            FragmentHeader {
                type_specific: 0,
                fragment_offset: 0x010203,
                image_type: 1,
                q: 255,
                width: MAX_DIMENSION,
                height: 8,
            }
        );
        assert_eq!(rest, &[0xaa]);
        assert_eq!(
            FragmentHeader::parse(&[0; 7]).unwrap_err(),
            Error::TooShort { needed: 8, len: 7 }
        );

        let (qt, rest) = QuantTableHeader::parse(&[0, 0, 0, 2, 9, 9, 1]).unwrap();
        assert_eq!(qt.data, &[9, 9]);
        assert_eq!(rest, &[1]);
        assert_eq!(
            QuantTableHeader::parse(&[0, 0, 0, 3, 9, 9]).unwrap_err(),
            Error::TooShort { needed: 7, len: 6 }
        );
    }
}
