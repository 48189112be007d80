// Copyright (C) 2023 Niclas Olmenius
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synthesizes the [JPEG](https://www.itu.int/rec/T-REC-T.81-199209-I/en)
//! interchange-format headers which RTP/JPEG leaves off the wire.
//!
//! The tables and marker layout follow the reference code in
//! [RFC 2435](https://www.rfc-editor.org/rfc/rfc2435.txt) Appendix A and B.

use arrayvec::ArrayVec;

use crate::error::try_append;
use crate::Error;

/// Length of the headers written by [`make_headers`] with a restart interval.
///
/// SOI (2) + 2 × DQT (69) + DRI (6) + SOF0 (19) + DHT (33 + 183 + 33 + 183)
/// + SOS (14). Without a restart interval, the headers are 6 bytes shorter.
pub const MAX_HEADER_LEN: usize = 611;

/// Length of one 8-bit quantization table.
pub const QTABLE_LEN: usize = 64;

#[rustfmt::skip]
const ZIGZAG: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10,
    17, 24, 32, 25, 18, 11, 4, 5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13, 6, 7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63
];

/// Table K.1 from ITU-T T.81.
#[rustfmt::skip]
const JPEG_LUMA_QUANTIZER: [i32; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61,
    12, 12, 14, 19, 26, 58, 60, 55,
    14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62,
    18, 22, 37, 56, 68, 109, 103, 77,
    24, 35, 55, 64, 81, 104, 113, 92,
    49, 64, 78, 87, 103, 121, 120, 101,
    72, 92, 95, 98, 112, 100, 103, 99,
];

/// Table K.2 from ITU-T T.81.
#[rustfmt::skip]
const JPEG_CHROMA_QUANTIZER: [i32; 64] = [
    17, 18, 24, 47, 99, 99, 99, 99,
    18, 21, 26, 66, 99, 99, 99, 99,
    24, 26, 56, 99, 99, 99, 99, 99,
    47, 66, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
];

const LUM_DC_CODELENS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
const LUM_DC_SYMBOLS: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];
const LUM_AC_CODELENS: [u8; 16] = [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7d];

#[rustfmt::skip]
const LUM_AC_SYMBOLS: [u8; 162] = [
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12,
    0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07,
    0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08,
    0x23, 0x42, 0xb1, 0xc1, 0x15, 0x52, 0xd1, 0xf0,
    0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16,
    0x17, 0x18, 0x19, 0x1a, 0x25, 0x26, 0x27, 0x28,
    0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39,
    0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49,
    0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59,
    0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69,
    0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79,
    0x7a, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
    0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98,
    0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7,
    0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6,
    0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5,
    0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4,
    0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe1, 0xe2,
    0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea,
    0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa
];

const CHM_DC_CODELENS: [u8; 16] = [0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0];
const CHM_DC_SYMBOLS: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];
const CHM_AC_CODELENS: [u8; 16] = [0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 0x77];

#[rustfmt::skip]
const CHM_AC_SYMBOLS: [u8; 162] = [
    0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21,
    0x31, 0x06, 0x12, 0x41, 0x51, 0x07, 0x61, 0x71,
    0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91,
    0xa1, 0xb1, 0xc1, 0x09, 0x23, 0x33, 0x52, 0xf0,
    0x15, 0x62, 0x72, 0xd1, 0x0a, 0x16, 0x24, 0x34,
    0xe1, 0x25, 0xf1, 0x17, 0x18, 0x19, 0x1a, 0x26,
    0x27, 0x28, 0x29, 0x2a, 0x35, 0x36, 0x37, 0x38,
    0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48,
    0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58,
    0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68,
    0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78,
    0x79, 0x7a, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87,
    0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96,
    0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5,
    0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4,
    0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3,
    0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2,
    0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda,
    0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9,
    0xea, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa
];

/// A pair of 8-bit quantization tables, in the zig-zag order used by the DQT
/// marker and by the RTP/JPEG quantization table header.
#[derive(Clone, PartialEq, Eq)]
pub struct QuantTables {
    pub luma: [u8; QTABLE_LEN],
    pub chroma: [u8; QTABLE_LEN],
}

impl QuantTables {
    /// Derives tables from a quality factor, as RTP/JPEG senders do for
    /// `q` values 1 through 99.
    pub fn from_quality(q: u8) -> Self {
        let factor = i32::from(q).clamp(1, 99);
        let scale = if factor < 50 {
            5000 / factor
        } else {
            200 - factor * 2
        };

        let mut t = QuantTables {
            luma: [0; QTABLE_LEN],
            chroma: [0; QTABLE_LEN],
        };
        for (i, &z) in ZIGZAG.iter().enumerate() {
            let lq = (JPEG_LUMA_QUANTIZER[z] * scale + 50) / 100;
            let cq = (JPEG_CHROMA_QUANTIZER[z] * scale + 50) / 100;

            // Limit the quantizers to 1 <= q <= 255.
            t.luma[i] = lq.clamp(1, 255) as u8;
            t.chroma[i] = cq.clamp(1, 255) as u8;
        }
        t
    }

    /// Takes tables as sent in-band: 64 luma bytes then 64 chroma bytes.
    ///
    /// Only 8-bit precision is supported, so anything but exactly 128 bytes
    /// fails.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.len() != 2 * QTABLE_LEN {
            return Err(Error::NotSupported(
                "quantization tables must be 128 bytes (two 8-bit tables)",
            ));
        }
        let mut t = QuantTables {
            luma: [0; QTABLE_LEN],
            chroma: [0; QTABLE_LEN],
        };
        t.luma.copy_from_slice(&data[..QTABLE_LEN]);
        t.chroma.copy_from_slice(&data[QTABLE_LEN..]);
        Ok(t)
    }
}

impl std::fmt::Debug for QuantTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuantTables")
            .field("luma", &crate::hex::LimitedHex::new(&self.luma, 16))
            .field("chroma", &crate::hex::LimitedHex::new(&self.chroma, 16))
            .finish()
    }
}

fn make_quant_header<const CAP: usize>(
    p: &mut ArrayVec<u8, CAP>,
    qt: &[u8; QTABLE_LEN],
    table_no: u8,
) -> Result<(), Error> {
    try_append(p, &[
        0xff,
        0xdb, // DQT
        0,    // length msb
        QTABLE_LEN as u8 + 3,
        table_no,
    ])?;
    try_append(p, qt)
}

fn make_huffman_header<const CAP: usize>(
    p: &mut ArrayVec<u8, CAP>,
    codelens: &[u8; 16],
    symbols: &[u8],
    table_no: u8,
    table_class: u8,
) -> Result<(), Error> {
    try_append(p, &[
        0xff,
        0xc4, // DHT
        0,    // length msb
        (3 + codelens.len() + symbols.len()) as u8,
        (table_class << 4) | table_no,
    ])?;
    try_append(p, codelens)?;
    try_append(p, symbols)
}

fn make_dri_header<const CAP: usize>(p: &mut ArrayVec<u8, CAP>, dri: u16) -> Result<(), Error> {
    let [msb, lsb] = dri.to_be_bytes();
    try_append(p, &[
        0xff, 0xdd, // DRI
        0, 4, // length
        msb, lsb,
    ])
}

/// Appends JPEG headers for a baseline 3-component frame to `p`.
///
/// `image_type`, `width_blocks`, and `height_blocks` are as in the RTP/JPEG
/// main header; dimensions are in 8-pixel units. `dri` is the restart
/// interval in MCUs, or 0 for none.
///
/// The result is SOI, DQT ×2, optional DRI, SOF0, DHT ×4, SOS. Appending the
/// entropy-coded scan data (and optionally an EOI marker) produces a complete
/// image. Returns the number of bytes written, at most [`MAX_HEADER_LEN`].
/// Fails before writing anything if `p` has less room than that.
pub fn make_headers<const CAP: usize>(
    p: &mut ArrayVec<u8, CAP>,
    image_type: u8,
    width_blocks: u8,
    height_blocks: u8,
    tables: &QuantTables,
    dri: u16,
) -> Result<usize, Error> {
    let start = p.len();
    let len = if dri == 0 {
        MAX_HEADER_LEN - 6
    } else {
        MAX_HEADER_LEN
    };
    if p.remaining_capacity() < len {
        return Err(Error::OutOfCapacity {
            needed: start + len,
            capacity: CAP,
        });
    }
    let [w_msb, w_lsb] = (u16::from(width_blocks) << 3).to_be_bytes();
    let [h_msb, h_lsb] = (u16::from(height_blocks) << 3).to_be_bytes();

    try_append(p, &[0xff, 0xd8])?; // SOI

    make_quant_header(p, &tables.luma, 0)?;
    make_quant_header(p, &tables.chroma, 1)?;

    if dri != 0 {
        make_dri_header(p, dri)?;
    }

    let sampling = if (image_type & 0x3f) == 0 {
        0x21 // hsamp = 2, vsamp = 1
    } else {
        0x22 // hsamp = 2, vsamp = 2
    };
    #[rustfmt::skip]
    let sof: [u8; 19] = [
        0xff, 0xc0, // SOF0
        0, 17,      // length
        8,          // 8-bit precision
        h_msb, h_lsb,
        w_msb, w_lsb,
        3,          // number of components
        0,          // comp 0
        sampling,
        0,          // quant table 0
        1,          // comp 1
        0x11,       // hsamp = 1, vsamp = 1
        1,          // quant table 1
        2,          // comp 2
        0x11,       // hsamp = 1, vsamp = 1
        1,          // quant table 1
    ];
    try_append(p, &sof)?;

    make_huffman_header(p, &LUM_DC_CODELENS, &LUM_DC_SYMBOLS, 0, 0)?;
    make_huffman_header(p, &LUM_AC_CODELENS, &LUM_AC_SYMBOLS, 0, 1)?;
    make_huffman_header(p, &CHM_DC_CODELENS, &CHM_DC_SYMBOLS, 1, 0)?;
    make_huffman_header(p, &CHM_AC_CODELENS, &CHM_AC_SYMBOLS, 1, 1)?;

    #[rustfmt::skip]
    let sos: [u8; 14] = [
        0xff, 0xda, // SOS
        0, 12,      // length
        3,          // 3 components
        0,          // comp 0
        0,          // huffman table 0
        1,          // comp 1
        0x11,       // huffman table 1
        2,          // comp 2
        0x11,       // huffman table 1
        0,          // first DCT coeff
        63,         // last DCT coeff
        0,          // successive approx.
    ];
    try_append(p, &sos)?;

    debug_assert_eq!(p.len() - start, len);
    Ok(len)
}
