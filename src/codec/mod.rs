// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Codec-specific logic.
//!
//! Currently this consists of RTP depacketization for JPEG video
//! ([`jpeg`]) and the synthesis of the JFIF headers RTP/JPEG omits
//! ([`jfif`]).

pub mod jfif;
pub mod jpeg;

pub use jpeg::{Depacketizer, Frame};
