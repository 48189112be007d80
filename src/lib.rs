// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RTP/JPEG receiver for small, fixed memory budgets.
//!
//! Reassembles JPEG images sent as RTP
//! ([RFC 3550](https://datatracker.ietf.org/doc/html/rfc3550)) with the
//! [RFC 2435](https://datatracker.ietf.org/doc/html/rfc2435) payload format
//! over an unreliable transport such as UDP. Every buffer is sized at compile
//! time through const generics; nothing on the receive path allocates.
//!
//! The pieces, from the network inward:
//!
//! *   [`rtp`] parses packet headers.
//! *   [`jitter::JitterBuffer`] reorders packets and drops duplicates.
//! *   [`codec::jpeg::Depacketizer`] reassembles fragments into frames.
//! *   [`codec::jfif`] synthesizes the JPEG headers RTP/JPEG leaves out.
//!
//! [`receiver::Receiver`] strings them together for one stream:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use rtpjpeg::receiver::{Receiver, ReceiverOptions};
//!
//! let socket = std::net::UdpSocket::bind("0.0.0.0:5000")?;
//! let mut receiver: Box<Receiver> = Box::new(Receiver::new(ReceiverOptions::default()));
//! let mut buf = [0u8; 1500];
//! loop {
//!     let len = socket.recv(&mut buf)?;
//!     receiver.push(&buf[..len], |frame| {
//!         println!("{}x{} image, {} bytes", frame.width(), frame.height(), frame.data().len());
//!     })?;
//! }
//! # }
//! ```

#![forbid(clippy::print_stderr, clippy::print_stdout)]

pub mod codec;
mod error;
mod hex;
pub mod jitter;
pub mod receiver;
pub mod rtp;

#[cfg(test)]
mod testutil;

pub use error::{Error, ErrorKind};
