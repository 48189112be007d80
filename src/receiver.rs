// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-stream receive pipeline: datagrams in, JPEG images out.

use log::{debug, info};

use crate::codec::jpeg::{Depacketizer, Frame, DEFAULT_MAX_FRAME_LEN};
use crate::jitter::{JitterBuffer, JitterStats, DEFAULT_CAPACITY_PACKETS, DEFAULT_MTU};
use crate::rtp::{parse_minimal, RawPacket, PAYLOAD_TYPE_JPEG};
use crate::Error;

/// Options which must be known before the first datagram arrives.
#[derive(Clone, Debug)]
pub struct ReceiverOptions {
    ssrc: Option<u32>,
    payload_type: u8,
}

impl Default for ReceiverOptions {
    fn default() -> Self {
        ReceiverOptions {
            ssrc: None,
            payload_type: PAYLOAD_TYPE_JPEG,
        }
    }
}

impl ReceiverOptions {
    /// Locks onto the given SSRC.
    ///
    /// If `None` (the default), locks onto the SSRC of the first datagram
    /// that parses as RTP.
    pub fn ssrc(self, ssrc: Option<u32>) -> Self {
        Self { ssrc, ..self }
    }

    /// Sets the RTP payload type which carries JPEG.
    ///
    /// Defaults to the static assignment, 26. Senders which negotiate a
    /// dynamic payload type via SDP need this.
    pub fn payload_type(self, payload_type: u8) -> Self {
        Self {
            payload_type,
            ..self
        }
    }
}

/// Counters since the last [`Receiver::reset`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub jitter: JitterStats,

    /// Complete frames handed to the caller.
    pub frames: u64,

    /// Released packets which failed to parse or depacketize.
    pub frame_errors: u64,
}

struct Session<const N: usize, const MTU: usize, const CAP: usize> {
    jitter: JitterBuffer<N, MTU>,
    depacketizer: Depacketizer<CAP>,
}

/// Receives one RTP/JPEG stream.
///
/// Feed every datagram from the socket to [`Receiver::push`]. It reorders
/// them through a [`JitterBuffer`] of `N` packets of at most `MTU` bytes, then
/// assembles images of at most `CAP` bytes with a [`Depacketizer`].
///
/// All storage is inline, so a `Receiver` with the default capacities takes
/// over 50 KiB. Box it rather than keeping it on a small stack.
pub struct Receiver<
    const N: usize = DEFAULT_CAPACITY_PACKETS,
    const MTU: usize = DEFAULT_MTU,
    const CAP: usize = DEFAULT_MAX_FRAME_LEN,
> {
    options: ReceiverOptions,

    /// Set when the first datagram arrives.
    session: Option<Session<N, MTU, CAP>>,
    frames: u64,
    frame_errors: u64,
}

impl<const N: usize, const MTU: usize, const CAP: usize> Receiver<N, MTU, CAP> {
    pub fn new(options: ReceiverOptions) -> Self {
        Receiver {
            options,
            session: None,
            frames: 0,
            frame_errors: 0,
        }
    }

    /// Returns the SSRC this receiver has locked onto, if any.
    pub fn ssrc(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.jitter.ssrc())
    }

    pub fn stats(&self) -> ReceiverStats {
        ReceiverStats {
            jitter: self
                .session
                .as_ref()
                .map(|s| *s.jitter.stats())
                .unwrap_or_default(),
            frames: self.frames,
            frame_errors: self.frame_errors,
        }
    }

    /// Discards all buffered packets and any partial frame.
    ///
    /// Unless [`ReceiverOptions::ssrc`] was set, the next datagram chooses
    /// the SSRC anew.
    pub fn reset(&mut self) {
        if let Some(s) = self.session.take() {
            info!(
                "tearing down ssrc={:08x} after {} frames",
                s.jitter.ssrc(),
                self.frames
            );
        }
        self.frames = 0;
        self.frame_errors = 0;
    }

    /// Processes one datagram, calling `on_frame` for each image it completes.
    ///
    /// Returns an error only if the datagram can't be buffered at all. Errors
    /// from packets released by the jitter buffer (unsupported features,
    /// fragment gaps, overflows) drop the frame they belong to; they're
    /// logged and counted in [`Receiver::stats`].
    pub fn push<F>(&mut self, datagram: &[u8], mut on_frame: F) -> Result<(), Error>
    where
        F: FnMut(Frame<'_>),
    {
        let session = match self.session {
            Some(ref mut s) => s,
            None => {
                let ssrc = match self.options.ssrc {
                    Some(s) => s,
                    None => parse_minimal(datagram)?.ssrc,
                };
                info!(
                    "locking onto ssrc={:08x}, payload type {}",
                    ssrc, self.options.payload_type
                );
                self.session.insert(Session {
                    jitter: JitterBuffer::new(ssrc),
                    depacketizer: Depacketizer::new(ssrc, self.options.payload_type),
                })
            }
        };
        session.jitter.feed(datagram)?;

        let Session {
            jitter,
            depacketizer,
        } = session;
        let mut frames = 0;
        let mut frame_errors = 0;
        while let Some(data) = jitter.retrieve() {
            let pkt = match RawPacket::parse(data) {
                Ok(p) => p,
                Err(e) => {
                    debug!("dropping unparseable packet: {}", e);
                    frame_errors += 1;
                    continue;
                }
            };
            let r = depacketizer.push(&pkt, |f| {
                frames += 1;
                on_frame(f);
            });
            if let Err(e) = r {
                debug!("seq={:04x}: {}", pkt.sequence_number(), e);
                frame_errors += 1;
            }
        }
        self.frames += frames;
        self.frame_errors += frame_errors;
        Ok(())
    }
}

impl<const N: usize, const MTU: usize, const CAP: usize> std::fmt::Debug for Receiver<N, MTU, CAP> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Receiver");
        s.field("options", &self.options);
        if let Some(session) = &self.session {
            s.field("jitter", &session.jitter)
                .field("depacketizer", &session.depacketizer);
        }
        s.field("frames", &self.frames)
            .field("frame_errors", &self.frame_errors)
            .finish()
    }
}
