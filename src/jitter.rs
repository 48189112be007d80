// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reorders and deduplicates RTP packets of a single SSRC.

use arrayvec::ArrayVec;
use log::{debug, trace};

use crate::error::try_append;
use crate::rtp::parse_minimal;
use crate::Error;

/// Default number of packets a [`JitterBuffer`] holds.
pub const DEFAULT_CAPACITY_PACKETS: usize = 20;

/// Default maximum size of one buffered datagram, in bytes.
pub const DEFAULT_MTU: usize = 1400;

/// How far behind the last released packet a packet may arrive and still be
/// considered late rather than the start of a new sequence, as in
/// [RFC 3550 appendix A.1](https://datatracker.ietf.org/doc/html/rfc3550#appendix-A.1).
/// Never less than the buffer's capacity.
pub const MAX_MISORDER: u16 = 100;

/// Returns how far `to` is ahead of `from` in 16-bit sequence space.
///
/// Positive if `to` is newer, negative if older, as in
/// [serial number arithmetic](https://en.wikipedia.org/wiki/Serial_number_arithmetic).
#[inline]
pub(crate) fn seq_delta(from: u16, to: u16) -> i16 {
    to.wrapping_sub(from) as i16
}

/// Counts of the (non-error) drop decisions a [`JitterBuffer`] has made.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct JitterStats {
    /// Packets dropped because the same sequence number was already buffered.
    pub duplicates: u64,

    /// Packets dropped because they were too old to be placed or were no
    /// newer than the last released packet.
    pub too_late: u64,

    /// Buffered packets overwritten before release by newer packets, or
    /// discarded when the sequence restarted.
    pub evicted: u64,

    /// Times the sender's sequence jumped backwards by more than
    /// [`MAX_MISORDER`] and the buffer started over.
    pub restarts: u64,

    /// Packets released ahead of a gap because the buffer was full or a
    /// packet had waited `N` feeds.
    pub forced: u64,

    /// Packets ignored because their SSRC didn't match.
    pub ignored_ssrc: u64,

    /// Packets released in total.
    pub released: u64,
}

/// A fixed-size jitter buffer which reorders RTP packets and drops duplicates.
///
/// Holds up to `N` packets of at most `MTU` bytes each, spaced by sequence
/// number: the slot at `top` holds the newest packet (`max_seq`) and the slot
/// `k` positions before it holds `max_seq - k`, if it's been received.
/// [`JitterBuffer::retrieve`] waits for a missing packet until the buffer is
/// full or some buffered packet has been held across `N` feeds, then skips it.
/// So every packet leaves within `N` feeds of arriving.
///
/// A packet which arrives no later than the last released one is dropped, so
/// nothing is released twice. If it's more than [`MAX_MISORDER`] behind, the
/// sender is assumed to have restarted its sequence: buffered packets are
/// discarded and the new packet is accepted as the first.
///
/// Packets for SSRCs other than the one given at construction are ignored.
/// All storage is inline; consider boxing the buffer if `N * MTU` is large.
///
/// After each [`JitterBuffer::feed`], call [`JitterBuffer::retrieve`] until it
/// returns `None`: a single packet may unblock several.
pub struct JitterBuffer<const N: usize = DEFAULT_CAPACITY_PACKETS, const MTU: usize = DEFAULT_MTU>
{
    ssrc: u32,

    /// Packet storage; an empty slot is free.
    slots: [ArrayVec<u8, MTU>; N],

    /// Sequence number of each occupied slot.
    seqs: [u16; N],

    /// Value of `feeds` when each occupied slot was filled.
    stored_at: [u64; N],

    /// Packets of this SSRC fed so far.
    feeds: u64,

    /// Slot returned by the last `retrieve`, freed on the next call.
    lent: Option<usize>,

    /// Slot holding the newest packet, or `None` if the buffer is empty.
    top: Option<usize>,

    /// Newest sequence number in the buffer; meaningful only if `top` is set.
    max_seq: u16,

    /// Sequence number of the last packet handed out by `retrieve`.
    max_seq_out: Option<u16>,

    stats: JitterStats,
}

impl<const N: usize, const MTU: usize> JitterBuffer<N, MTU> {
    const VALID_CAPACITY: () = assert!(
        N > 0 && N < (i16::MAX as usize),
        "jitter buffer capacity must be in 1..i16::MAX"
    );

    const MISORDER: i32 = if N > MAX_MISORDER as usize {
        N as i32
    } else {
        MAX_MISORDER as i32
    };

    pub fn new(ssrc: u32) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_CAPACITY;
        JitterBuffer {
            ssrc,
            slots: std::array::from_fn(|_| ArrayVec::new()),
            seqs: [0; N],
            stored_at: [0; N],
            feeds: 0,
            lent: None,
            top: None,
            max_seq: 0,
            max_seq_out: None,
            stats: JitterStats::default(),
        }
    }

    #[inline]
    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    #[inline]
    pub fn stats(&self) -> &JitterStats {
        &self.stats
    }

    /// Returns the number of buffered packets.
    pub fn len(&self) -> usize {
        (0..N).filter(|&pos| self.occupied(pos)).count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    #[inline]
    fn occupied(&self, pos: usize) -> bool {
        !self.slots[pos].is_empty() && self.lent != Some(pos)
    }

    /// Frees the slot lent out by the previous `retrieve`.
    fn reclaim(&mut self) {
        if let Some(pos) = self.lent.take() {
            self.slots[pos].clear();
        }
    }

    fn store(&mut self, pos: usize, seq: u16, data: &[u8]) -> Result<(), Error> {
        debug_assert!(self.slots[pos].is_empty());
        try_append(&mut self.slots[pos], data)?;
        self.seqs[pos] = seq;
        self.stored_at[pos] = self.feeds;
        Ok(())
    }

    /// Returns true if some buffered packet has been held across `N` feeds.
    fn has_stale(&self) -> bool {
        (0..N).any(|pos| {
            self.occupied(pos) && self.feeds.wrapping_sub(self.stored_at[pos]) >= N as u64
        })
    }

    /// Discards everything buffered and forgets what was released.
    fn restart(&mut self) {
        for pos in 0..N {
            if !self.slots[pos].is_empty() {
                self.slots[pos].clear();
                self.stats.evicted += 1;
            }
        }
        self.top = None;
        self.max_seq = 0;
        self.max_seq_out = None;
        self.stats.restarts += 1;
    }

    /// Adds a packet received from the network.
    ///
    /// Returns an error only if `data` isn't a usable RTP packet. Duplicates,
    /// late packets, and packets for other SSRCs are silently dropped and
    /// counted in [`JitterBuffer::stats`].
    pub fn feed(&mut self, data: &[u8]) -> Result<(), Error> {
        self.reclaim();
        let key = parse_minimal(data)?;
        if key.ssrc != self.ssrc {
            trace!(
                "ignoring packet seq={:04x} with ssrc={:08x}, want {:08x}",
                key.sequence_number,
                key.ssrc,
                self.ssrc
            );
            self.stats.ignored_ssrc += 1;
            return Ok(());
        }
        if data.len() > MTU {
            return Err(Error::OutOfCapacity {
                needed: data.len(),
                capacity: MTU,
            });
        }
        let seq = key.sequence_number;
        self.feeds = self.feeds.wrapping_add(1);

        if let Some(out) = self.max_seq_out {
            let behind = -i32::from(seq_delta(out, seq));
            if (0..Self::MISORDER).contains(&behind) {
                debug!(
                    "dropping seq={:04x}; already released through {:04x}",
                    seq, out
                );
                self.stats.too_late += 1;
                return Ok(());
            }
            if behind >= Self::MISORDER {
                debug!(
                    "seq={:04x} is {} behind released {:04x}; restarting",
                    seq, behind, out
                );
                self.restart();
            }
        }

        let top = match self.top {
            None => {
                trace!("empty; placing seq={:04x} at start", seq);
                self.max_seq = seq;
                self.top = Some(0);
                return self.store(0, seq, data);
            }
            Some(t) => t,
        };

        let advance = i32::from(seq_delta(self.max_seq, seq));
        if advance == 0 {
            trace!("dropping duplicate of newest seq={:04x}", seq);
            self.stats.duplicates += 1;
            return Ok(());
        }

        if advance > 0 {
            // Every slot passed over belongs to a sequence number at least N
            // behind the new one; free it. No need to go around more than once.
            let steps = advance.unsigned_abs() as usize;
            for i in 1..=steps.min(N) {
                let pos = (top + i) % N;
                if self.occupied(pos) {
                    debug!(
                        "evicting seq={:04x} from slot {} for seq={:04x}",
                        self.seqs[pos], pos, seq
                    );
                    self.slots[pos].clear();
                    self.stats.evicted += 1;
                }
            }
            let new_top = (top + steps) % N;
            trace!("advancing {} to slot {} for seq={:04x}", advance, new_top, seq);
            self.top = Some(new_top);
            self.max_seq = seq;
            return self.store(new_top, seq, data);
        }

        if -advance >= N as i32 {
            debug!(
                "dropping seq={:04x}: {} behind newest {:04x}",
                seq, -advance, self.max_seq
            );
            self.stats.too_late += 1;
            return Ok(());
        }

        let pos = (top as i32 + advance).rem_euclid(N as i32) as usize;
        if self.occupied(pos) {
            trace!("dropping older duplicate seq={:04x}", seq);
            self.stats.duplicates += 1;
            return Ok(());
        }
        trace!("placing older seq={:04x} at slot {}", seq, pos);
        self.store(pos, seq, data)
    }

    /// Finds the occupied slot with the lowest sequence number.
    fn oldest(&self) -> Option<usize> {
        let top = self.top?;
        (1..=N).map(|i| (top + i) % N).find(|&pos| self.occupied(pos))
    }

    /// Releases the next packet in sequence, if one is ready.
    ///
    /// The packet is ready if it directly follows the last released packet
    /// (or nothing has been released yet). Otherwise it's released anyway if
    /// the buffer is full, so the missing packets in between can never be
    /// placed, or if any buffered packet has waited `N` feeds.
    ///
    /// The returned slice is the packet's raw bytes. Its slot is free again
    /// once the borrow ends.
    pub fn retrieve(&mut self) -> Option<&[u8]> {
        self.reclaim();
        let top = self.top?;
        let pos = self.oldest()?;
        let seq = self.seqs[pos];
        let in_sequence = match self.max_seq_out {
            None => true,
            Some(out) => seq == out.wrapping_add(1),
        };
        if !in_sequence {
            // The slot just before `pos` is `top` only if every slot between
            // the oldest and the newest packet is spoken for.
            let full = (pos + N - 1) % N == top;
            if !full && !self.has_stale() {
                trace!(
                    "waiting for seq={:04x?} before releasing seq={:04x}",
                    self.max_seq_out.map(|s| s.wrapping_add(1)),
                    seq
                );
                return None;
            }
            debug!(
                "{}; releasing seq={:04x} after gap from {:04x?}",
                if full { "buffer full" } else { "waited too long" },
                seq,
                self.max_seq_out
            );
            self.stats.forced += 1;
        }

        self.lent = Some(pos);
        self.max_seq_out = Some(seq);
        self.stats.released += 1;
        if seq == self.max_seq {
            debug_assert_eq!(self.len(), 0);
            trace!("released newest seq={:04x}; now empty", seq);
            self.top = None;
            self.max_seq = 0;
        }
        Some(self.slots[pos].as_slice())
    }
}

impl<const N: usize, const MTU: usize> std::fmt::Debug for JitterBuffer<N, MTU> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        struct Slots<'a, const N: usize, const MTU: usize>(&'a JitterBuffer<N, MTU>);
        impl<const N: usize, const MTU: usize> std::fmt::Debug for Slots<'_, N, MTU> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_list()
                    .entries((0..N).map(|pos| self.0.occupied(pos).then_some(self.0.seqs[pos])))
                    .finish()
            }
        }
        f.debug_struct("JitterBuffer")
            .field("ssrc", &format_args!("{:08x}", self.ssrc))
            .field("top", &self.top)
            .field("max_seq", &self.max_seq)
            .field("max_seq_out", &self.max_seq_out)
            .field("slots", &Slots(self))
            .field("stats", &self.stats)
            .finish()
    }
}
