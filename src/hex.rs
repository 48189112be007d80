// Copyright (C) 2022 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded hex dumps for `Debug` output of packet payloads.

use pretty_hex::{HexConfig, PrettyHex};

/// Number of payload bytes shown by the `Debug` impls in this crate.
pub(crate) const DEBUG_MAX_BYTES: usize = 64;

/// Formats at most `max_bytes` of `inner` as a hex dump, noting how much was cut.
pub(crate) struct LimitedHex<'a> {
    inner: &'a [u8],
    max_bytes: usize,
}

impl<'a> LimitedHex<'a> {
    pub(crate) fn new(inner: &'a [u8], max_bytes: usize) -> Self {
        Self { inner, max_bytes }
    }
}

impl std::fmt::Debug for LimitedHex<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown = &self.inner[..self.inner.len().min(self.max_bytes)];
        let cfg = HexConfig {
            title: false,
            ..HexConfig::default()
        };
        write!(f, "[{} bytes] {:?}", self.inner.len(), shown.hex_conf(cfg))?;
        if shown.len() < self.inner.len() {
            write!(f, " ...+{} bytes", self.inner.len() - shown.len())?;
        }
        Ok(())
    }
}
