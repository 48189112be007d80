// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use arrayvec::ArrayVec;
use thiserror::Error;

/// An error from parsing, buffering, or depacketizing.
///
/// Every variant carries only `Copy` context, so producing an error never
/// allocates. None of these are fatal: the caller is expected to log and move
/// on to the next datagram. Jitter buffer drops (duplicates, late packets,
/// evictions) are normal operation and are *not* reported as errors; see
/// [`crate::jitter::JitterStats`] instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The buffer is smaller than a fixed-size header requires.
    #[error("Too short: need {needed} bytes, have {len}")]
    TooShort { needed: usize, len: usize },

    /// The RTP version field isn't 2.
    #[error("Unsupported RTP version {0}")]
    UnsupportedVersion(u8),

    /// A semantically invalid field value, such as `q=0` or the wrong SSRC.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The packet doesn't fit the frame in progress.
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    /// A well-formed but unhandled variant.
    #[error("Not supported: {0}")]
    NotSupported(&'static str),

    /// A fixed-capacity buffer would overflow.
    #[error("Out of capacity: need {needed} bytes, capacity is {capacity}")]
    OutOfCapacity { needed: usize, capacity: usize },
}

/// The category of an [`Error`], for matching without caring about context.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TooShort,
    UnsupportedVersion,
    InvalidArgument,
    InvalidState,
    NotSupported,
    OutOfCapacity,
}

impl Error {
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TooShort { .. } => ErrorKind::TooShort,
            Error::UnsupportedVersion(_) => ErrorKind::UnsupportedVersion,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::InvalidState(_) => ErrorKind::InvalidState,
            Error::NotSupported(_) => ErrorKind::NotSupported,
            Error::OutOfCapacity { .. } => ErrorKind::OutOfCapacity,
        }
    }
}

/// Returns `Err(Error::TooShort)` unless `data` holds at least `needed` bytes.
#[inline]
pub(crate) fn check_len(data: &[u8], needed: usize) -> Result<(), Error> {
    if data.len() < needed {
        return Err(Error::TooShort {
            needed,
            len: data.len(),
        });
    }
    Ok(())
}

/// Appends all of `src` to `buf`, or nothing if it doesn't fit.
#[inline]
pub(crate) fn try_append<const CAP: usize>(
    buf: &mut ArrayVec<u8, CAP>,
    src: &[u8],
) -> Result<(), Error> {
    let needed = buf.len().saturating_add(src.len());
    buf.try_extend_from_slice(src)
        .map_err(|_| Error::OutOfCapacity {
            needed,
            capacity: CAP,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            Error::TooShort { needed: 12, len: 3 }.to_string(),
            "Too short: need 12 bytes, have 3"
        );
        assert_eq!(
            Error::UnsupportedVersion(1).to_string(),
            "Unsupported RTP version 1"
        );
        assert_eq!(Error::InvalidState("x").kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn append_is_all_or_nothing() {
        let mut buf = ArrayVec::<u8, 4>::new();
        try_append(&mut buf, b"ab").unwrap();
        assert_eq!(
            try_append(&mut buf, b"cde"),
            Err(Error::OutOfCapacity {
                needed: 5,
                capacity: 4
            })
        );
        assert_eq!(&buf[..], b"ab");
        try_append(&mut buf, b"cd").unwrap();
        assert!(buf.is_full());
    }
}
