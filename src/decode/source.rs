//! Reading octets from a slice while keeping track of the position.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::{fmt, ops};
use super::error::DecodeError;


//------------ SliceSource ---------------------------------------------------

/// A source of octets from a bytes slice.
///
/// The source never reads past the end of the slice. Every attempt to do
/// so results in an error positioned at the point where data ran out.
#[derive(Clone, Copy, Debug)]
pub struct SliceSource<'s> {
    data: &'s [u8],
    pos: usize,
}

impl<'s> SliceSource<'s> {
    /// Creates a new source starting at the given offset.
    ///
    /// If `pos` is beyond the end of the slice, the source is empty.
    pub fn new(data: &'s [u8], pos: usize) -> Self {
        Self { data, pos: pos.min(data.len()) }
    }

    /// Returns the current position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the remaining data.
    pub fn remaining(&self) -> &'s [u8] {
        self.data.get(self.pos..).unwrap_or_default()
    }

    /// Returns whether all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Takes a single octet from the source.
    ///
    /// If there aren’t any more octets available from the source, returns
    /// a malformed error.
    pub fn take_u8(&mut self) -> Result<u8, DecodeError> {
        match self.data.get(self.pos).copied() {
            Some(value) => {
                self.pos += 1;
                Ok(value)
            }
            None => {
                Err(DecodeError::malformed("unexpected end of data", self.pos))
            }
        }
    }

    /// Returns the n-th octet from the current position if available.
    ///
    /// Does not advance the source.
    pub fn peek_nth(&self, n: usize) -> Option<u8> {
        self.remaining().get(n).copied()
    }

    /// Takes exactly `len` octets.
    ///
    /// Returns a length overrun error if less octets are available. The
    /// source is not advanced in this case.
    pub fn take_exact(&mut self, len: usize) -> Result<&'s [u8], DecodeError> {
        match self.remaining().get(..len) {
            Some(res) => {
                self.pos += len;
                Ok(res)
            }
            None => Err(DecodeError::overrun(self.pos))
        }
    }
}


//------------ Pos -----------------------------------------------------------

/// The logical position within a source.
///
/// Values of this type can only be used for diagnostics. They can not be used
/// to determine how far a source has been advanced since it was created. This
/// is why we used a newtype.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Pos(usize);

impl Pos {
    pub fn value(self) -> usize {
        self.0
    }
}

impl From<usize> for Pos {
    fn from(pos: usize) -> Pos {
        Pos(pos)
    }
}

impl ops::Add for Pos {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Pos(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}


//============ Tests =========================================================
