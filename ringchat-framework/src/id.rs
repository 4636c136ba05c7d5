//! Identifiers in the overlay's shared address space
//!
//! Both chat participants (by nickname) and channels (by channel name) are
//! addressed with the same [NodeId] type, derived deterministically from the
//! name so that any node can compute the address of any peer or channel
//! without a lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Width in bits of an identifier in the overlay address space
pub const ID_BITS: usize = 160;

const ID_WORDS: usize = ID_BITS / 32;

/// A fixed-width identifier on the overlay ring, stored as big-endian 32-bit
/// words
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId([u32; ID_WORDS]);

/// Unsigned ring distance between two identifiers, comparable so that routing
/// can pick the nearest node
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Distance([u32; ID_WORDS]);

impl NodeId {
    /// Derive the identifier for the given name.
    ///
    /// Pure function of `name`: the same input always produces the same
    /// identifier, so nicknames and channel names double as addresses. A
    /// simple polynomial hash of the name is spread across every word of the
    /// identifier; distinct names are expected but not guaranteed to map to
    /// distinct identifiers.
    pub fn derive(name: &str) -> Self {
        let hash = name
            .bytes()
            .fold(0u32, |acc, byte| acc.wrapping_mul(31).wrapping_add(byte as u32));

        Self([hash; ID_WORDS])
    }

    /// Distance to `other` on the identifier ring, measured the short way
    /// around
    pub fn distance(&self, other: &NodeId) -> Distance {
        let clockwise = wrapping_sub(&other.0, &self.0);
        let counter = wrapping_sub(&self.0, &other.0);

        Distance(if clockwise <= counter { clockwise } else { counter })
    }

    /// Get a short version (least significant word) of this identifier to be
    /// used for display in log messages
    #[inline(always)]
    pub const fn short(&self) -> impl fmt::Display + '_ {
        struct ShortId<'a>(&'a NodeId);

        impl<'a> fmt::Display for ShortId<'a> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:08x}", self.0 .0[ID_WORDS - 1])
            }
        }

        ShortId(self)
    }
}

/// `a - b` modulo 2^160, operating on big-endian words
fn wrapping_sub(a: &[u32; ID_WORDS], b: &[u32; ID_WORDS]) -> [u32; ID_WORDS] {
    let mut out = [0u32; ID_WORDS];
    let mut borrow = 0u64;

    for i in (0..ID_WORDS).rev() {
        let lhs = a[i] as u64;
        let rhs = b[i] as u64 + borrow;
        if lhs >= rhs {
            out[i] = (lhs - rhs) as u32;
            borrow = 0;
        } else {
            out[i] = ((1u64 << 32) + lhs - rhs) as u32;
            borrow = 1;
        }
    }

    out
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in self.0 {
            write!(f, "{:08x}", word)?;
        }

        Ok(())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        for name in ["alice", "bob", "general", ""] {
            assert_eq!(NodeId::derive(name), NodeId::derive(name));
        }
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = NodeId::derive("alice");
        let b = NodeId::derive("bob");

        assert_eq!(a.distance(&b), b.distance(&a));
        assert_eq!(a.distance(&a), Distance([0; ID_WORDS]));
    }

    #[test]
    fn distance_takes_the_short_way_around() {
        let low = NodeId([0, 0, 0, 0, 1]);
        let high = NodeId([u32::MAX; ID_WORDS]);

        // 2 apart across the wrap point, not 2^160 - 2
        assert_eq!(low.distance(&high), Distance([0, 0, 0, 0, 2]));
    }
}
