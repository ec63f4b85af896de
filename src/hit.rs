//! Result of a single dictionary lookup.
//!
//! A `Hit` records where the lookup began, how many characters were walked,
//! and the two independent status bits. When the walk ended on a node that
//! still has children, it also carries a [`NodeRef`] so the caller can extend
//! the match one character at a time without restarting at the root.

use bitflags::bitflags;

bitflags! {
    /// `MATCH`: the walked characters form a live entry.
    /// `PREFIX`: they are also a strict prefix of at least one longer entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HitStatus: u8 {
        const MATCH = 0b01;
        const PREFIX = 0b10;
    }
}

impl HitStatus {
    pub const UNMATCHED: Self = Self::empty();
    pub const MATCH_EXACT: Self = Self::MATCH;
    pub const MATCH_PREFIX: Self = Self::MATCH.union(Self::PREFIX);
    pub const PREFIX_ONLY: Self = Self::PREFIX;
}

/// Opaque position inside one [`Segment`](crate::Segment).
///
/// Only the segment that produced it can resolve it; handing it to another
/// lexicon yields an unmatched result instead of a bogus walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub(crate) owner: u32,
    pub(crate) index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    status: HitStatus,
    begin: usize,
    len: usize,
    node: Option<NodeRef>,
}

impl Hit {
    pub(crate) fn unmatched(begin: usize, len: usize) -> Self {
        Hit {
            status: HitStatus::UNMATCHED,
            begin,
            len,
            node: None,
        }
    }

    pub(crate) fn new(status: HitStatus, begin: usize, len: usize, node: NodeRef) -> Self {
        // Only a prefix can be resumed; a dead end carries nothing.
        let node = status.contains(HitStatus::PREFIX).then_some(node);
        Hit {
            status,
            begin,
            len,
            node,
        }
    }

    pub fn status(&self) -> HitStatus {
        self.status
    }

    pub fn is_match(&self) -> bool {
        self.status.contains(HitStatus::MATCH)
    }

    pub fn is_prefix(&self) -> bool {
        self.status.contains(HitStatus::PREFIX)
    }

    pub fn is_unmatched(&self) -> bool {
        self.status.is_empty()
    }

    /// Offset of the first character of the candidate in the buffer.
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// Characters consumed from `begin`, including any resumed steps.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Exclusive end offset; the next character to feed when resuming.
    pub fn end(&self) -> usize {
        self.begin + self.len
    }

    pub fn resume_point(&self) -> Option<NodeRef> {
        self.node
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const NODE: NodeRef = NodeRef { owner: 1, index: 7 };

    #[test]
    fn status_combinations() {
        assert_eq!(HitStatus::MATCH_PREFIX, HitStatus::MATCH | HitStatus::PREFIX);
        assert!(HitStatus::UNMATCHED.is_empty());
        assert!(!HitStatus::PREFIX_ONLY.contains(HitStatus::MATCH));
        assert!(!HitStatus::MATCH_EXACT.contains(HitStatus::PREFIX));
    }

    #[test]
    fn resume_point_only_for_prefix() {
        let exact = Hit::new(HitStatus::MATCH_EXACT, 0, 2, NODE);
        assert!(exact.is_match());
        assert!(!exact.is_prefix());
        assert_eq!(exact.resume_point(), None);

        let prefix = Hit::new(HitStatus::PREFIX_ONLY, 3, 1, NODE);
        assert!(!prefix.is_match());
        assert_eq!(prefix.resume_point(), Some(NODE));
        assert_eq!(prefix.end(), 4);

        let both = Hit::new(HitStatus::MATCH_PREFIX, 0, 2, NODE);
        assert!(both.is_match() && both.is_prefix());
        assert_eq!(both.resume_point(), Some(NODE));
    }

    #[test]
    fn unmatched_is_inert() {
        let hit = Hit::unmatched(5, 0);
        assert!(hit.is_unmatched());
        assert!(hit.is_empty());
        assert_eq!(hit.begin(), 5);
        assert_eq!(hit.resume_point(), None);
    }
}
