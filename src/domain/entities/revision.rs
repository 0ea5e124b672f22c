use crate::domain::entities::changes::PostChanges;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a revision inside its chain's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevisionId(u32);

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// One step of local, uncommitted editing: the fields the user changed
/// relative to the parent node, plus a flag marking the revision ready
/// to synchronize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub changes: PostChanges,
    pub ready: bool,
    next: Option<RevisionId>,
}

/// An ordered chain of revisions layered on top of a post snapshot.
///
/// Revisions live in an arena addressed by [`RevisionId`]; the post
/// owns the head and each revision owns at most one child, so the
/// chain has no cycles and a single leaf. Detachment and compaction
/// are index rewrites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionChain {
    slots: Vec<Option<Revision>>,
    head: Option<RevisionId>,
}

impl RevisionChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn head(&self) -> Option<RevisionId> {
        self.head
    }

    pub fn get(&self, id: RevisionId) -> Option<&Revision> {
        self.slots.get(id.0 as usize).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, id: RevisionId) -> Option<&mut Revision> {
        self.slots
            .get_mut(id.0 as usize)
            .and_then(|slot| slot.as_mut())
    }

    pub fn next_of(&self, id: RevisionId) -> Option<RevisionId> {
        self.get(id).and_then(|revision| revision.next)
    }

    /// The deepest node of the chain.
    pub fn leaf(&self) -> Option<RevisionId> {
        let mut current = self.head?;
        while let Some(next) = self.next_of(current) {
            current = next;
        }
        Some(current)
    }

    /// The furthest node marked ready to synchronize, if any.
    pub fn last_ready(&self) -> Option<RevisionId> {
        let mut found = None;
        for (id, revision) in self.iter() {
            if revision.ready {
                found = Some(id);
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn iter(&self) -> ChainIter<'_> {
        ChainIter {
            chain: self,
            current: self.head,
        }
    }

    /// Appends an empty revision at the leaf and returns its id.
    pub fn create(&mut self) -> RevisionId {
        let id = self.allocate(Revision::default());
        match self.leaf_excluding(id) {
            Some(leaf) => {
                if let Some(revision) = self.get_mut(leaf) {
                    revision.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        id
    }

    /// Creates a revision as the child of `node`, detaching any
    /// previous child line. There is only ever one active editing line.
    pub fn branch_from(&mut self, node: RevisionId) -> Option<RevisionId> {
        self.get(node)?;
        if let Some(child) = self.next_of(node) {
            self.free_from(child);
        }
        let id = self.allocate(Revision::default());
        if let Some(revision) = self.get_mut(node) {
            revision.next = Some(id);
        }
        Some(id)
    }

    /// Drops every node from the head through `target` and re-parents
    /// the remainder (the node after `target`, if any) as the new head.
    pub fn compact_through(&mut self, target: RevisionId) {
        let Some(head) = self.head else { return };
        let new_head = self.next_of(target);
        let mut current = Some(head);
        while let Some(id) = current {
            let next = self.next_of(id);
            self.slots[id.0 as usize] = None;
            if id == target {
                break;
            }
            current = next;
        }
        self.head = new_head;
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
    }

    fn allocate(&mut self, revision: Revision) -> RevisionId {
        if let Some(free) = self.slots.iter().position(Option::is_none) {
            self.slots[free] = Some(revision);
            RevisionId(free as u32)
        } else {
            self.slots.push(Some(revision));
            RevisionId((self.slots.len() - 1) as u32)
        }
    }

    fn leaf_excluding(&self, skip: RevisionId) -> Option<RevisionId> {
        let mut current = self.head?;
        if current == skip {
            return None;
        }
        while let Some(next) = self.next_of(current) {
            if next == skip {
                break;
            }
            current = next;
        }
        Some(current)
    }

    fn free_from(&mut self, start: RevisionId) {
        let mut current = Some(start);
        while let Some(id) = current {
            let next = self.next_of(id);
            self.slots[id.0 as usize] = None;
            current = next;
        }
    }
}

pub struct ChainIter<'a> {
    chain: &'a RevisionChain,
    current: Option<RevisionId>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = (RevisionId, &'a Revision);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let revision = self.chain.get(id)?;
        self.current = revision.next;
        Some((id, revision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_appends_at_the_leaf() {
        let mut chain = RevisionChain::new();
        let first = chain.create();
        let second = chain.create();
        assert_eq!(chain.head(), Some(first));
        assert_eq!(chain.next_of(first), Some(second));
        assert_eq!(chain.leaf(), Some(second));
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn branch_from_detaches_the_previous_line() {
        let mut chain = RevisionChain::new();
        let first = chain.create();
        let second = chain.create();
        let third = chain.create();

        let branched = chain.branch_from(first).unwrap();
        assert_eq!(chain.next_of(first), Some(branched));
        assert!(chain.get(second).is_none());
        assert!(chain.get(third).is_none());
        assert_eq!(chain.leaf(), Some(branched));
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn last_ready_finds_the_furthest_marked_node() {
        let mut chain = RevisionChain::new();
        let first = chain.create();
        let second = chain.create();
        let third = chain.create();

        assert_eq!(chain.last_ready(), None);

        chain.get_mut(first).unwrap().ready = true;
        chain.get_mut(second).unwrap().ready = true;
        assert_eq!(chain.last_ready(), Some(second));
        assert_eq!(chain.next_of(second), Some(third));
    }

    #[test]
    fn compact_through_reparents_the_remainder() {
        let mut chain = RevisionChain::new();
        let first = chain.create();
        let second = chain.create();
        let third = chain.create();

        chain.compact_through(second);
        assert_eq!(chain.head(), Some(third));
        assert!(chain.get(first).is_none());
        assert!(chain.get(second).is_none());
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn compact_through_the_leaf_empties_the_chain() {
        let mut chain = RevisionChain::new();
        chain.create();
        let leaf = chain.create();
        chain.compact_through(leaf);
        assert!(chain.is_empty());
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut chain = RevisionChain::new();
        let first = chain.create();
        chain.create();
        chain.branch_from(first).unwrap();
        // the detached slot is reused instead of growing the arena
        assert_eq!(chain.len(), 2);
        chain.create();
        assert_eq!(chain.len(), 3);
    }
}
