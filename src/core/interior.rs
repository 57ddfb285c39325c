// Copyright @yucwang 2026

use crate::math::constants::Float;

pub const MAX_INTERIOR_DEPTH: usize = 8;

// Index of refraction of the medium outside every object.
const VACUUM_IOR: Float = 1.0;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct InteriorEntry {
    pub material_id: u32,
    pub priority: u32,
}

/// Nested dielectric media a path currently sits in.
///
/// Entries are kept sorted by nesting priority, the highest priority (the
/// medium that actually fills the current region) on top. Among equal
/// priorities the most recently entered medium wins.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct InteriorStack {
    entries: [InteriorEntry; MAX_INTERIOR_DEPTH],
    len: usize,
}

impl InteriorStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Entries from lowest to highest priority.
    pub fn entries(&self) -> &[InteriorEntry] {
        &self.entries[..self.len]
    }

    pub fn top(&self) -> Option<InteriorEntry> {
        self.entries().last().copied()
    }

    pub fn top_material_id(&self) -> Option<u32> {
        self.top().map(|e| e.material_id)
    }

    pub fn top_priority(&self) -> u32 {
        self.top().map(|e| e.priority).unwrap_or(0)
    }

    /// Highest-priority medium other than `material_id`, i.e. the medium a
    /// path ends up in after leaving `material_id`.
    pub fn next_material_id(&self, material_id: u32) -> Option<u32> {
        self.entries()
            .iter()
            .rev()
            .find(|e| e.material_id != material_id)
            .map(|e| e.material_id)
    }

    /// A surface only bounds the current region if its priority is at least
    /// that of the medium we are in. Anything lower is embedded in the
    /// current medium and must be ignored by the tracer.
    pub fn is_true_intersection(&self, priority: u32) -> bool {
        self.is_empty() || priority >= self.top_priority()
    }

    pub fn push(&mut self, material_id: u32, priority: u32) {
        let entry = InteriorEntry { material_id, priority };
        let pos = self.entries().iter().rposition(|e| e.priority <= priority).map(|i| i + 1).unwrap_or(0);

        if self.len == MAX_INTERIOR_DEPTH {
            // Full: the lowest-priority medium is the least visible one.
            if pos == 0 {
                return;
            }
            self.entries.copy_within(1..pos, 0);
            self.entries[pos - 1] = entry;
            return;
        }

        self.entries.copy_within(pos..self.len, pos + 1);
        self.entries[pos] = entry;
        self.len += 1;
    }

    /// Removes the topmost entry of `material_id`. Returns false if the path
    /// was not inside that medium.
    pub fn pop(&mut self, material_id: u32) -> bool {
        match self.entries().iter().rposition(|e| e.material_id == material_id) {
            Some(pos) => {
                self.entries.copy_within(pos + 1..self.len, pos);
                self.len -= 1;
                self.entries[self.len] = InteriorEntry::default();
                true
            }
            None => false,
        }
    }

    /// Updates the stack for crossing the boundary of `material_id`;
    /// `entering` is true when the path hits the surface from its front.
    pub fn handle_intersection(&mut self, material_id: u32, priority: u32, entering: bool) {
        if entering {
            self.push(material_id, priority);
        } else {
            self.pop(material_id);
        }
    }

    /// Tracer callback for a candidate hit of a scatter ray. True hits are
    /// reported back unchanged; false ones are folded into the stack so the
    /// ray can continue past them.
    pub fn resolve_candidate(&mut self, material_id: u32, priority: u32, front_facing: bool) -> bool {
        if self.is_true_intersection(priority) {
            return true;
        }
        self.handle_intersection(material_id, priority, front_facing);
        false
    }

    /// Ratio of incident to transmitted index of refraction at a boundary
    /// of `material_id`. `ior_of` looks up a material's index of refraction.
    pub fn relative_eta<F>(&self, material_id: u32, entering: bool, ior_of: F) -> Float
    where
        F: Fn(u32) -> Float,
    {
        let lookup = |id: Option<u32>| id.map(&ior_of).unwrap_or(VACUUM_IOR);
        let (eta_i, eta_t) = if entering {
            (lookup(self.top_material_id()), ior_of(material_id))
        } else {
            (ior_of(material_id), lookup(self.next_material_id(material_id)))
        };
        eta_i / eta_t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ior(id: u32) -> Float {
        match id {
            1 => 1.5,
            2 => 1.33,
            3 => 2.0,
            _ => 1.0,
        }
    }

    #[test]
    fn test_balanced_entry_and_exit() {
        let mut stack = InteriorStack::new();
        let media = [(1u32, 2u32), (2, 5), (3, 1), (4, 5)];
        for &(id, priority) in &media {
            stack.handle_intersection(id, priority, true);
        }
        assert_eq!(stack.len(), 4);
        // Equal priority: most recent entry is on top.
        assert_eq!(stack.top_material_id(), Some(4));

        for &(id, priority) in media.iter().rev() {
            stack.handle_intersection(id, priority, false);
        }
        assert!(stack.is_empty());
        assert_eq!(stack.top_material_id(), None);
    }

    #[test]
    fn test_top_tracks_highest_priority() {
        let mut stack = InteriorStack::new();
        stack.push(1, 3);
        assert_eq!(stack.top_material_id(), Some(1));
        stack.push(2, 1);
        assert_eq!(stack.top_material_id(), Some(1));
        stack.push(3, 7);
        assert_eq!(stack.top_material_id(), Some(3));
        assert!(stack.pop(3));
        assert_eq!(stack.top_material_id(), Some(1));
        assert!(stack.pop(1));
        assert_eq!(stack.top_material_id(), Some(2));
        assert!(!stack.pop(9));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_entries_sorted_by_priority() {
        let mut stack = InteriorStack::new();
        for &(id, priority) in &[(1, 4), (2, 1), (3, 9), (4, 4), (5, 0)] {
            stack.push(id, priority);
        }
        let priorities: Vec<u32> = stack.entries().iter().map(|e| e.priority).collect();
        assert_eq!(priorities, vec![0, 1, 4, 4, 9]);
        let ids: Vec<u32> = stack.entries().iter().map(|e| e.material_id).collect();
        assert_eq!(ids, vec![5, 2, 1, 4, 3]);
    }

    #[test]
    fn test_false_intersections_are_folded_in() {
        let mut stack = InteriorStack::new();
        stack.push(1, 5);

        // A lower-priority object embedded in material 1.
        assert!(!stack.resolve_candidate(2, 2, true));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.top_material_id(), Some(1));
        assert!(!stack.resolve_candidate(2, 2, false));
        assert_eq!(stack.len(), 1);

        // Equal or higher priority surfaces are real boundaries.
        let before = stack;
        assert!(stack.resolve_candidate(3, 5, true));
        assert!(stack.resolve_candidate(1, 5, false));
        assert_eq!(stack, before);
    }

    #[test]
    fn test_relative_eta() {
        let mut stack = InteriorStack::new();
        // Vacuum into glass.
        assert!((stack.relative_eta(1, true, ior) - 1.0 / 1.5).abs() < 1e-6);

        stack.push(1, 1);
        // Glass into water nested inside it.
        assert!((stack.relative_eta(2, true, ior) - 1.5 / 1.33).abs() < 1e-6);

        stack.push(2, 2);
        // Leaving the water goes back into glass.
        assert!((stack.relative_eta(2, false, ior) - 1.33 / 1.5).abs() < 1e-6);

        stack.pop(2);
        // Leaving the glass goes back into vacuum.
        assert!((stack.relative_eta(1, false, ior) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_capacity_drops_lowest_priority() {
        let mut stack = InteriorStack::new();
        for i in 0..MAX_INTERIOR_DEPTH as u32 {
            stack.push(i, i + 1);
        }
        assert_eq!(stack.len(), MAX_INTERIOR_DEPTH);

        // Lower than everything stored: ignored.
        stack.push(100, 0);
        assert_eq!(stack.entries()[0].material_id, 0);

        stack.push(200, 50);
        assert_eq!(stack.len(), MAX_INTERIOR_DEPTH);
        assert_eq!(stack.top_material_id(), Some(200));
        assert_eq!(stack.entries()[0].material_id, 1);
    }
}
