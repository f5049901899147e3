use std::collections::{HashSet, VecDeque};

/// Bounded, duplicate-free record of recently shown profiles.
///
/// Ids are kept in first-view order; once `capacity` is reached the oldest
/// id is evicted to make room.  Viewing an id that is already present is a
/// no-op (its position is not refreshed).
#[derive(Debug, Clone)]
pub struct RecentViews {
    order: VecDeque<String>,
    members: HashSet<String>,
    capacity: usize,
}

impl RecentViews {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns `true` when `profile_id` was not already present.
    pub fn push(&mut self, profile_id: &str) -> bool {
        if self.members.contains(profile_id) {
            return false;
        }
        while self.order.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.members.remove(&evicted);
            }
        }
        self.order.push_back(profile_id.to_string());
        self.members.insert(profile_id.to_string());
        true
    }

    pub fn remove(&mut self, profile_id: &str) -> bool {
        if !self.members.remove(profile_id) {
            return false;
        }
        self.order.retain(|id| id != profile_id);
        true
    }

    pub fn contains(&self, profile_id: &str) -> bool {
        self.members.contains(profile_id)
    }

    pub fn ids(&self) -> &HashSet<String> {
        &self.members
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::RecentViews;

    #[test]
    fn duplicates_are_ignored() {
        let mut views = RecentViews::new(3);
        assert!(views.push("a"));
        assert!(!views.push("a"));
        assert_eq!(views.len(), 1);
    }

    #[test]
    fn oldest_is_evicted_first() {
        let mut views = RecentViews::new(3);
        for id in ["a", "b", "c", "d"] {
            views.push(id);
        }
        assert_eq!(views.iter().collect::<Vec<_>>(), vec!["b", "c", "d"]);
        assert!(!views.contains("a"));
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut views = RecentViews::new(50);
        for i in 0..1_000 {
            views.push(&format!("profile-{i}"));
            assert!(views.len() <= 50);
        }
        assert_eq!(views.len(), 50);
        assert_eq!(views.ids().len(), 50);
        assert_eq!(views.iter().next(), Some("profile-950"));
    }

    #[test]
    fn remove_frees_a_slot() {
        let mut views = RecentViews::new(2);
        views.push("a");
        views.push("b");
        assert!(views.remove("a"));
        assert!(!views.remove("a"));
        views.push("c");
        assert_eq!(views.iter().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut views = RecentViews::new(0);
        views.push("a");
        views.push("b");
        assert_eq!(views.capacity(), 1);
        assert_eq!(views.iter().collect::<Vec<_>>(), vec!["b"]);
    }
}
