//! Execution-ordered callback list that tolerates mutation during traversal.
//!
//! Traversal is cursor based: `begin` resets the cursor, `advance` yields the element
//! under it and moves on. The cursor always holds the index of the *next* element, so
//! structural edits keep it consistent:
//!
//! - removing an element before the cursor shifts the cursor back one slot, so the
//!   element that slid into the gap is not skipped;
//! - inserting before the cursor shifts it forward, so the current element is not
//!   revisited and the new element waits for the next pass;
//! - appending (or inserting at or after the cursor) is visited later in the same pass.

/// Sorted sequence of items with a live traversal cursor.
#[derive(Debug, Clone)]
pub struct OrderedCallbackList<T> {
    items: Vec<T>,
    cursor: Option<usize>,
}

impl<T: Copy + PartialEq> OrderedCallbackList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
        }
    }

    /// Push an item whose key is the current maximum.
    pub fn append(&mut self, item: T) {
        self.items.push(item);
    }

    /// Insert keeping the list sorted by `key`. Equal keys land after existing ones.
    pub fn insert<K, F>(&mut self, item: T, key: F)
    where
        K: Ord,
        F: Fn(&T) -> K,
    {
        let item_key = key(&item);
        let position = self.items.partition_point(|existing| key(existing) <= item_key);
        self.items.insert(position, item);
        if let Some(cursor) = self.cursor.as_mut() {
            if *cursor > position {
                *cursor += 1;
            }
        }
    }

    /// Remove an item by identity. Returns its former index.
    pub fn remove(&mut self, item: &T) -> Option<usize> {
        let position = self.items.iter().position(|existing| existing == item)?;
        self.items.remove(position);
        if let Some(cursor) = self.cursor.as_mut() {
            if *cursor > position {
                *cursor -= 1;
            }
        }
        Some(position)
    }

    /// Full stable re-sort. During a traversal the cursor follows the element that was
    /// visited last, so the pass resumes right after it.
    pub fn sort<K, F>(&mut self, key: F)
    where
        K: Ord,
        F: Fn(&T) -> K,
    {
        let current = self
            .cursor
            .filter(|&cursor| cursor > 0)
            .and_then(|cursor| self.items.get(cursor - 1).copied());
        self.items.sort_by_key(|item| key(item));
        if let Some(current) = current {
            if let Some(position) = self.items.iter().position(|item| *item == current) {
                self.cursor = Some(position + 1);
            }
        }
    }

    /// Start a traversal. Returns the enclosing traversal's cursor, if any, to hand
    /// back to [`end`](Self::end).
    #[must_use]
    pub fn begin(&mut self) -> Option<usize> {
        self.cursor.replace(0)
    }

    /// Next element of the active traversal.
    pub fn advance(&mut self) -> Option<T> {
        let cursor = self.cursor.as_mut()?;
        let item = self.items.get(*cursor).copied()?;
        *cursor += 1;
        Some(item)
    }

    pub fn end(&mut self, saved: Option<usize>) {
        self.cursor = saved;
    }

    pub fn is_traversing(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        if let Some(cursor) = self.cursor.as_mut() {
            *cursor = 0;
        }
    }
}

impl<T: Copy + PartialEq> Default for OrderedCallbackList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(value: &u32) -> u32 {
        *value
    }

    fn list(items: &[u32]) -> OrderedCallbackList<u32> {
        let mut list = OrderedCallbackList::new();
        for item in items {
            list.append(*item);
        }
        list
    }

    #[test]
    fn insert_keeps_sorted_order() {
        let mut list = list(&[10, 30]);
        list.insert(20, identity);
        list.insert(5, identity);
        list.insert(40, identity);
        assert_eq!(list.as_slice(), &[5, 10, 20, 30, 40]);
    }

    #[test]
    fn removal_before_cursor_does_not_skip() {
        let mut list = list(&[1, 2, 3, 4]);
        let saved = list.begin();
        let mut visited = Vec::new();
        while let Some(item) = list.advance() {
            visited.push(item);
            if item == 2 {
                // remove the current element and the one before it
                list.remove(&2);
                list.remove(&1);
            }
        }
        list.end(saved);
        assert_eq!(visited, vec![1, 2, 3, 4]);
        assert!(!list.is_traversing());
    }

    #[test]
    fn removal_after_cursor_is_never_visited() {
        let mut list = list(&[1, 2, 3]);
        let saved = list.begin();
        let mut visited = Vec::new();
        while let Some(item) = list.advance() {
            visited.push(item);
            if item == 1 {
                list.remove(&2);
            }
        }
        list.end(saved);
        assert_eq!(visited, vec![1, 3]);
    }

    #[test]
    fn append_during_traversal_is_visited_once() {
        let mut list = list(&[1, 2]);
        let saved = list.begin();
        let mut visited = Vec::new();
        while let Some(item) = list.advance() {
            visited.push(item);
            if item == 1 {
                list.append(3);
            }
        }
        list.end(saved);
        assert_eq!(visited, vec![1, 2, 3]);
    }

    #[test]
    fn insert_before_cursor_waits_for_next_pass() {
        let mut list = list(&[10, 20, 30]);
        let saved = list.begin();
        let mut visited = Vec::new();
        while let Some(item) = list.advance() {
            visited.push(item);
            if item == 20 {
                list.insert(5, identity);
                list.insert(25, identity);
            }
        }
        list.end(saved);
        assert_eq!(visited, vec![10, 20, 25, 30]);
        assert_eq!(list.as_slice(), &[5, 10, 20, 25, 30]);
    }

    #[test]
    fn sort_mid_traversal_resumes_after_current() {
        let mut list = list(&[1, 2, 3]);
        let saved = list.begin();
        assert_eq!(list.advance(), Some(1));
        // reverse order: current element (1) moves to the end
        list.sort(|value| std::cmp::Reverse(*value));
        assert_eq!(list.advance(), None);
        list.end(saved);
        assert_eq!(list.as_slice(), &[3, 2, 1]);
    }

    #[test]
    fn nested_traversal_restores_outer_cursor() {
        let mut list = list(&[1, 2, 3]);
        let outer = list.begin();
        assert_eq!(list.advance(), Some(1));

        let inner = list.begin();
        let mut inner_visited = Vec::new();
        while let Some(item) = list.advance() {
            inner_visited.push(item);
        }
        list.end(inner);

        assert_eq!(inner_visited, vec![1, 2, 3]);
        assert_eq!(list.advance(), Some(2));
        list.end(outer);
    }
}
