//! Caller-ordered input list for the JPG→PDF assembler.
//!
//! Page order in the merged PDF is exactly the order of this list. The
//! move operations swap an entry with its neighbour and are no-ops at the
//! edges or for out-of-range indices.

use std::path::{Path, PathBuf};

/// An ordered list of image paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageOrder {
    items: Vec<PathBuf>,
}

impl ImageOrder {
    pub fn new(items: Vec<PathBuf>) -> Self {
        Self { items }
    }

    /// Replace the whole selection.
    pub fn replace(&mut self, items: Vec<PathBuf>) {
        self.items = items;
    }

    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.items.push(path.into());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<PathBuf> {
        self.items
    }

    /// Swap entry `index` with the one before it. Returns the entry's new
    /// index, or `None` if nothing moved.
    pub fn move_up(&mut self, index: usize) -> Option<usize> {
        if index == 0 || index >= self.items.len() {
            return None;
        }
        self.items.swap(index - 1, index);
        Some(index - 1)
    }

    /// Swap entry `index` with the one after it. Returns the entry's new
    /// index, or `None` if nothing moved.
    pub fn move_down(&mut self, index: usize) -> Option<usize> {
        if index + 1 >= self.items.len() {
            return None;
        }
        self.items.swap(index, index + 1);
        Some(index + 1)
    }

    /// File names for display, in order.
    pub fn display_names(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|p| display_name(p))
            .collect()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl From<Vec<PathBuf>> for ImageOrder {
    fn from(items: Vec<PathBuf>) -> Self {
        Self::new(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(names: &[&str]) -> ImageOrder {
        ImageOrder::new(names.iter().map(PathBuf::from).collect())
    }

    #[test]
    fn move_up_swaps_with_previous() {
        let mut o = order(&["a.jpg", "b.jpg", "c.jpg"]);
        assert_eq!(o.move_up(2), Some(1));
        assert_eq!(o.display_names(), vec!["a.jpg", "c.jpg", "b.jpg"]);
    }

    #[test]
    fn move_down_swaps_with_next() {
        let mut o = order(&["a.jpg", "b.jpg", "c.jpg"]);
        assert_eq!(o.move_down(0), Some(1));
        assert_eq!(o.display_names(), vec!["b.jpg", "a.jpg", "c.jpg"]);
    }

    #[test]
    fn edges_are_no_ops() {
        let mut o = order(&["a.jpg", "b.jpg"]);
        assert_eq!(o.move_up(0), None);
        assert_eq!(o.move_down(1), None);
        assert_eq!(o.move_down(7), None);
        assert_eq!(o.move_up(7), None);
        assert_eq!(o.display_names(), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn up_then_down_restores() {
        let original = order(&["a.jpg", "b.jpg", "c.jpg"]);
        let mut o = original.clone();
        let moved = o.move_up(1).unwrap();
        o.move_down(moved);
        assert_eq!(o, original);
    }

    #[test]
    fn empty_list() {
        let mut o = ImageOrder::default();
        assert!(o.is_empty());
        assert_eq!(o.move_down(0), None);
        o.push("x.jpg");
        assert_eq!(o.len(), 1);
    }
}
