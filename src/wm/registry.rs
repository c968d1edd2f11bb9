//! Window registry
//!
//! Keyed store of every managed window. Only discovery inserts or removes
//! entries; the state controller mutates fields of existing ones.

use std::collections::{HashMap, HashSet};

use crate::shared::NativeHandle;
use crate::wm::client::ManagedWindow;

#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: HashMap<NativeHandle, ManagedWindow>,
    /// Handles classified as not manageable; never classified again while alive
    ignored: HashSet<NativeHandle>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, handle: NativeHandle) -> Option<&ManagedWindow> {
        self.windows.get(&handle)
    }

    pub(crate) fn get_mut(&mut self, handle: NativeHandle) -> Option<&mut ManagedWindow> {
        self.windows.get_mut(&handle)
    }

    pub fn contains(&self, handle: NativeHandle) -> bool {
        self.windows.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManagedWindow> {
        self.windows.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ManagedWindow> {
        self.windows.values_mut()
    }

    pub(crate) fn insert(&mut self, window: ManagedWindow) {
        self.windows.insert(window.handle, window);
    }

    /// Whether `handle` has been seen and classified either way
    pub fn is_known(&self, handle: NativeHandle) -> bool {
        self.windows.contains_key(&handle) || self.ignored.contains(&handle)
    }

    pub(crate) fn ignore(&mut self, handle: NativeHandle) {
        self.ignored.insert(handle);
    }

    pub fn is_ignored(&self, handle: NativeHandle) -> bool {
        self.ignored.contains(&handle)
    }

    /// Drop every entry not in `present`; returns the removed managed handles
    ///
    /// Ignored handles that disappeared are forgotten as well so the id space
    /// does not leak, but they are not reported.
    pub(crate) fn retain_present(&mut self, present: &HashSet<NativeHandle>) -> Vec<NativeHandle> {
        let mut removed: Vec<NativeHandle> = self
            .windows
            .keys()
            .filter(|handle| !present.contains(*handle))
            .copied()
            .collect();
        removed.sort_unstable();
        for handle in &removed {
            self.windows.remove(handle);
        }
        self.ignored.retain(|handle| present.contains(handle));
        removed
    }

    /// Cloned view of every entry, ordered by handle
    pub fn snapshot(&self) -> Vec<ManagedWindow> {
        let mut windows: Vec<ManagedWindow> = self.windows.values().cloned().collect();
        windows.sort_by_key(|w| w.handle);
        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Geometry;
    use crate::wm::fake::app_window;

    fn window(handle: NativeHandle) -> ManagedWindow {
        ManagedWindow::from_native(handle, &app_window("w", Geometry::new(0, 0, 10, 10)))
    }

    #[test]
    fn test_retain_present_reports_only_managed_removals() {
        let mut registry = WindowRegistry::new();
        registry.insert(window(1));
        registry.insert(window(2));
        registry.insert(window(3));
        registry.ignore(9);

        let present: HashSet<NativeHandle> = [2].into_iter().collect();
        let removed = registry.retain_present(&present);

        assert_eq!(removed, vec![1, 3]);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(2));
        assert!(!registry.is_known(9));
    }

    #[test]
    fn test_snapshot_is_sorted_copy() {
        let mut registry = WindowRegistry::new();
        registry.insert(window(5));
        registry.insert(window(2));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.iter().map(|w| w.handle).collect::<Vec<_>>(), vec![2, 5]);
    }
}
