// SPDX-License-Identifier: GPL-3.0-only

//! Selection stack
//!
//! Ordered, deduplicated, capacity-bounded set of chosen assets.
//!
//! Invariants:
//! - `len() <= capacity_limit` whenever `capacity_limit > 0`
//! - no id appears twice
//! - in single-select mode `len() <= 1`, and a push replaces the current entry
//!
//! Every accepted mutation is reported to the single subscriber in mutation
//! order. Re-pushing an id that is already selected is a silent no-op.

use crate::config::SessionConfig;
use crate::errors::SelectionError;
use crate::media::{AssetId, AssetRef};
use std::collections::HashSet;
use tracing::debug;

/// Change notification emitted by [`SelectionStack`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    /// An asset was appended
    Pushed(AssetRef),
    /// An asset was removed
    Dropped(AssetRef),
    /// The whole selection was replaced
    Reloaded,
}

/// Single- or multi-select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectMode {
    Single,
    #[default]
    Multi,
}

type Observer = Box<dyn FnMut(&SelectionEvent) + Send>;

pub struct SelectionStack {
    assets: Vec<AssetRef>,
    ids: HashSet<AssetId>,
    capacity_limit: usize,
    mode: SelectMode,
    observer: Option<Observer>,
}

impl SelectionStack {
    /// Empty stack; `capacity_limit == 0` means unbounded
    pub fn new(capacity_limit: usize, mode: SelectMode) -> Self {
        Self {
            assets: Vec::new(),
            ids: HashSet::new(),
            capacity_limit,
            mode,
            observer: None,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        let mode = if config.allow_multi_select {
            SelectMode::Multi
        } else {
            SelectMode::Single
        };
        Self::new(config.capacity_limit, mode)
    }

    /// Install the subscriber, replacing any previous one
    pub fn subscribe(&mut self, observer: impl FnMut(&SelectionEvent) + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    fn emit(&mut self, event: SelectionEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
    }

    /// Append `asset`
    ///
    /// In single-select mode the current entry is dropped first, so the
    /// subscriber sees exactly one `Dropped` followed by one `Pushed`.
    ///
    /// # Returns
    /// * `Ok(())` - Asset selected, or it already was
    /// * `Err(SelectionError::AtCapacity)` - Multi-select stack is full
    pub fn push(&mut self, asset: AssetRef) -> Result<(), SelectionError> {
        if self.ids.contains(asset.id()) {
            debug!(asset = %asset.id(), "Asset already selected");
            return Ok(());
        }

        match self.mode {
            SelectMode::Single => {
                for previous in std::mem::take(&mut self.assets) {
                    self.ids.remove(previous.id());
                    debug!(asset = %previous.id(), "Replacing single selection");
                    self.emit(SelectionEvent::Dropped(previous));
                }
            }
            SelectMode::Multi => {
                if !self.is_below_capacity() {
                    debug!(
                        asset = %asset.id(),
                        capacity = self.capacity_limit,
                        "Selection at capacity"
                    );
                    return Err(SelectionError::AtCapacity);
                }
            }
        }

        debug!(asset = %asset.id(), count = self.assets.len() + 1, "Asset pushed");
        self.ids.insert(asset.id().clone());
        self.assets.push(asset.clone());
        self.emit(SelectionEvent::Pushed(asset));
        Ok(())
    }

    /// Remove `asset`, keeping the order of the rest
    pub fn drop(&mut self, asset: &AssetRef) -> Result<(), SelectionError> {
        if !self.ids.remove(asset.id()) {
            return Err(SelectionError::NotFound);
        }
        let removed = match self.assets.iter().position(|a| a == asset) {
            Some(index) => self.assets.remove(index),
            None => asset.clone(),
        };
        debug!(asset = %removed.id(), count = self.assets.len(), "Asset dropped");
        self.emit(SelectionEvent::Dropped(removed));
        Ok(())
    }

    /// Replace the whole selection
    ///
    /// Duplicates are collapsed to their first occurrence and the result is
    /// cut down to what the mode and capacity allow; single-select keeps the
    /// last entry, multi-select keeps the first `capacity_limit`.
    pub fn reset(&mut self, assets: impl IntoIterator<Item = AssetRef>) {
        let mut ids = HashSet::new();
        let mut kept: Vec<AssetRef> = assets
            .into_iter()
            .filter(|asset| ids.insert(asset.id().clone()))
            .collect();

        match self.mode {
            SelectMode::Single => {
                let last = kept.pop();
                kept = last.into_iter().collect();
            }
            SelectMode::Multi if self.capacity_limit > 0 => kept.truncate(self.capacity_limit),
            SelectMode::Multi => {}
        }

        self.ids = kept.iter().map(|asset| asset.id().clone()).collect();
        self.assets = kept;
        debug!(count = self.assets.len(), "Selection reloaded");
        self.emit(SelectionEvent::Reloaded);
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.ids.contains(id)
    }

    /// Owned copy of the selection in insertion order
    pub fn snapshot(&self) -> Vec<AssetRef> {
        self.assets.clone()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn capacity_limit(&self) -> usize {
        self.capacity_limit
    }

    pub fn mode(&self) -> SelectMode {
        self.mode
    }

    /// Room for one more entry without replacing anything
    pub fn is_below_capacity(&self) -> bool {
        self.capacity_limit == 0 || self.assets.len() < self.capacity_limit
    }

    /// Whether pushing `asset` would currently be accepted
    pub fn can_accept(&self, asset: &AssetRef) -> bool {
        self.contains(asset.id()) || self.mode == SelectMode::Single || self.is_below_capacity()
    }
}

impl std::fmt::Debug for SelectionStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionStack")
            .field("assets", &self.assets)
            .field("capacity_limit", &self.capacity_limit)
            .field("mode", &self.mode)
            .field("subscribed", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::{Arc, Mutex};

    fn asset(id: &str) -> AssetRef {
        AssetRef::photo(id, Utc::now())
    }

    fn recorded(stack: &mut SelectionStack) -> Arc<Mutex<Vec<SelectionEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        stack.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        events
    }

    #[test]
    fn test_capacity_scenario() {
        let mut stack = SelectionStack::new(2, SelectMode::Multi);
        stack.push(asset("a")).unwrap();
        stack.push(asset("b")).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.push(asset("c")), Err(SelectionError::AtCapacity));
        stack.drop(&asset("a")).unwrap();
        stack.push(asset("c")).unwrap();
        assert_eq!(stack.snapshot(), vec![asset("b"), asset("c")]);
    }

    #[test]
    fn test_repush_is_noop_without_event() {
        let mut stack = SelectionStack::new(1, SelectMode::Multi);
        let events = recorded(&mut stack);
        stack.push(asset("a")).unwrap();
        // Present id at capacity is still accepted as a no-op
        assert_eq!(stack.push(asset("a")), Ok(()));
        assert_eq!(stack.len(), 1);
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_single_select_replaces() {
        let mut stack = SelectionStack::new(0, SelectMode::Single);
        let events = recorded(&mut stack);
        stack.push(asset("a")).unwrap();
        events.lock().unwrap().clear();

        stack.push(asset("b")).unwrap();
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                SelectionEvent::Dropped(asset("a")),
                SelectionEvent::Pushed(asset("b")),
            ]
        );
        assert_eq!(stack.snapshot(), vec![asset("b")]);
        assert!(!stack.contains(asset("a").id()));
    }

    #[test]
    fn test_single_select_ignores_capacity() {
        let mut stack = SelectionStack::new(1, SelectMode::Single);
        stack.push(asset("a")).unwrap();
        assert!(stack.can_accept(&asset("b")));
        stack.push(asset("b")).unwrap();
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_drop_absent_leaves_snapshot() {
        let mut stack = SelectionStack::new(0, SelectMode::Multi);
        let events = recorded(&mut stack);
        stack.push(asset("a")).unwrap();
        let before = stack.snapshot();
        assert_eq!(stack.drop(&asset("zzz")), Err(SelectionError::NotFound));
        assert_eq!(stack.snapshot(), before);
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_drop_preserves_order() {
        let mut stack = SelectionStack::new(0, SelectMode::Multi);
        for id in ["a", "b", "c", "d"] {
            stack.push(asset(id)).unwrap();
        }
        stack.drop(&asset("b")).unwrap();
        assert_eq!(stack.snapshot(), vec![asset("a"), asset("c"), asset("d")]);
    }

    #[test]
    fn test_reset_dedups_and_truncates() {
        let mut stack = SelectionStack::new(2, SelectMode::Multi);
        let events = recorded(&mut stack);
        stack.reset(vec![asset("a"), asset("a"), asset("b"), asset("c")]);
        assert_eq!(stack.snapshot(), vec![asset("a"), asset("b")]);
        assert!(!stack.contains(asset("c").id()));
        assert_eq!(*events.lock().unwrap(), vec![SelectionEvent::Reloaded]);

        let mut single = SelectionStack::new(0, SelectMode::Single);
        single.reset(vec![asset("x"), asset("y")]);
        assert_eq!(single.snapshot(), vec![asset("y")]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut stack = SelectionStack::new(0, SelectMode::Multi);
        stack.push(asset("a")).unwrap();
        let snapshot = stack.snapshot();
        stack.push(asset("b")).unwrap();
        stack.drop(&asset("a")).unwrap();
        assert_eq!(snapshot, vec![asset("a")]);
    }

    #[test]
    fn test_capacity_never_exceeded_under_mixed_operations() {
        let mut stack = SelectionStack::new(3, SelectMode::Multi);
        let ids: Vec<String> = (0..10).map(|i| format!("asset-{}", i)).collect();
        for round in 0..50usize {
            let id = &ids[(round * 7) % ids.len()];
            if round % 3 == 0 {
                let _ = stack.drop(&asset(id));
            } else {
                let _ = stack.push(asset(id));
            }
            assert!(stack.len() <= 3);
        }
    }
}
