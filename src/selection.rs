//! Selection state.
//!
//! [`SelectionStore`] is the only writer of selection: it owns the set of
//! selected [`RecordId`]s and keeps every affected record's `selected` flag in
//! step with it before returning. Callers never flip the flag themselves.
//!
//! Each public operation ends with exactly one [`SelectionEvent::SizeChanged`]
//! sent to subscribers, after the set and the flags are both updated, so a
//! subscriber never sees a half-applied batch.

use crate::types::{ImageRecord, RecordId};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::mpsc::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SelectionEvent {
    /// Sent once per operation.
    SizeChanged { previous: usize, size: usize },
    /// Sent by [`SelectionStore::toggle`] for the record it flipped.
    RecordChanged { id: RecordId, selected: bool },
}

#[derive(Debug, Default)]
pub struct SelectionStore {
    selected: HashSet<RecordId>,
    subscribers: Vec<Sender<SelectionEvent>>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, tx: Sender<SelectionEvent>) {
        self.subscribers.push(tx);
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.selected.contains(id)
    }

    fn publish(&mut self, event: SelectionEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    fn size_changed(&mut self, previous: usize) {
        let size = self.selected.len();
        tracing::debug!(previous, size, "selection changed");
        self.publish(SelectionEvent::SizeChanged { previous, size });
    }

    /// Flip the selection of the record with `id`.
    ///
    /// Returns the new state, or `None` (and notifies nobody) when no record
    /// in `records` has that id.
    pub fn toggle(&mut self, id: RecordId, records: &mut [ImageRecord]) -> Option<bool> {
        let record = records.iter_mut().find(|r| r.id == id)?;
        let previous = self.selected.len();

        let selected = if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        };
        record.selected = selected;

        self.publish(SelectionEvent::RecordChanged { id, selected });
        self.size_changed(previous);
        Some(selected)
    }

    /// Select every record given.
    pub fn select_all<'a>(&mut self, records: impl IntoIterator<Item = &'a mut ImageRecord>) {
        let previous = self.selected.len();
        for record in records {
            self.selected.insert(record.id);
            record.selected = true;
        }
        self.size_changed(previous);
    }

    /// Deselect every record given. Records not given keep their state.
    pub fn deselect_all<'a>(&mut self, records: impl IntoIterator<Item = &'a mut ImageRecord>) {
        let previous = self.selected.len();
        for record in records {
            self.selected.remove(&record.id);
            record.selected = false;
        }
        self.size_changed(previous);
    }

    /// Empty the selection and reset the flag on every record given.
    pub fn clear<'a>(&mut self, records: impl IntoIterator<Item = &'a mut ImageRecord>) {
        let previous = self.selected.len();
        self.selected.clear();
        for record in records {
            record.selected = false;
        }
        self.size_changed(previous);
    }

    /// Selected records, in the order they appear in `records`.
    pub fn selected_of<'a>(&self, records: &'a [ImageRecord]) -> Vec<&'a ImageRecord> {
        records
            .iter()
            .filter(|r| self.selected.contains(&r.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::record;
    use std::sync::mpsc;

    fn records(n: usize) -> Vec<ImageRecord> {
        (0..n).map(|i| record(&format!("{i}.png"), "image/png", 1)).collect()
    }

    fn assert_mirrored(store: &SelectionStore, records: &[ImageRecord]) {
        for r in records {
            assert_eq!(r.selected, store.contains(&r.id), "{} out of sync", r.id);
        }
    }

    fn size_events(rx: &mpsc::Receiver<SelectionEvent>) -> Vec<(usize, usize)> {
        rx.try_iter()
            .filter_map(|e| match e {
                SelectionEvent::SizeChanged { previous, size } => Some((previous, size)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn toggle_selects_then_deselects() {
        let mut recs = records(3);
        let mut store = SelectionStore::new();
        let id = recs[1].id;

        assert_eq!(store.toggle(id, &mut recs), Some(true));
        assert!(recs[1].selected);
        assert_eq!(store.len(), 1);

        assert_eq!(store.toggle(id, &mut recs), Some(false));
        assert!(!recs[1].selected);
        assert!(store.is_empty());
        assert_mirrored(&store, &recs);
    }

    #[test]
    fn double_toggle_nets_zero_size_change() {
        let mut recs = records(2);
        let (tx, rx) = mpsc::channel();
        let mut store = SelectionStore::new();
        store.subscribe(tx);
        let id = recs[0].id;

        store.toggle(id, &mut recs);
        store.toggle(id, &mut recs);

        let sizes = size_events(&rx);
        assert_eq!(sizes, vec![(0, 1), (1, 0)]);
        let delta: i64 = sizes.iter().map(|(p, s)| *s as i64 - *p as i64).sum();
        assert_eq!(delta, 0);
    }

    #[test]
    fn toggle_reports_record_change_before_size() {
        let mut recs = records(1);
        let (tx, rx) = mpsc::channel();
        let mut store = SelectionStore::new();
        store.subscribe(tx);
        let id = recs[0].id;

        store.toggle(id, &mut recs);
        let events: Vec<SelectionEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                SelectionEvent::RecordChanged { id, selected: true },
                SelectionEvent::SizeChanged {
                    previous: 0,
                    size: 1
                },
            ]
        );
    }

    #[test]
    fn toggle_unknown_id_is_noop() {
        let mut recs = records(2);
        let (tx, rx) = mpsc::channel();
        let mut store = SelectionStore::new();
        store.subscribe(tx);

        let stranger = RecordId {
            session: 99,
            index: 0,
        };
        assert_eq!(store.toggle(stranger, &mut recs), None);
        assert!(store.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn select_all_notifies_once() {
        let mut recs = records(4);
        let (tx, rx) = mpsc::channel();
        let mut store = SelectionStore::new();
        store.subscribe(tx);

        store.select_all(recs.iter_mut());
        assert_eq!(store.len(), 4);
        assert!(recs.iter().all(|r| r.selected));
        assert_eq!(size_events(&rx), vec![(0, 4)]);
    }

    #[test]
    fn deselect_all_only_touches_given_records() {
        let mut recs = records(4);
        let mut store = SelectionStore::new();
        store.select_all(recs.iter_mut());

        // Deselect the "visible" first half only
        store.deselect_all(recs[..2].iter_mut());
        assert_eq!(store.len(), 2);
        assert!(!recs[0].selected);
        assert!(recs[3].selected);
        assert_mirrored(&store, &recs);
    }

    #[test]
    fn clear_resets_everything() {
        let mut recs = records(3);
        let (tx, rx) = mpsc::channel();
        let mut store = SelectionStore::new();
        store.select_all(recs.iter_mut());
        store.subscribe(tx);

        store.clear(recs.iter_mut());
        assert!(store.is_empty());
        assert!(recs.iter().all(|r| !r.selected));
        assert_eq!(size_events(&rx), vec![(3, 0)]);
    }

    #[test]
    fn invariant_holds_across_mixed_operations() {
        let mut recs = records(6);
        let mut store = SelectionStore::new();
        let ids: Vec<RecordId> = recs.iter().map(|r| r.id).collect();

        store.toggle(ids[0], &mut recs);
        assert_mirrored(&store, &recs);
        store.select_all(recs[2..5].iter_mut());
        assert_mirrored(&store, &recs);
        store.toggle(ids[3], &mut recs);
        assert_mirrored(&store, &recs);
        store.deselect_all(recs[..3].iter_mut());
        assert_mirrored(&store, &recs);
        store.toggle(ids[5], &mut recs);
        assert_mirrored(&store, &recs);
        store.clear(recs.iter_mut());
        assert_mirrored(&store, &recs);
    }

    #[test]
    fn selected_of_preserves_collection_order() {
        let mut recs = records(5);
        let mut store = SelectionStore::new();
        let ids: Vec<RecordId> = recs.iter().map(|r| r.id).collect();

        // Click order differs from collection order
        store.toggle(ids[4], &mut recs);
        store.toggle(ids[1], &mut recs);
        store.toggle(ids[3], &mut recs);

        let names: Vec<&str> = store
            .selected_of(&recs)
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["1.png", "3.png", "4.png"]);
    }

    #[test]
    fn disconnected_subscriber_dropped() {
        let mut recs = records(1);
        let (tx, rx) = mpsc::channel();
        let mut store = SelectionStore::new();
        store.subscribe(tx);
        drop(rx);

        let id = recs[0].id;
        store.toggle(id, &mut recs);
        assert!(store.subscribers.is_empty());
        assert!(recs[0].selected);
    }
}
