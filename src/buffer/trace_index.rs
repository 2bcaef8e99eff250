//! Per-trace secondary index with bounded footprint.
//!
//! # Responsibilities
//! - Group records (logs, metric samples) by the trace_id they were emitted under
//! - Cap the number of records kept per trace
//! - Cap the number of traces indexed at once (oldest trace evicted first)
//! - Let the owner drop a trace's records when the trace itself leaves history

use std::collections::{HashMap, VecDeque};

#[derive(Debug)]
struct Slot<T> {
    generation: u64,
    records: VecDeque<T>,
}

/// Records grouped by trace_id.
#[derive(Debug)]
pub struct TraceIndex<T> {
    slots: HashMap<String, Slot<T>>,
    /// Insertion order of trace ids, tagged with the generation they were
    /// inserted under. Entries whose generation no longer matches are stale.
    order: VecDeque<(String, u64)>,
    next_generation: u64,
    max_traces: usize,
    max_per_trace: usize,
}

impl<T> TraceIndex<T> {
    pub fn new(max_traces: usize, max_per_trace: usize) -> Self {
        Self {
            slots: HashMap::new(),
            order: VecDeque::new(),
            next_generation: 0,
            max_traces: max_traces.max(1),
            max_per_trace: max_per_trace.max(1),
        }
    }

    /// Index `record` under `trace_id`.
    pub fn insert(&mut self, trace_id: &str, record: T) {
        if !self.slots.contains_key(trace_id) {
            while self.slots.len() >= self.max_traces {
                if !self.evict_oldest() {
                    break;
                }
            }
            let generation = self.next_generation;
            self.next_generation += 1;
            self.slots.insert(
                trace_id.to_string(),
                Slot {
                    generation,
                    records: VecDeque::new(),
                },
            );
            self.order.push_back((trace_id.to_string(), generation));
        }

        if let Some(slot) = self.slots.get_mut(trace_id) {
            if slot.records.len() >= self.max_per_trace {
                slot.records.pop_front();
            }
            slot.records.push_back(record);
        }
    }

    pub fn get(&self, trace_id: &str) -> Option<&VecDeque<T>> {
        self.slots.get(trace_id).map(|slot| &slot.records)
    }

    /// Drop everything indexed under `trace_id`.
    pub fn remove(&mut self, trace_id: &str) -> Option<VecDeque<T>> {
        let removed = self.slots.remove(trace_id).map(|slot| slot.records);
        if self.order.len() > self.max_traces.saturating_mul(2) {
            let slots = &self.slots;
            self.order
                .retain(|(id, generation)| slots.get(id).is_some_and(|s| s.generation == *generation));
        }
        removed
    }

    /// Number of traces currently indexed.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn evict_oldest(&mut self) -> bool {
        while let Some((id, generation)) = self.order.pop_front() {
            let live = self
                .slots
                .get(&id)
                .is_some_and(|slot| slot.generation == generation);
            if live {
                self.slots.remove(&id);
                return true;
            }
        }
        false
    }
}
