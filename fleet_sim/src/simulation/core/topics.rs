// fleet_sim/src/simulation/core/topics.rs

//! Outgoing side channel. Every device gets one bounded topic per channel
//! (`<base_topic>/pose`, `<base_topic>/detection`). Nothing in the engine
//! reads these back; subscribers only ever see the most recent messages.

use bevy::prelude::*;
use downcast_rs::{impl_downcast, Downcast};
use std::collections::{BTreeMap, VecDeque};

/// Messages kept per notification topic before the oldest is dropped.
pub const NOTIFICATION_TOPIC_CAPACITY: usize = 64;

/// Type-erased storage so topics of different message types share one map.
pub trait ErasedTopic: Downcast + Send + Sync {
    fn len(&self) -> usize;
    fn dropped(&self) -> u64;
}
impl_downcast!(ErasedTopic);

#[derive(Clone, Debug, PartialEq)]
pub struct Sequenced<T> {
    pub seq: u64,
    pub message: T,
}

/// A ring buffer of the latest `capacity` messages.
#[derive(Debug)]
pub struct Topic<T> {
    ring: VecDeque<Sequenced<T>>,
    capacity: usize,
    next_seq: u64,
    dropped: u64,
}

impl<T: Clone + Send + Sync + 'static> Topic<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ring: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            next_seq: 0,
            dropped: 0,
        }
    }

    pub fn push(&mut self, message: T) -> u64 {
        if self.ring.len() == self.capacity {
            self.ring.pop_front();
            self.dropped += 1;
        }
        let seq = self.next_seq;
        self.ring.push_back(Sequenced { seq, message });
        self.next_seq += 1;
        seq
    }

    pub fn latest(&self) -> Option<&T> {
        self.ring.back().map(|s| &s.message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sequenced<T>> {
        self.ring.iter()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl<T: Clone + Send + Sync + 'static> ErasedTopic for Topic<T> {
    fn len(&self) -> usize {
        self.ring.len()
    }

    fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Which notification channel a topic carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    Pose,
    Detection,
}

struct Entry {
    topic: Box<dyn ErasedTopic>,
    kind: TopicKind,
    device: String,
}

#[derive(Resource, Default)]
pub struct TopicBus {
    entries: BTreeMap<String, Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The topic exists but carries another message type.
    TypeMismatch(String),
}

impl TopicBus {
    /// Publishes `message`, creating the topic on first use. Returns the
    /// message's sequence number.
    pub fn publish<T: Clone + Send + Sync + 'static>(
        &mut self,
        name: &str,
        kind: TopicKind,
        device: &str,
        message: T,
    ) -> Result<u64, PublishError> {
        let entry = self.entries.entry(name.to_string()).or_insert_with(|| Entry {
            topic: Box::new(Topic::<T>::with_capacity(NOTIFICATION_TOPIC_CAPACITY)),
            kind,
            device: device.to_string(),
        });
        entry
            .topic
            .downcast_mut::<Topic<T>>()
            .map(|topic| topic.push(message))
            .ok_or_else(|| PublishError::TypeMismatch(name.to_string()))
    }

    pub fn topic<T: Clone + Send + Sync + 'static>(&self, name: &str) -> Option<&Topic<T>> {
        self.entries
            .get(name)
            .and_then(|e| e.topic.downcast_ref::<Topic<T>>())
    }

    /// Topic names of one kind owned by `device`, sorted.
    pub fn topics_of(&self, device: &str, kind: TopicKind) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, e)| e.device == device && e.kind == kind)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Messages evicted from full topics, across the whole bus.
    pub fn dropped(&self) -> u64 {
        self.entries.values().map(|e| e.topic.dropped()).sum()
    }
}
