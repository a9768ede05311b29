//! Per-album change notification hub.
//!
//! Subscribers are organized by album id, then by subscription id. Delivery
//! uses unbounded channels so publishing never blocks a writer, and removal
//! is synchronous so a dropped subscription never sees another event.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;

/// Storage table a change touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTable {
    Albums,
    AlbumPages,
    Pages,
    Assets,
}

impl ChangeTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeTable::Albums => "albums",
            ChangeTable::AlbumPages => "album_pages",
            ChangeTable::Pages => "pages",
            ChangeTable::Assets => "assets",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "albums" => Some(ChangeTable::Albums),
            "album_pages" => Some(ChangeTable::AlbumPages),
            "pages" => Some(ChangeTable::Pages),
            "assets" => Some(ChangeTable::Assets),
            _ => None,
        }
    }
}

/// "Something changed" for one album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub album_id: String,
    pub table: ChangeTable,
    /// Row scope when known; consumers only rely on `album_id`.
    pub row_id: Option<String>,
    /// Album version after the change.
    pub version: i64,
    /// Session that caused the change, if it came from an editor session.
    pub origin_session: Option<String>,
}

type Subscribers = HashMap<String, HashMap<u64, mpsc::UnboundedSender<ChangeEvent>>>;

pub struct ChangeNotifier {
    /// album_id -> (subscription id -> sender)
    subscribers: Mutex<Subscribers>,
    next_id: AtomicU64,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe(self: &Arc<Self>, album_id: &str) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .unwrap()
            .entry(album_id.to_string())
            .or_default()
            .insert(id, tx);
        Subscription {
            album_id: album_id.to_string(),
            id,
            receiver: rx,
            notifier: Arc::downgrade(self),
            active: true,
        }
    }

    /// Delivers `event` to every subscriber of its album. Returns how many
    /// subscribers received it; closed channels are pruned.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap();
        let Some(album_subs) = subscribers.get_mut(&event.album_id) else {
            return 0;
        };
        album_subs.retain(|_, sender| sender.send(event.clone()).is_ok());
        let delivered = album_subs.len();
        if album_subs.is_empty() {
            subscribers.remove(&event.album_id);
        }
        delivered
    }

    pub fn subscriber_count(&self, album_id: &str) -> usize {
        self.subscribers
            .lock()
            .unwrap()
            .get(album_id)
            .map_or(0, HashMap::len)
    }

    fn unregister(&self, album_id: &str, id: u64) {
        let mut subscribers = self.subscribers.lock().unwrap();
        if let Some(album_subs) = subscribers.get_mut(album_id) {
            album_subs.remove(&id);
            if album_subs.is_empty() {
                subscribers.remove(album_id);
            }
        }
    }
}

/// A live subscription to one album's changes.
pub struct Subscription {
    album_id: String,
    id: u64,
    receiver: mpsc::UnboundedReceiver<ChangeEvent>,
    notifier: Weak<ChangeNotifier>,
    active: bool,
}

impl Subscription {
    pub fn album_id(&self) -> &str {
        &self.album_id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        if !self.active {
            return None;
        }
        self.receiver.try_recv().ok()
    }

    /// Waits for the next event. Returns `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        if !self.active {
            return None;
        }
        self.receiver.recv().await
    }

    /// Removes the subscription and drops anything still buffered.
    pub fn unsubscribe(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(notifier) = self.notifier.upgrade() {
            notifier.unregister(&self.album_id, self.id);
        }
        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
