//! Search channel: a single-slot broadcast cell for the latest query.
//!
//! The channel holds the most recently published search string and fans
//! each publish out to every live subscriber exactly once. Subscribing
//! returns a guard; dropping it releases the binding, so a table core
//! that goes away cannot leak its callback into the channel.

use std::sync::{Arc, Mutex, Weak};

type SubscriberFn = Arc<dyn Fn(&str) + Send + Sync>;

struct ChannelInner {
    latest: Option<String>,
    subscribers: Vec<(usize, SubscriberFn)>,
    next_id: usize,
}

/// Shared handle to a search channel.
#[derive(Clone)]
pub struct SearchChannel {
    inner: Arc<Mutex<ChannelInner>>,
}

impl SearchChannel {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChannelInner {
                latest: None,
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// The most recently published query, if any.
    pub fn latest(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .latest
            .clone()
    }

    /// Publish a new query. Every current subscriber is invoked exactly
    /// once with the value.
    pub fn publish(&self, query: &str) {
        // Snapshot the callbacks so a subscriber that publishes or
        // subscribes re-entrantly does not deadlock on the channel lock.
        let callbacks: Vec<SubscriberFn> = {
            let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            guard.latest = Some(query.to_string());
            guard
                .subscribers
                .iter()
                .map(|(_, f)| Arc::clone(f))
                .collect()
        };
        for callback in callbacks {
            callback(query);
        }
    }

    /// Register a callback for future publishes. The returned guard
    /// unsubscribes when dropped; publishes made before subscribing are
    /// observed through [`SearchChannel::latest`], not replayed.
    pub fn subscribe(&self, f: impl Fn(&str) + Send + Sync + 'static) -> Subscription {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let id = guard.next_id;
        guard.next_id += 1;
        guard.subscribers.push((id, Arc::new(f)));
        Subscription {
            id,
            channel: Arc::downgrade(&self.inner),
        }
    }
}

impl Default for SearchChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard for one subscription. Dropping it releases the binding.
pub struct Subscription {
    id: usize,
    channel: Weak<Mutex<ChannelInner>>,
}

impl Subscription {
    /// Release the subscription explicitly.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.channel.upgrade() {
            let mut guard = inner.lock().unwrap_or_else(|e| e.into_inner());
            guard.subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Host-side navigation for keeping the page URL in step with the
/// search query. Implementations must replace the current history entry
/// rather than pushing a new one.
pub trait Navigator: Send + Sync {
    fn replace_query_param(&self, key: &str, value: &str);
}

/// Write the query into the URL's `search` parameter, URL-encoded.
pub(crate) fn sync_search_param(navigator: &dyn Navigator, query: &str) {
    navigator.replace_query_param("search", &urlencoding::encode(query));
}
