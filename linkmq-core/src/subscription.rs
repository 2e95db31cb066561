//! Prefix subscriptions for SUB sockets.
//!
//! The in-process publisher consults each subscriber's filter before queueing
//! a message for it, the same way libzmq filters on the publishing side.

use bytes::Bytes;

/// A subscription entry with topic prefix
#[derive(Debug, Clone)]
pub struct Subscription {
    /// Topic prefix (empty = subscribe to all)
    pub prefix: Bytes,
}

impl Subscription {
    /// Create a new subscription for a topic prefix
    #[must_use]
    pub const fn new(prefix: Bytes) -> Self {
        Self { prefix }
    }

    /// Check if this subscription matches a given message
    #[must_use]
    pub fn matches(&self, message: &[u8]) -> bool {
        message.starts_with(&self.prefix)
    }
}

/// Set of prefix subscriptions held by one subscriber.
#[derive(Debug, Default)]
pub struct SubscriptionFilter {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionFilter {
    /// Create a new empty filter. An empty filter delivers nothing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Add a subscription
    pub fn subscribe(&mut self, prefix: &[u8]) {
        // Don't add duplicates
        if !self.subscriptions.iter().any(|s| s.prefix == prefix) {
            self.subscriptions
                .push(Subscription::new(Bytes::copy_from_slice(prefix)));
        }
    }

    /// Check if a message matches any subscription
    #[must_use]
    pub fn matches(&self, message: &[u8]) -> bool {
        self.subscriptions.iter().any(|s| s.matches(message))
    }
}
