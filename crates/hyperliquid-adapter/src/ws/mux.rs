/*
[INPUT]:  Subscription registrations and inbound frames
[OUTPUT]: Callback dispatch plus the wire frames each transition requires
[POS]:    WebSocket layer - multiplexer state machine, no socket attached
[UPDATE]: When dedup, exclusivity, or replay rules change
*/

use std::collections::HashMap;

use tracing::debug;

use super::subscriptions::{message_identifier, Subscription, WsMsg};
use crate::errors::{HyperliquidError, Result};

pub type Callback = Box<dyn Fn(&WsMsg) + Send + Sync>;

/// Wire frame a state transition asks the connection to send. The state
/// machine never touches the socket itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireOp {
    Subscribe(Subscription),
    Unsubscribe(Subscription),
}

struct ActiveSubscription {
    id: u32,
    callback: Callback,
}

struct Entry {
    subscription: Subscription,
    active: Vec<ActiveSubscription>,
}

struct Queued {
    id: u32,
    subscription: Subscription,
    callback: Callback,
}

/// Fan-out state: one venue subscription per identifier, any number of
/// local callbacks behind it. Registrations made before the socket opens
/// queue up and flush on open.
#[derive(Default)]
pub struct MuxState {
    entries: HashMap<String, Entry>,
    queued: Vec<Queued>,
    next_id: u32,
    ready: bool,
}

impl MuxState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    fn is_registered(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
            || self
                .queued
                .iter()
                .any(|q| q.subscription.identifier() == identifier)
    }

    /// Register a callback. Returns the local id and, when the socket is
    /// open and this identifier was not yet subscribed, the subscribe
    /// frame to send. Exclusive identifiers reject a second registration
    /// even while disconnected.
    pub fn register(
        &mut self,
        subscription: Subscription,
        callback: Callback,
    ) -> Result<(u32, Option<WireOp>)> {
        let identifier = subscription.identifier();
        if subscription.is_exclusive() && self.is_registered(&identifier) {
            return Err(HyperliquidError::WebSocket(format!(
                "cannot subscribe to {identifier} twice"
            )));
        }
        let id = self.next_id;
        self.next_id += 1;

        if !self.ready {
            debug!(identifier, id, "queueing subscription until connected");
            self.queued.push(Queued {
                id,
                subscription,
                callback,
            });
            return Ok((id, None));
        }

        let op = match self.entries.get_mut(&identifier) {
            Some(entry) => {
                entry.active.push(ActiveSubscription { id, callback });
                None
            }
            None => {
                self.entries.insert(
                    identifier,
                    Entry {
                        subscription: subscription.clone(),
                        active: vec![ActiveSubscription { id, callback }],
                    },
                );
                Some(WireOp::Subscribe(subscription))
            }
        };
        Ok((id, op))
    }

    /// Remove one callback by id. Returns whether anything was removed
    /// and, when the last callback for an identifier goes away on an open
    /// socket, the unsubscribe frame to send.
    pub fn unregister(
        &mut self,
        subscription: &Subscription,
        id: u32,
    ) -> (bool, Option<WireOp>) {
        let identifier = subscription.identifier();

        if let Some(pos) = self
            .queued
            .iter()
            .position(|q| q.id == id && q.subscription.identifier() == identifier)
        {
            self.queued.remove(pos);
            return (true, None);
        }

        let Some(entry) = self.entries.get_mut(&identifier) else {
            return (false, None);
        };
        let before = entry.active.len();
        entry.active.retain(|active| active.id != id);
        let removed = entry.active.len() < before;
        if removed && entry.active.is_empty() {
            let subscription = self
                .entries
                .remove(&identifier)
                .map(|entry| entry.subscription);
            let op = if self.ready {
                subscription.map(WireOp::Unsubscribe)
            } else {
                None
            };
            return (removed, op);
        }
        (removed, None)
    }

    /// Socket opened: replay every active identifier (the venue holds no
    /// subscription state across sockets), then flush queued registrations
    /// in FIFO order. Queued identifiers already active dedup away.
    pub fn on_open(&mut self) -> Vec<WireOp> {
        self.ready = true;
        let mut ops: Vec<WireOp> = self
            .entries
            .values()
            .map(|entry| WireOp::Subscribe(entry.subscription.clone()))
            .collect();
        for queued in std::mem::take(&mut self.queued) {
            let identifier = queued.subscription.identifier();
            let active = ActiveSubscription {
                id: queued.id,
                callback: queued.callback,
            };
            match self.entries.get_mut(&identifier) {
                Some(entry) => entry.active.push(active),
                None => {
                    ops.push(WireOp::Subscribe(queued.subscription.clone()));
                    self.entries.insert(
                        identifier,
                        Entry {
                            subscription: queued.subscription,
                            active: vec![active],
                        },
                    );
                }
            }
        }
        ops
    }

    /// Socket lost: entries stay for replay, nothing sends until reopen.
    pub fn on_close(&mut self) {
        self.ready = false;
    }

    /// Dispatch a frame to its callbacks in registration order. Returns
    /// how many callbacks fired.
    pub fn route(&self, msg: &WsMsg) -> usize {
        let Some(identifier) = message_identifier(msg) else {
            return 0;
        };
        let Some(entry) = self.entries.get(&identifier) else {
            debug!(identifier, channel = %msg.channel, "frame for inactive identifier");
            return 0;
        };
        for active in &entry.active {
            (active.callback)(msg);
        }
        entry.active.len()
    }
}
