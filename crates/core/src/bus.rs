// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed, in-process, synchronous publish/subscribe event bus (spec §4.2).
//!
//! Delivery is strictly in publish order on a single logical thread: handlers
//! run to completion before the next subscriber is invoked and before `emit`
//! returns. A subscriber may itself call `emit` (the bus is reentrant-safe up
//! to [`MAX_REENTRANCY_DEPTH`]); a subscriber that panics is caught so it
//! cannot abort delivery to the rest, or propagate to the emitter.

use crate::event::Event;
use parking_lot::Mutex;
use std::cell::Cell;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Recursion cap for subscribers that emit events of their own from within a handler.
pub const MAX_REENTRANCY_DEPTH: usize = 64;

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

struct Registration {
    token: u64,
    handler: Handler,
}

/// A typed, synchronous, in-process event bus.
///
/// The bus is the only cross-module coupling mechanism inside the
/// orchestration core (spec §4.2): the engine, pool manager, session
/// controller, and cost-accounting subscriber never call each other
/// directly, only through `emit`/`subscribe`.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<HashMap<&'static str, Vec<Registration>>>>,
    next_token: Arc<Mutex<u64>>,
}

/// A handle returned by [`EventBus::subscribe`] that can later be passed to
/// [`EventBus::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId {
    event_name: &'static str,
    token: u64,
}

thread_local! {
    static EMIT_DEPTH: Cell<usize> = const { Cell::new(0) };
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a named event. Returns a token usable with [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe(
        &self,
        event_name: &'static str,
        handler: impl Fn(&Event) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let token = {
            let mut next = self.next_token.lock();
            let t = *next;
            *next += 1;
            t
        };
        self.subscribers
            .lock()
            .entry(event_name)
            .or_default()
            .push(Registration {
                token,
                handler: Arc::new(handler),
            });
        SubscriptionId { event_name, token }
    }

    /// Deregister a previously registered handler. No-op if already removed.
    pub fn unsubscribe(&self, subscription: SubscriptionId) {
        if let Some(handlers) = self.subscribers.lock().get_mut(subscription.event_name) {
            handlers.retain(|r| r.token != subscription.token);
        }
    }

    /// Publish an event to every subscriber registered for its name, in
    /// registration order. Returns once all subscribers have run.
    ///
    /// Panics inside a subscriber are caught and swallowed (the event bus
    /// logs them via `tracing`) so one bad handler cannot prevent delivery
    /// to the rest, or unwind into the emitter.
    pub fn emit(&self, event: Event) {
        let depth = EMIT_DEPTH.with(|d| d.get());
        if depth >= MAX_REENTRANCY_DEPTH {
            tracing::error!(
                event = event.name(),
                depth,
                "event bus reentrancy depth exceeded, dropping event"
            );
            return;
        }

        let name = event.name();
        // Clone the handler list (cheap Arc bumps) and release the lock before
        // dispatch, so a subscriber is free to call subscribe/unsubscribe/emit
        // from within its own handler without deadlocking on this mutex.
        let handlers: Vec<Handler> = {
            let guard = self.subscribers.lock();
            guard
                .get(name)
                .map(|regs| regs.iter().map(|r| r.handler.clone()).collect())
                .unwrap_or_default()
        };

        EMIT_DEPTH.with(|d| d.set(depth + 1));
        for handler in &handlers {
            let result = panic::catch_unwind(AssertUnwindSafe(|| handler(&event)));
            if let Err(payload) = result {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                tracing::error!(event = name, %message, "event bus subscriber panicked");
            }
        }
        EMIT_DEPTH.with(|d| d.set(depth));
    }

    /// Number of subscribers currently registered for `event_name` (test/debug helper).
    pub fn subscriber_count(&self, event_name: &str) -> usize {
        self.subscribers
            .lock()
            .get(event_name)
            .map(|v| v.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
