// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cost-accounting subscriber (spec §4.10).
//!
//! Listens for `task:routed` to learn which agent/provider/billing mode a
//! task was sent to, then writes the ledger row once the task reaches a
//! terminal event. A task that never got routed (no cache entry) produces
//! no cost row — there is nothing to bill.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use substrate_core::{
    clock::{Clock, SystemClock},
    cost::BillingMode,
    event::TaskResult,
    ids::{AdapterId, SessionId, TaskId},
    CostEntry, Event, EventBus,
};
use substrate_storage::Store;

/// Per-million-token pricing used to turn a token count into a dollar
/// estimate, both for pre-dispatch budget gating and for the cost ledger.
/// A flat rate rather than a per-adapter table: spec §4.10 leaves exact
/// vendor pricing unspecified and this keeps the estimate adapter-agnostic.
pub const INPUT_COST_PER_MILLION_TOKENS_USD: f64 = 3.0;
pub const OUTPUT_COST_PER_MILLION_TOKENS_USD: f64 = 15.0;

pub fn estimate_cost_usd(input_tokens: u64, output_tokens: u64) -> f64 {
    (input_tokens as f64 / 1_000_000.0) * INPUT_COST_PER_MILLION_TOKENS_USD
        + (output_tokens as f64 / 1_000_000.0) * OUTPUT_COST_PER_MILLION_TOKENS_USD
}

#[derive(Debug, Clone)]
struct RoutingInfo {
    agent: AdapterId,
    provider: String,
    model: String,
    billing_mode: BillingMode,
}

/// Subscribes to the routing/completion events and maintains the
/// append-only cost ledger (spec §4.10, §8 invariant 2).
#[derive(Clone)]
pub struct CostTracker {
    store: Arc<Store>,
    bus: EventBus,
    routing: Arc<Mutex<HashMap<(SessionId, TaskId), RoutingInfo>>>,
}

impl CostTracker {
    pub fn new(store: Arc<Store>, bus: EventBus) -> Self {
        Self {
            store,
            bus,
            routing: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Subscribe this tracker's handlers (spec §4.10). Call once per
    /// daemon/process lifetime.
    pub fn install(&self) {
        let routed = self.clone();
        self.bus.subscribe("task:routed", move |event| {
            if let Event::TaskRouted {
                session_id,
                task_id,
                agent,
                provider,
                model,
                billing_mode,
            } = event
            {
                routed.routing.lock().insert(
                    (session_id.clone(), task_id.clone()),
                    RoutingInfo {
                        agent: agent.clone(),
                        provider: provider.clone(),
                        model: model.clone(),
                        billing_mode: *billing_mode,
                    },
                );
            }
        });

        let complete = self.clone();
        self.bus.subscribe("task:complete", move |event| {
            if let Event::TaskComplete {
                session_id,
                task_id,
                result,
            } = event
            {
                if let Err(e) = complete.record_completion(session_id, task_id, result) {
                    tracing::error!(%session_id, %task_id, error = %e, "failed to record task cost");
                }
            }
        });

        let failed = self.clone();
        self.bus.subscribe("task:failed", move |event| {
            if let Event::TaskFailed {
                session_id,
                task_id,
                ..
            } = event
            {
                if let Err(e) = failed.record_failure(session_id, task_id) {
                    tracing::error!(%session_id, %task_id, error = %e, "failed to record zero-cost entry");
                }
            }
        });
    }

    fn record_completion(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
        result: &TaskResult,
    ) -> Result<(), substrate_storage::StoreError> {
        let Some(info) = self
            .routing
            .lock()
            .remove(&(session_id.clone(), task_id.clone()))
        else {
            return Ok(());
        };
        if info.billing_mode == BillingMode::Unavailable {
            return Ok(());
        }

        let tokens = result.tokens_used.unwrap_or_default();
        let cost_usd = estimate_cost_usd(tokens.input, tokens.output);
        // A subscription-billed call has no marginal dollar cost but displaces
        // what an API call would otherwise have cost; track that as savings.
        let savings_usd = if info.billing_mode == BillingMode::Subscription {
            cost_usd
        } else {
            0.0
        };
        let now_ms = SystemClock.now_ms();

        self.store.insert_cost_entry(&CostEntry {
            session_id: session_id.clone(),
            task_id: task_id.clone(),
            agent: info.agent,
            provider: info.provider,
            model: info.model,
            input_tokens: tokens.input,
            output_tokens: tokens.output,
            cost_usd: if info.billing_mode == BillingMode::Subscription {
                0.0
            } else {
                cost_usd
            },
            savings_usd,
            billing_mode: info.billing_mode,
            created_at_ms: now_ms,
        })?;

        if info.billing_mode != BillingMode::Subscription {
            self.store.add_session_cost(session_id, cost_usd, now_ms)?;
        }
        Ok(())
    }

    fn record_failure(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
    ) -> Result<(), substrate_storage::StoreError> {
        let Some(info) = self
            .routing
            .lock()
            .remove(&(session_id.clone(), task_id.clone()))
        else {
            return Ok(());
        };
        if info.billing_mode == BillingMode::Unavailable {
            return Ok(());
        }

        self.store.insert_cost_entry(&CostEntry {
            session_id: session_id.clone(),
            task_id: task_id.clone(),
            agent: info.agent,
            provider: info.provider,
            model: info.model,
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
            savings_usd: 0.0,
            billing_mode: info.billing_mode,
            created_at_ms: SystemClock.now_ms(),
        })
    }
}

#[cfg(test)]
#[path = "cost_tests.rs"]
mod tests;
