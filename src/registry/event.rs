//! Ordered per-event subscriber buckets

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use crate::core::context::Context;
use crate::core::event::{ClientEvent, DispatchOutcome, EventContext, EventRoutine, Flow};
use crate::core::module::Origin;
use crate::core::report::ErrorContext;
use crate::error::ResultExt;

type Bucket = IndexMap<Origin, EventRoutine>;

/// Event name to subscribers, each bucket kept in registration order.
#[derive(Default)]
pub struct EventRegistry {
    buckets: RwLock<HashMap<String, Bucket>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, origin: &Origin, events: IndexMap<String, EventRoutine>) {
        let mut buckets = self.buckets.write();
        for (name, routine) in events {
            tracing::trace!(origin = %origin, event = %name, "subscribing");
            buckets.entry(name).or_default().insert(origin.clone(), routine);
        }
    }

    /// Walk the subscribers of `event` in order until one halts or fails.
    ///
    /// The bucket is snapshotted first, so handlers may register or unload
    /// modules without deadlocking the walk.
    pub async fn dispatch(&self, ctx: &Context, event: Arc<ClientEvent>) -> DispatchOutcome {
        let name = event.name().to_string();
        let subscribers: Vec<(Origin, EventRoutine)> = match self.buckets.read().get(&name) {
            Some(bucket) => bucket
                .iter()
                .map(|(origin, routine)| (origin.clone(), Arc::clone(routine)))
                .collect(),
            None => return DispatchOutcome::Completed,
        };

        for (origin, routine) in subscribers {
            let ecx = EventContext {
                ctx: ctx.with_module(origin.clone()),
                event: Arc::clone(&event),
            };
            match routine(ecx).await.with_event(&name) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Halt) => {
                    tracing::debug!(event = %name, origin = %origin, "dispatch halted");
                    return DispatchOutcome::Halted { origin };
                }
                Err(e) => {
                    ctx.report(
                        &e,
                        &ErrorContext::Event {
                            name: name.clone(),
                            origin: Some(origin.clone()),
                        },
                    );
                    return DispatchOutcome::Failed { origin };
                }
            }
        }

        DispatchOutcome::Completed
    }

    /// Remove `origin` from every bucket, keeping the order of the rest.
    pub fn unload_origin(&self, origin: &Origin) -> usize {
        let mut buckets = self.buckets.write();
        let mut removed = 0;
        for bucket in buckets.values_mut() {
            if bucket.shift_remove(origin).is_some() {
                removed += 1;
            }
        }
        buckets.retain(|_, bucket| !bucket.is_empty());
        removed
    }

    pub fn subscribers(&self, name: &str) -> Vec<Origin> {
        self.buckets
            .read()
            .get(name)
            .map(|bucket| bucket.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_subscribed(&self, origin: &Origin) -> bool {
        self.buckets.read().values().any(|bucket| bucket.contains_key(origin))
    }

    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.buckets.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn clear(&self) {
        self.buckets.write().clear();
    }
}
