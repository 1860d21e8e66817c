//! Running listeners in dependency order.
//!
//! Both entry points resolve the event's registry exactly once, before any
//! listener runs, so a cyclic graph fails the emission without side
//! effects. From then on the computed order is followed as-is.

use futures::future::FutureExt;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, trace};

use depemit_graph::{group, sort};
use depemit_types::Listener;

use crate::config::LayerFailurePolicy;
use crate::emitter::EventEmitter;
use crate::error::{EmitError, EmitResult};
use crate::results::EmitResults;

impl<A, T> EventEmitter<A, T>
where
    A: Clone + Send + Sync + 'static,
    T: Send + 'static,
{
    /// Run every listener of `event` one at a time in topological order.
    ///
    /// Each listener is awaited before the next one starts. The first
    /// failure stops the emission; listeners after it do not run. `once`
    /// listeners are removed right after they succeed, before the next
    /// listener starts. Emitting an event without listeners yields empty
    /// results.
    pub async fn emit_series(&self, event: &str, args: A) -> EmitResult<EmitResults<A, T>> {
        let listeners: Vec<Listener<A, T>> = {
            let events = self.inner.events.lock();
            match events.get(event) {
                Some(registry) => sort(registry)?
                    .into_iter()
                    .map(|wrapper| wrapper.listener().clone())
                    .collect(),
                None => Vec::new(),
            }
        };

        debug!(event, listeners = listeners.len(), "emitting in series");
        let mut results = EmitResults::with_capacity(listeners.len());

        for listener in listeners {
            let id = listener.id();
            trace!(event, listener = %id, "invoking listener");
            let value = listener
                .call(args.clone())
                .await
                .map_err(|source| EmitError::Listener {
                    event: event.to_string(),
                    listener: id,
                    source,
                })?;
            self.retire_once(event, id);
            trace!(event, listener = %id, "listener completed");
            results.insert(listener, value);
        }

        Ok(results)
    }

    /// Run the listeners of `event` layer by layer.
    ///
    /// Every listener of a layer is spawned onto the tokio runtime at once
    /// and the whole layer is awaited before the next one starts. A failure
    /// fails the emission according to the configured
    /// [`LayerFailurePolicy`]; siblings that already started are never
    /// cancelled and finish in the background. `once` listeners are removed
    /// as soon as they succeed.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn emit(&self, event: &str, args: A) -> EmitResult<EmitResults<A, T>> {
        let layers: Vec<Vec<Listener<A, T>>> = {
            let events = self.inner.events.lock();
            match events.get(event) {
                Some(registry) => group(registry)?
                    .into_iter()
                    .map(|layer| {
                        layer
                            .into_iter()
                            .map(|wrapper| wrapper.listener().clone())
                            .collect()
                    })
                    .collect(),
                None => Vec::new(),
            }
        };

        debug!(event, layers = layers.len(), "emitting in layers");
        let policy = self.inner.config.layer_failure;
        let mut results = EmitResults::with_capacity(layers.iter().map(Vec::len).sum());

        for (depth, layer) in layers.into_iter().enumerate() {
            trace!(event, depth, listeners = layer.len(), "starting layer");
            let mut running: FuturesUnordered<_> = layer
                .into_iter()
                .map(|listener| {
                    let id = listener.id();
                    let task = tokio::spawn(self.clone().invoke_detached(
                        event.to_string(),
                        listener,
                        args.clone(),
                    ));
                    task.map(move |joined| (id, joined))
                })
                .collect();

            let mut failure = None;
            while let Some((id, joined)) = running.next().await {
                let err = match joined {
                    Ok(Ok((listener, value))) => {
                        results.insert(listener, value);
                        continue;
                    }
                    Ok(Err(source)) => EmitError::Listener {
                        event: event.to_string(),
                        listener: id,
                        source,
                    },
                    Err(join) => EmitError::Join {
                        event: event.to_string(),
                        listener: id,
                        reason: join.to_string(),
                    },
                };
                match policy {
                    LayerFailurePolicy::FailFast => return Err(err),
                    LayerFailurePolicy::SettleLayer => {
                        failure.get_or_insert(err);
                    }
                }
            }

            if let Some(err) = failure {
                return Err(err);
            }
        }

        Ok(results)
    }

    /// One listener invocation as a self-contained task, including the
    /// `once` bookkeeping, so it completes even if nobody awaits it.
    async fn invoke_detached(
        self,
        event: String,
        listener: Listener<A, T>,
        args: A,
    ) -> anyhow::Result<(Listener<A, T>, T)> {
        let id = listener.id();
        trace!(event = %event, listener = %id, "invoking listener");
        let value = listener.call(args).await?;
        self.retire_once(&event, id);
        trace!(event = %event, listener = %id, "listener completed");
        Ok((listener, value))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use tokio::sync::Barrier;

    use super::*;
    use crate::config::EmitterConfig;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    /// A listener that yields once, then appends `name` to `log`.
    fn recording(name: &'static str, log: &Log) -> Listener<(), &'static str> {
        let log = Arc::clone(log);
        Listener::new(move |_| {
            let log = Arc::clone(&log);
            async move {
                tokio::task::yield_now().await;
                log.lock().push(name);
                Ok(name)
            }
        })
    }

    fn position(log: &Log, name: &str) -> usize {
        log.lock().iter().position(|entry| *entry == name).unwrap()
    }

    /// d -> [b, c], b (once) -> [a], c -> [a], registered as d, b, c.
    fn diamond(
        log: &Log,
    ) -> (
        EventEmitter<(), &'static str>,
        [Listener<(), &'static str>; 4],
    ) {
        let emitter = EventEmitter::new();
        let (a, b, c, d) = (
            recording("a", log),
            recording("b", log),
            recording("c", log),
            recording("d", log),
        );
        emitter.on("t", &d, &[b.clone(), c.clone()]).unwrap();
        emitter.once("t", &b, &[a.clone()]).unwrap();
        emitter.on("t", &c, &[a.clone()]).unwrap();
        (emitter, [a, b, c, d])
    }

    #[tokio::test]
    async fn empty_event_resolves_to_empty_results() {
        let emitter: EventEmitter<(), ()> = EventEmitter::new();
        assert!(emitter.emit("test", ()).await.unwrap().is_empty());
        assert!(emitter.emit_series("test", ()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn parallel_diamond_respects_layers_and_retires_once() {
        let log: Log = Arc::default();
        let (emitter, [a, b, c, d]) = diamond(&log);

        let results = emitter.emit("t", ()).await.unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(results.get(&d), Some(&"d"));
        assert!(position(&log, "a") < position(&log, "b"));
        assert!(position(&log, "a") < position(&log, "c"));
        assert!(position(&log, "b") < position(&log, "d"));
        assert!(position(&log, "c") < position(&log, "d"));

        assert!(emitter.has_listener("t", &a));
        assert!(!emitter.has_listener("t", &b));
        assert!(emitter.has_listener("t", &c));
        assert!(emitter.has_listener("t", &d));

        // a was only ever a placeholder; losing its last consumer drops it.
        emitter.off("t", &c);
        assert!(!emitter.has_listener("t", &a));
        assert!(!emitter.has_listener("t", &c));
        assert!(emitter.has_listener("t", &d));
    }

    #[tokio::test]
    async fn series_runs_in_topological_order() {
        let log: Log = Arc::default();
        let (emitter, [_, b, _, d]) = diamond(&log);

        let results = emitter.emit_series("t", ()).await.unwrap();
        let order: Vec<&str> = results.iter().map(|(_, name)| *name).collect();
        assert_eq!(order, *log.lock());
        assert_eq!(order.first(), Some(&"a"));
        assert_eq!(order.last(), Some(&"d"));
        assert!(!emitter.has_listener("t", &b));
        assert!(emitter.has_listener("t", &d));
    }

    #[tokio::test]
    async fn series_never_overlaps_listeners() {
        let active = Arc::new(AtomicUsize::new(0));
        let emitter: EventEmitter<(), ()> = EventEmitter::new();
        for _ in 0..4 {
            let active = Arc::clone(&active);
            let listener = Listener::new(move |_| {
                let active = Arc::clone(&active);
                async move {
                    assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            });
            emitter.on("t", &listener, &[]).unwrap();
        }
        assert_eq!(emitter.emit_series("t", ()).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn layer_members_run_concurrently() {
        // Both listeners wait on the same barrier, so neither can finish
        // unless the other one is in flight at the same time.
        let barrier = Arc::new(Barrier::new(2));
        let emitter: EventEmitter<(), ()> = EventEmitter::new();
        for _ in 0..2 {
            let barrier = Arc::clone(&barrier);
            let listener = Listener::new(move |_| {
                let barrier = Arc::clone(&barrier);
                async move {
                    barrier.wait().await;
                    Ok(())
                }
            });
            emitter.on("t", &listener, &[]).unwrap();
        }
        let results = tokio::time::timeout(Duration::from_secs(5), emitter.emit("t", ()))
            .await
            .expect("layer members must not run one after another")
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn circular_dependency_runs_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let emitter: EventEmitter<(), ()> = EventEmitter::new();
        let make = || -> Listener<(), ()> {
            let calls = Arc::clone(&calls);
            Listener::sync(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };
        let (f, g, h) = (make(), make(), make());
        emitter.on("t", &f, &[g.clone()]).unwrap();
        emitter.on("t", &g, &[h.clone()]).unwrap();
        emitter.on("t", &h, &[f.clone()]).unwrap();

        let err = emitter.emit("t", ()).await.unwrap_err();
        assert!(err.is_circular());
        assert_eq!(err.code(), "CIRCULAR_REFERENCE");
        let err = emitter.emit_series("t", ()).await.unwrap_err();
        assert!(err.is_circular());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(emitter.sorted_listener_list("t").is_err());
    }

    #[tokio::test]
    async fn series_failure_stops_later_listeners() {
        let log: Log = Arc::default();
        let emitter: EventEmitter<(), &'static str> = EventEmitter::new();
        let first = recording("first", &log);
        let failing: Listener<(), &'static str> =
            Listener::sync(|_| Err(anyhow::anyhow!("listener exploded")));
        let last = recording("last", &log);
        emitter.once("t", &first, &[]).unwrap();
        emitter.on("t", &failing, &[first.clone()]).unwrap();
        emitter.on("t", &last, &[failing.clone()]).unwrap();

        let err = emitter.emit_series("t", ()).await.unwrap_err();
        assert_eq!(err.listener(), failing.id());
        assert_eq!(err.code(), "LISTENER_FAILED");
        assert!(err.to_string().contains("listener exploded"));
        assert_eq!(*log.lock(), vec!["first"]);
        assert!(!emitter.has_listener("t", &first), "succeeded once listener is retired");
        assert!(emitter.has_listener("t", &last));
    }

    #[tokio::test]
    async fn failed_once_listener_stays_registered() {
        let emitter: EventEmitter<(), ()> = EventEmitter::new();
        let failing: Listener<(), ()> = Listener::sync(|_| Err(anyhow::anyhow!("nope")));
        emitter.once("t", &failing, &[]).unwrap();
        assert!(emitter.emit("t", ()).await.is_err());
        assert!(emitter.has_listener("t", &failing));
    }

    #[tokio::test]
    async fn fail_fast_leaves_siblings_running() {
        let finished = Arc::new(AtomicBool::new(false));
        let emitter: EventEmitter<(), ()> = EventEmitter::new();
        let slow: Listener<(), ()> = {
            let finished = Arc::clone(&finished);
            Listener::new(move |_| {
                let finished = Arc::clone(&finished);
                async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    finished.store(true, Ordering::SeqCst);
                    Ok(())
                }
            })
        };
        let failing: Listener<(), ()> = Listener::sync(|_| Err(anyhow::anyhow!("fail")));
        let after: Listener<(), ()> = Listener::sync(|_| Ok(()));
        emitter.once("t", &slow, &[]).unwrap();
        emitter.on("t", &failing, &[]).unwrap();
        emitter.on("t", &after, &[slow.clone(), failing.clone()]).unwrap();

        let err = emitter.emit("t", ()).await.unwrap_err();
        assert_eq!(err.listener(), failing.id());
        assert!(!finished.load(Ordering::SeqCst), "failure surfaced before sibling finished");

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(finished.load(Ordering::SeqCst));
        assert!(!emitter.has_listener("t", &slow), "detached once listener still retires");
    }

    #[tokio::test]
    async fn settle_layer_waits_for_siblings() {
        let finished = Arc::new(AtomicBool::new(false));
        let emitter: EventEmitter<(), ()> = EventEmitter::with_config(EmitterConfig {
            layer_failure: LayerFailurePolicy::SettleLayer,
            ..Default::default()
        });
        let slow: Listener<(), ()> = {
            let finished = Arc::clone(&finished);
            Listener::new(move |_| {
                let finished = Arc::clone(&finished);
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    finished.store(true, Ordering::SeqCst);
                    Ok(())
                }
            })
        };
        let failing: Listener<(), ()> = Listener::sync(|_| Err(anyhow::anyhow!("fail")));
        let never: Listener<(), ()> = Listener::sync(|_| panic!("later layers must not start"));
        emitter.on("t", &slow, &[]).unwrap();
        emitter.on("t", &failing, &[]).unwrap();
        emitter.on("t", &never, &[slow.clone()]).unwrap();

        let err = emitter.emit("t", ()).await.unwrap_err();
        assert_eq!(err.listener(), failing.id());
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn panicking_listener_is_reported() {
        let emitter: EventEmitter<(), ()> = EventEmitter::new();
        let panicking: Listener<(), ()> = Listener::sync(|_| panic!("listener panicked"));
        emitter.on("t", &panicking, &[]).unwrap();
        let err = emitter.emit("t", ()).await.unwrap_err();
        assert_eq!(err.code(), "LISTENER_ABORTED");
        assert_eq!(err.listener(), panicking.id());
    }

    #[tokio::test]
    async fn arguments_reach_every_listener() {
        let emitter: EventEmitter<(u32, u32), u32> = EventEmitter::new();
        let sum = Listener::sync(|(x, y): (u32, u32)| Ok(x + y));
        let product = Listener::new(|(x, y): (u32, u32)| async move { Ok(x * y) });
        emitter.on("calc", &sum, &[]).unwrap();
        emitter.on("calc", &product, &[sum.clone()]).unwrap();

        let results = emitter.emit("calc", (6, 7)).await.unwrap();
        assert_eq!(results.get(&sum), Some(&13));
        assert_eq!(results.get(&product), Some(&42));
        let results = emitter.emit_series("calc", (2, 3)).await.unwrap();
        assert_eq!(results.into_values(), vec![5, 6]);
    }

    #[tokio::test]
    async fn once_removal_is_visible_to_later_listeners() {
        let emitter: EventEmitter<(), bool> = EventEmitter::new();
        let first: Listener<(), bool> = Listener::sync(|_| Ok(true));
        let observer = {
            let emitter = emitter.clone();
            let first = first.clone();
            Listener::sync(move |_| Ok(emitter.has_listener("t", &first)))
        };
        emitter.once("t", &first, &[]).unwrap();
        emitter.on("t", &observer, &[first.clone()]).unwrap();

        let results = emitter.emit_series("t", ()).await.unwrap();
        assert_eq!(results.get(&observer), Some(&false));
        emitter.remove_all_listeners(None);
    }

    #[tokio::test]
    async fn once_listener_promoted_by_on_survives() {
        let emitter: EventEmitter<(), ()> = EventEmitter::new();
        let f: Listener<(), ()> = Listener::sync(|_| Ok(()));
        emitter.once("t", &f, &[]).unwrap();
        emitter.on("t", &f, &[]).unwrap();
        emitter.emit("t", ()).await.unwrap();
        emitter.emit_series("t", ()).await.unwrap();
        assert!(emitter.has_listeners());
        assert!(emitter.has_event("t"));
        assert!(emitter.has_listener("t", &f));
    }

    #[tokio::test]
    async fn once_listener_is_gone_after_emit() {
        for series in [false, true] {
            let emitter: EventEmitter<(), ()> = EventEmitter::new();
            let f: Listener<(), ()> = Listener::new(|_| async {
                tokio::task::yield_now().await;
                Ok(())
            });
            emitter.once("t", &f, &[]).unwrap();
            if series {
                emitter.emit_series("t", ()).await.unwrap();
            } else {
                emitter.emit("t", ()).await.unwrap();
            }
            assert!(!emitter.has_listener("t", &f));
            assert!(!emitter.has_listeners());
        }
    }
}
