/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Flap damping of table events into periodic adverts.
//!
//! Every route hash seen on the table feed gets a working entry carrying an
//! instability penalty. Each new sighting decays the stored penalty by
//! `e^(-Δt)` (Δt in seconds since the previous sighting) and adds the
//! contribution of the new event type. Entries whose penalty rises above
//! [`SUPPRESS_THRESHOLD`] are held back until a later sighting observes the
//! decayed penalty below [`RECOVER_THRESHOLD`].
//!
//! On each tick every entry that is neither suppressed nor flapping leaves the
//! working map and goes out in one `Update` advert.

use crate::error::RouterError;
use crate::event::{Advert, AdvertType, Event, EventType};
use crate::observability::{events, fields};
use crate::router::emission::{build_advert, spawn_emission};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

const COMPONENT: &str = "flap_damping";

pub(crate) const CREATE_PENALTY: f64 = 0.0;
pub(crate) const UPDATE_PENALTY: f64 = 500.0;
pub(crate) const DELETE_PENALTY: f64 = 1000.0;
/// Penalty above which an entry is suppressed.
pub(crate) const SUPPRESS_THRESHOLD: f64 = 2000.0;
/// Penalty below which a suppressed entry recovers.
pub(crate) const RECOVER_THRESHOLD: f64 = 750.0;

pub(crate) fn penalty_for(event_type: EventType) -> f64 {
    match event_type {
        EventType::Create => CREATE_PENALTY,
        EventType::Update => UPDATE_PENALTY,
        EventType::Delete => DELETE_PENALTY,
    }
}

/// Exponential decay of `penalty` over `elapsed`.
pub(crate) fn decay(penalty: f64, elapsed: Duration) -> f64 {
    penalty * (-elapsed.as_secs_f64()).exp()
}

/// Two consecutive updates, or a create and a delete in either order.
fn is_flap(current: EventType, previous: EventType) -> bool {
    matches!(
        (current, previous),
        (EventType::Update, EventType::Update)
            | (EventType::Create, EventType::Delete)
            | (EventType::Delete, EventType::Create)
    )
}

/// Working state of one route hash.
#[derive(Clone, Debug)]
pub(crate) struct DampedEvent {
    pub(crate) event: Event,
    pub(crate) penalty: f64,
    pub(crate) last_seen: Instant,
    pub(crate) is_suppressed: bool,
    pub(crate) is_flapping: bool,
}

/// Penalty bookkeeping, free of any task or channel.
pub(crate) struct FlapDamper {
    entries: HashMap<u64, DampedEvent>,
    max_suppress_time: Duration,
}

impl FlapDamper {
    pub(crate) fn new(max_suppress_time: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            max_suppress_time,
        }
    }

    #[cfg(test)]
    pub(crate) fn entry(&self, hash: u64) -> Option<&DampedEvent> {
        self.entries.get(&hash)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Records one sighting of `event` at `now`.
    pub(crate) fn observe(&mut self, event: Event, now: Instant) {
        let hash = event.route.hash();
        let contribution = penalty_for(event.event_type);

        let Some(entry) = self.entries.get_mut(&hash) else {
            debug!(
                event = events::DAMPING_SIGHTING,
                component = COMPONENT,
                route_hash = %fields::format_route_hash(hash),
                event_type = %event.event_type,
                penalty = contribution,
                "first sighting"
            );
            self.entries.insert(
                hash,
                DampedEvent {
                    event,
                    penalty: contribution,
                    last_seen: now,
                    is_suppressed: false,
                    is_flapping: false,
                },
            );
            return;
        };

        let decayed = decay(entry.penalty, now.saturating_duration_since(entry.last_seen));
        if entry.is_suppressed && decayed < RECOVER_THRESHOLD {
            entry.is_suppressed = false;
            debug!(
                event = events::DAMPING_RECOVER,
                component = COMPONENT,
                route_hash = %fields::format_route_hash(hash),
                penalty = decayed,
                "route recovered"
            );
        }

        entry.penalty = decayed + contribution;
        entry.last_seen = now;

        if !entry.is_suppressed && entry.penalty > SUPPRESS_THRESHOLD {
            entry.is_suppressed = true;
            debug!(
                event = events::DAMPING_SUPPRESS,
                component = COMPONENT,
                route_hash = %fields::format_route_hash(hash),
                penalty = entry.penalty,
                "route suppressed"
            );
        }

        if !entry.is_suppressed {
            entry.is_flapping = is_flap(event.event_type, entry.event.event_type);
            if entry.is_flapping {
                debug!(
                    event = events::DAMPING_FLAP,
                    component = COMPONENT,
                    route_hash = %fields::format_route_hash(hash),
                    event_type = %event.event_type,
                    previous = %entry.event.event_type,
                    "route flapping"
                );
            }
        }

        debug!(
            event = events::DAMPING_SIGHTING,
            component = COMPONENT,
            route_hash = %fields::format_route_hash(hash),
            event_type = %event.event_type,
            penalty = entry.penalty,
            suppressed = entry.is_suppressed,
            flapping = entry.is_flapping,
            "repeat sighting"
        );
        entry.event = event;
    }

    /// Takes every advertisable event out of the working map, oldest first.
    ///
    /// Held-back entries not sighted for `max_suppress_time` are dropped without
    /// being advertised.
    pub(crate) fn flush(&mut self, now: Instant) -> Vec<Event> {
        let max_suppress_time = self.max_suppress_time;
        let mut batch = Vec::new();

        self.entries.retain(|hash, entry| {
            if !entry.is_suppressed && !entry.is_flapping {
                batch.push(entry.event.clone());
                return false;
            }
            if now.saturating_duration_since(entry.last_seen) >= max_suppress_time {
                debug!(
                    event = events::DAMPING_EVICT,
                    component = COMPONENT,
                    route_hash = %fields::format_route_hash(*hash),
                    reason = fields::REASON_STALE,
                    penalty = entry.penalty,
                    "dropped stale damping entry"
                );
                return false;
            }
            true
        });

        batch.sort_by_key(|event| event.timestamp);
        batch
    }
}

/// Timing parameters of one [`AdvertEngine`].
#[derive(Clone, Copy, Debug)]
pub(crate) struct EngineTiming {
    pub(crate) advertise_tick: Duration,
    pub(crate) advert_ttl: Duration,
    pub(crate) max_suppress_time: Duration,
}

/// Long-lived task turning the internal event queue into damped adverts.
pub(crate) struct AdvertEngine {
    router_id: String,
    timing: EngineTiming,
    damper: FlapDamper,
    events: Receiver<Event>,
    adverts: Sender<Advert>,
    emissions: TaskTracker,
    shutdown: CancellationToken,
}

impl AdvertEngine {
    pub(crate) fn new(
        router_id: String,
        timing: EngineTiming,
        events: Receiver<Event>,
        adverts: Sender<Advert>,
        emissions: TaskTracker,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            router_id,
            damper: FlapDamper::new(timing.max_suppress_time),
            timing,
            events,
            adverts,
            emissions,
            shutdown,
        }
    }

    /// Runs until the session is cancelled or the event queue closes.
    pub(crate) async fn process_events(&mut self) -> Result<(), RouterError> {
        let tick = self.timing.advertise_tick;
        let mut ticker = tokio::time::interval_at(Instant::now() + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Ok(()),
                _ = ticker.tick() => self.advertise_ready(),
                received = self.events.recv() => match received {
                    Some(event) => self.damper.observe(event, Instant::now()),
                    None if self.shutdown.is_cancelled() => return Ok(()),
                    None => return Err(RouterError::EventQueueClosed),
                },
            }
        }
    }

    /// Waits for in-flight emissions, then closes the advert output.
    pub(crate) async fn finish(self) {
        self.emissions.close();
        self.emissions.wait().await;

        info!(
            event = events::ADVERT_ENGINE_STOP,
            component = COMPONENT,
            router_id = self.router_id.as_str(),
            reason = fields::REASON_TERMINATED,
            pending = self.damper.len(),
            "advert engine stopped; closing advert output"
        );
        drop(self.adverts);
    }

    fn advertise_ready(&mut self) {
        let batch = self.damper.flush(Instant::now());
        if batch.is_empty() {
            return;
        }

        let advert = build_advert(
            &self.router_id,
            AdvertType::Update,
            self.timing.advert_ttl,
            batch,
        );
        spawn_emission(
            &self.emissions,
            self.shutdown.clone(),
            self.adverts.clone(),
            advert,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{
        decay, is_flap, AdvertEngine, EngineTiming, FlapDamper, DELETE_PENALTY,
        SUPPRESS_THRESHOLD, UPDATE_PENALTY,
    };
    use crate::error::RouterError;
    use crate::event::{AdvertType, Event, EventType};
    use crate::route::Route;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;
    use tokio_util::task::TaskTracker;

    const MAX_SUPPRESS: Duration = Duration::from_secs(300);

    fn route(service: &str) -> Route {
        Route {
            service: service.to_string(),
            address: "10.0.0.1:8080".to_string(),
            network: "local".to_string(),
            link: "local".to_string(),
            metric: 1,
            ..Default::default()
        }
    }

    fn event(event_type: EventType, service: &str) -> Event {
        Event::new(event_type, route(service))
    }

    #[test]
    fn decay_is_exponential_in_seconds() {
        assert_eq!(decay(1000.0, Duration::ZERO), 1000.0);
        let decayed = decay(1000.0, Duration::from_secs(1));
        assert!((decayed - 1000.0 * (-1.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn flap_pairs() {
        assert!(is_flap(EventType::Update, EventType::Update));
        assert!(is_flap(EventType::Create, EventType::Delete));
        assert!(is_flap(EventType::Delete, EventType::Create));
        assert!(!is_flap(EventType::Update, EventType::Create));
        assert!(!is_flap(EventType::Delete, EventType::Delete));
    }

    #[test]
    fn first_sighting_seeds_entry_with_its_contribution() {
        let mut damper = FlapDamper::new(MAX_SUPPRESS);
        let now = Instant::now();
        let update = event(EventType::Update, "foo");
        let hash = update.route.hash();

        damper.observe(update, now);

        let entry = damper.entry(hash).unwrap();
        assert_eq!(entry.penalty, UPDATE_PENALTY);
        assert!(!entry.is_flapping);
        assert!(!entry.is_suppressed);
    }

    #[test]
    fn repeat_sighting_decays_then_adds() {
        let mut damper = FlapDamper::new(MAX_SUPPRESS);
        let start = Instant::now();
        let delete = event(EventType::Delete, "foo");
        let hash = delete.route.hash();

        damper.observe(delete.clone(), start);
        damper.observe(delete, start + Duration::from_millis(500));

        let expected = DELETE_PENALTY * (-0.5f64).exp() + DELETE_PENALTY;
        assert!((damper.entry(hash).unwrap().penalty - expected).abs() < 1e-9);
    }

    #[test]
    fn two_updates_within_one_tick_are_held_back() {
        let mut damper = FlapDamper::new(MAX_SUPPRESS);
        let now = Instant::now();

        damper.observe(event(EventType::Update, "foo"), now);
        damper.observe(event(EventType::Update, "foo"), now);

        assert!(damper.flush(now).is_empty());
        assert_eq!(damper.len(), 1);
    }

    #[test]
    fn create_then_silence_is_advertised_exactly_once() {
        let mut damper = FlapDamper::new(MAX_SUPPRESS);
        let now = Instant::now();

        damper.observe(event(EventType::Create, "foo"), now);

        let batch = damper.flush(now + Duration::from_secs(5));
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].event_type, EventType::Create);
        assert!(damper.flush(now + Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn hysteresis_suppresses_above_upper_and_recovers_below_lower() {
        let mut damper = FlapDamper::new(MAX_SUPPRESS);
        let start = Instant::now();
        let delete = event(EventType::Delete, "foo");
        let hash = delete.route.hash();

        for _ in 0..3 {
            damper.observe(delete.clone(), start);
        }
        let entry = damper.entry(hash).unwrap();
        assert!(entry.penalty > SUPPRESS_THRESHOLD);
        assert!(entry.is_suppressed);
        assert!(damper.flush(start).is_empty());

        // 3000 * e^-2 is well below the recovery threshold.
        damper.observe(delete, start + Duration::from_secs(2));
        let entry = damper.entry(hash).unwrap();
        assert!(!entry.is_suppressed);
        assert!(!entry.is_flapping);
        assert_eq!(damper.flush(start + Duration::from_secs(2)).len(), 1);
    }

    #[test]
    fn suppressed_entry_does_not_recover_while_penalty_is_high() {
        let mut damper = FlapDamper::new(MAX_SUPPRESS);
        let start = Instant::now();
        let delete = event(EventType::Delete, "foo");
        let hash = delete.route.hash();

        for _ in 0..3 {
            damper.observe(delete.clone(), start);
        }
        damper.observe(delete, start + Duration::from_millis(100));

        assert!(damper.entry(hash).unwrap().is_suppressed);
    }

    #[test]
    fn stale_held_back_entries_are_evicted() {
        let mut damper = FlapDamper::new(Duration::from_secs(30));
        let now = Instant::now();

        damper.observe(event(EventType::Update, "foo"), now);
        damper.observe(event(EventType::Update, "foo"), now);

        assert!(damper.flush(now + Duration::from_secs(29)).is_empty());
        assert_eq!(damper.len(), 1);
        assert!(damper.flush(now + Duration::from_secs(30)).is_empty());
        assert_eq!(damper.len(), 0);
    }

    #[test]
    fn flush_orders_batch_by_event_time() {
        let mut damper = FlapDamper::new(MAX_SUPPRESS);
        let now = Instant::now();
        let first = event(EventType::Create, "a");
        let mut second = event(EventType::Create, "b");
        second.timestamp = first.timestamp + chrono::Duration::seconds(1);

        damper.observe(second, now);
        damper.observe(first, now);

        let batch = damper.flush(now);
        assert_eq!(batch[0].route.service, "a");
        assert_eq!(batch[1].route.service, "b");
    }

    fn engine(
        tick: Duration,
    ) -> (
        AdvertEngine,
        mpsc::Sender<Event>,
        mpsc::Receiver<crate::event::Advert>,
        CancellationToken,
    ) {
        let (events_tx, events_rx) = mpsc::channel(1);
        let (adverts_tx, adverts_rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        let timing = EngineTiming {
            advertise_tick: tick,
            advert_ttl: Duration::from_secs(60),
            max_suppress_time: MAX_SUPPRESS,
        };
        let engine = AdvertEngine::new(
            "router-a".to_string(),
            timing,
            events_rx,
            adverts_tx,
            TaskTracker::new(),
            shutdown.clone(),
        );
        (engine, events_tx, adverts_rx, shutdown)
    }

    #[tokio::test(start_paused = true)]
    async fn engine_emits_update_advert_on_tick() {
        let (mut engine, events, mut adverts, shutdown) = engine(Duration::from_secs(5));
        let task = tokio::spawn(async move {
            let result = engine.process_events().await;
            engine.finish().await;
            result
        });

        events.send(event(EventType::Create, "foo")).await.unwrap();

        let advert = adverts.recv().await.unwrap();
        assert_eq!(advert.router_id, "router-a");
        assert_eq!(advert.advert_type, AdvertType::Update);
        assert_eq!(advert.ttl, Duration::from_secs(60));
        assert_eq!(advert.events.len(), 1);

        shutdown.cancel();
        assert_eq!(task.await.unwrap(), Ok(()));
        assert!(adverts.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn engine_reports_unexpected_queue_close() {
        let (mut engine, events, _adverts, _shutdown) = engine(Duration::from_secs(5));
        drop(events);

        assert_eq!(
            engine.process_events().await,
            Err(RouterError::EventQueueClosed)
        );
    }
}
