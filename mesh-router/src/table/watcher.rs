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

//! Per-subscriber handles onto the table change feed.

use crate::error::TableError;
use crate::event::Event;
use crate::route::WILDCARD;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Inbound queue depth of every watcher.
pub(crate) const WATCHER_QUEUE_SIZE: usize = 10;

/// Service filter applied to a [`Watcher`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WatchOptions {
    pub service: String,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            service: WILDCARD.to_string(),
        }
    }
}

impl WatchOptions {
    pub fn service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

///
/// [`Watcher`] yields the table events that match its service filter.
///
/// Every watcher owns a bounded queue; the table never blocks on it. When the queue
/// is full the event is dropped for this watcher only, so a slow consumer may miss
/// events but never delays a table mutation or another watcher.
///
/// Dropping a watcher stops it.
pub struct Watcher {
    id: Uuid,
    service: String,
    receiver: Receiver<Event>,
    stop: CancellationToken,
}

impl Watcher {
    /// Returns the unique id the table knows this watcher by.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the service filter, `*` for every service.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Waits for the next matching event.
    ///
    /// Fails with [`TableError::WatcherStopped`] once [`Watcher::stop`] was called or
    /// the table is gone.
    pub async fn next(&mut self) -> Result<Event, TableError> {
        if self.stop.is_cancelled() {
            return Err(TableError::WatcherStopped);
        }

        tokio::select! {
            biased;
            _ = self.stop.cancelled() => Err(TableError::WatcherStopped),
            event = self.receiver.recv() => event.ok_or(TableError::WatcherStopped),
        }
    }

    /// Raw event queue for `select!`-based consumers.
    pub fn events(&mut self) -> &mut Receiver<Event> {
        &mut self.receiver
    }

    /// Stops the watcher. Pending and future [`Watcher::next`] calls fail.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

/// Outcome of one non-blocking delivery attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Delivery {
    Delivered,
    Skipped,
    Dropped,
    Gone,
}

/// Table-side half of a [`Watcher`].
pub(crate) struct WatcherSlot {
    service: String,
    sender: Sender<Event>,
    stop: CancellationToken,
}

impl WatcherSlot {
    /// Creates a connected slot/watcher pair.
    pub(crate) fn pair(options: WatchOptions) -> (Uuid, WatcherSlot, Watcher) {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::channel(WATCHER_QUEUE_SIZE);
        let stop = CancellationToken::new();

        let slot = WatcherSlot {
            service: options.service.clone(),
            sender,
            stop: stop.clone(),
        };
        let watcher = Watcher {
            id,
            service: options.service,
            receiver,
            stop,
        };

        (id, slot, watcher)
    }

    fn accepts(&self, event: &Event) -> bool {
        self.service == WILDCARD || self.service == event.route.service
    }

    /// Hands the event over without waiting for queue space.
    pub(crate) fn deliver(&self, event: &Event) -> Delivery {
        if self.stop.is_cancelled() {
            return Delivery::Gone;
        }
        if !self.accepts(event) {
            return Delivery::Skipped;
        }

        match self.sender.try_send(event.clone()) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(_)) => Delivery::Dropped,
            Err(TrySendError::Closed(_)) => Delivery::Gone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Delivery, WatchOptions, WatcherSlot, WATCHER_QUEUE_SIZE};
    use crate::error::TableError;
    use crate::event::{Event, EventType};
    use crate::route::Route;

    fn event(service: &str) -> Event {
        Event::new(
            EventType::Create,
            Route {
                service: service.to_string(),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn filtered_slot_skips_other_services() {
        let (_, slot, mut watcher) = WatcherSlot::pair(WatchOptions::service("foo"));

        assert_eq!(slot.deliver(&event("bar")), Delivery::Skipped);
        assert_eq!(slot.deliver(&event("foo")), Delivery::Delivered);

        let received = watcher.next().await.expect("event should be queued");
        assert_eq!(received.route.service, "foo");
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let (_, slot, _watcher) = WatcherSlot::pair(WatchOptions::default());

        for _ in 0..WATCHER_QUEUE_SIZE {
            assert_eq!(slot.deliver(&event("foo")), Delivery::Delivered);
        }
        assert_eq!(slot.deliver(&event("foo")), Delivery::Dropped);
    }

    #[tokio::test]
    async fn stopped_watcher_fails_next_and_reports_gone() {
        let (_, slot, mut watcher) = WatcherSlot::pair(WatchOptions::default());
        slot.deliver(&event("foo"));

        watcher.stop();

        assert!(watcher.is_stopped());
        assert_eq!(watcher.next().await, Err(TableError::WatcherStopped));
        assert_eq!(slot.deliver(&event("foo")), Delivery::Gone);
    }

    #[tokio::test]
    async fn dropped_watcher_reports_gone() {
        let (_, slot, watcher) = WatcherSlot::pair(WatchOptions::default());
        drop(watcher);

        assert_eq!(slot.deliver(&event("foo")), Delivery::Gone);
    }

    #[tokio::test]
    async fn stop_unblocks_pending_next() {
        let (_, _slot, mut watcher) = WatcherSlot::pair(WatchOptions::default());
        let stop = watcher.stop.clone();

        let pending = tokio::spawn(async move { watcher.next().await });
        stop.cancel();

        let result = pending.await.expect("watcher task should not panic");
        assert_eq!(result, Err(TableError::WatcherStopped));
    }
}
