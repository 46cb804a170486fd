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

//! Advert emission tasks.

use crate::event::{Advert, AdvertType, Event};
use crate::observability::{events, fields};
use chrono::Utc;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

const COMPONENT: &str = "advert_emission";

/// Stamps a new advert for `router_id`.
pub(crate) fn build_advert(
    router_id: &str,
    advert_type: AdvertType,
    ttl: Duration,
    events: Vec<Event>,
) -> Advert {
    Advert {
        router_id: router_id.to_string(),
        advert_type,
        timestamp: Utc::now(),
        ttl,
        events,
    }
}

/// Hands `advert` to the output on a tracked task.
///
/// The send waits for the consumer and is abandoned once `shutdown` fires, so a
/// session can always terminate even when nobody drains the advert stream.
pub(crate) fn spawn_emission(
    emissions: &TaskTracker,
    shutdown: CancellationToken,
    adverts: Sender<Advert>,
    advert: Advert,
) {
    emissions.spawn(async move {
        let label = fields::format_advert(&advert);
        let router_id = advert.router_id.clone();

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!(
                    event = events::ADVERT_EMIT_CANCELLED,
                    component = COMPONENT,
                    router_id = router_id.as_str(),
                    advert = label.as_str(),
                    reason = fields::REASON_TERMINATED,
                    "advert emission abandoned"
                );
            }
            sent = adverts.send(advert) => {
                if sent.is_ok() {
                    debug!(
                        event = events::ADVERT_EMIT,
                        component = COMPONENT,
                        router_id = router_id.as_str(),
                        advert = label.as_str(),
                        "advert emitted"
                    );
                } else {
                    debug!(
                        event = events::ADVERT_EMIT_CANCELLED,
                        component = COMPONENT,
                        router_id = router_id.as_str(),
                        advert = label.as_str(),
                        reason = fields::REASON_OUTPUT_DROPPED,
                        "advert stream receiver dropped"
                    );
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::{build_advert, spawn_emission};
    use crate::event::AdvertType;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;
    use tokio_util::task::TaskTracker;

    #[tokio::test]
    async fn emission_delivers_to_waiting_consumer() {
        let tracker = TaskTracker::new();
        let (adverts, mut output) = mpsc::channel(1);

        let advert = build_advert("router-a", AdvertType::Update, Duration::from_secs(60), vec![]);
        spawn_emission(&tracker, CancellationToken::new(), adverts, advert);

        let received = output.recv().await.unwrap();
        assert_eq!(received.router_id, "router-a");
        assert_eq!(received.advert_type, AdvertType::Update);

        tracker.close();
        tracker.wait().await;
        assert!(output.recv().await.is_none());
    }

    #[tokio::test]
    async fn cancellation_releases_a_blocked_emission() {
        let tracker = TaskTracker::new();
        let shutdown = CancellationToken::new();
        let (adverts, _output) = mpsc::channel(1);

        for _ in 0..3 {
            let advert = build_advert("router-a", AdvertType::Update, Duration::ZERO, vec![]);
            spawn_emission(&tracker, shutdown.clone(), adverts.clone(), advert);
        }

        shutdown.cancel();
        tracker.close();
        tokio::time::timeout(Duration::from_secs(1), tracker.wait())
            .await
            .expect("emissions should stop after cancellation");
    }
}
