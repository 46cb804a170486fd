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

//! Canonical structured field values and value-format helpers.

use crate::event::Advert;
use crate::route::Route;

pub const NONE: &str = "none";
pub const REASON_QUEUE_FULL: &str = "queue_full";
pub const REASON_WATCHER_STOPPED: &str = "watcher_stopped";
pub const REASON_TERMINATED: &str = "terminated";
pub const REASON_STALE: &str = "stale";
pub const REASON_OUTPUT_DROPPED: &str = "output_dropped";
pub const REASON_QUEUE_CLOSED: &str = "queue_closed";
pub const REASON_STRATEGY: &str = "advertise_strategy";
pub const REASON_OWN_ROUTE: &str = "own_route";

/// Fixed-width hex form of a route hash so log lines line up.
pub fn format_route_hash(hash: u64) -> String {
    format!("{hash:016x}")
}

/// Compact `service@address` label for one route.
pub fn format_route(route: &Route) -> String {
    let address = if route.address.is_empty() {
        NONE
    } else {
        route.address.as_str()
    };
    format!("{}@{}", route.service, address)
}

/// Compact `type/events` label for one advert.
pub fn format_advert(advert: &Advert) -> String {
    format!("{}/{}", advert.advert_type, advert.events.len())
}
