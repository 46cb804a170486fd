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

//! Change-feed and advertisement vocabulary.

use crate::route::Route;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Kind of table mutation an [`Event`] records.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum EventType {
    Create,
    Update,
    Delete,
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Create => write!(f, "create"),
            EventType::Update => write!(f, "update"),
            EventType::Delete => write!(f, "delete"),
        }
    }
}

/// One successful table mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub route: Route,
}

impl Event {
    /// Stamps a new event with the current wall-clock time.
    pub fn new(event_type: EventType, route: Route) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            route,
        }
    }
}

/// Kind of [`Advert`] batch.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum AdvertType {
    /// Sent once when a router starts advertising; carries its whole table.
    Announce,
    /// Periodic batch of damped route changes.
    Update,
}

impl Display for AdvertType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AdvertType::Announce => write!(f, "announce"),
            AdvertType::Update => write!(f, "update"),
        }
    }
}

/// Batch of route events exchanged with peer routers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Advert {
    pub router_id: String,
    pub advert_type: AdvertType,
    pub timestamp: DateTime<Utc>,
    pub ttl: Duration,
    pub events: Vec<Event>,
}
