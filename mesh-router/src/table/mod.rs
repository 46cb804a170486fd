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

//! Routing table: route storage, lookup and the change feed.
//!
//! Routes are bucketed by service name and keyed by [`Route::hash`] inside each
//! bucket. Every successful mutation publishes one [`Event`] to the watchers whose
//! filter matches; publication happens after the storage lock is released and never
//! waits on a watcher queue.
//!
//! ```
//! use mesh_router::{Route, Table, TableError, TableOptions};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let table = Table::new(TableOptions::default());
//! let route = Route {
//!     service: "dest.svc".to_string(),
//!     gateway: "dest.gw".to_string(),
//!     network: "n".to_string(),
//!     link: "l".to_string(),
//!     metric: 10,
//!     ..Default::default()
//! };
//!
//! table.create(route.clone()).await.unwrap();
//! assert_eq!(table.create(route).await, Err(TableError::DuplicateRoute));
//! assert_eq!(table.size().await, 1);
//! # });
//! ```

pub(crate) mod query;
pub(crate) mod watcher;

use crate::error::TableError;
use crate::event::{Event, EventType};
use crate::observability::{events, fields};
use crate::route::Route;
use query::Query;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;
use watcher::{Delivery, WatchOptions, Watcher, WatcherSlot};

const COMPONENT: &str = "table";

/// What [`Table::update`] does with a route whose hash is not stored yet.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePolicy {
    /// Insert the route and publish a `Create` event.
    InsertIfMissing,
    /// Fail with [`TableError::RouteNotFound`].
    #[default]
    FailIfMissing,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableOptions {
    pub update_policy: UpdatePolicy,
}

type ServiceRoutes = HashMap<u64, Route>;

/// In-memory routing table, safe to share between tasks behind an `Arc`.
pub struct Table {
    options: TableOptions,
    routes: RwLock<HashMap<String, ServiceRoutes>>,
    watchers: RwLock<HashMap<Uuid, WatcherSlot>>,
}

impl Default for Table {
    fn default() -> Self {
        Self::new(TableOptions::default())
    }
}

impl Table {
    pub fn new(options: TableOptions) -> Self {
        Self {
            options,
            routes: RwLock::new(HashMap::new()),
            watchers: RwLock::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    /// Inserts a new route. Fails when the same path already exists for the service.
    pub async fn create(&self, route: Route) -> Result<(), TableError> {
        let hash = route.hash();
        {
            let mut routes = self.routes.write().await;
            let bucket = routes.entry(route.service.clone()).or_default();
            if bucket.contains_key(&hash) {
                return Err(TableError::DuplicateRoute);
            }
            bucket.insert(hash, route.clone());
        }

        self.publish(Event::new(EventType::Create, route)).await;
        Ok(())
    }

    /// Removes a route. Fails when either the service or the path is unknown.
    pub async fn delete(&self, route: Route) -> Result<(), TableError> {
        let hash = route.hash();
        {
            let mut routes = self.routes.write().await;
            let bucket = routes
                .get_mut(&route.service)
                .ok_or(TableError::RouteNotFound)?;
            if bucket.remove(&hash).is_none() {
                return Err(TableError::RouteNotFound);
            }
            if bucket.is_empty() {
                routes.remove(&route.service);
            }
        }

        self.publish(Event::new(EventType::Delete, route)).await;
        Ok(())
    }

    /// Replaces a stored route, applying the table's [`UpdatePolicy`] to unknown paths.
    pub async fn update(&self, route: Route) -> Result<(), TableError> {
        self.update_with(route, self.options.update_policy).await
    }

    /// Replaces a stored route, applying `policy` to unknown paths.
    ///
    /// An unknown service always fails with [`TableError::RouteNotFound`].
    pub async fn update_with(&self, route: Route, policy: UpdatePolicy) -> Result<(), TableError> {
        let hash = route.hash();
        let event_type = {
            let mut routes = self.routes.write().await;
            let bucket = routes
                .get_mut(&route.service)
                .ok_or(TableError::RouteNotFound)?;

            let event_type = match (bucket.contains_key(&hash), policy) {
                (true, _) => EventType::Update,
                (false, UpdatePolicy::InsertIfMissing) => EventType::Create,
                (false, UpdatePolicy::FailIfMissing) => return Err(TableError::RouteNotFound),
            };
            bucket.insert(hash, route.clone());
            event_type
        };

        self.publish(Event::new(event_type, route)).await;
        Ok(())
    }

    /// Flattened snapshot of every stored route, in no particular order.
    pub async fn list(&self) -> Vec<Route> {
        let routes = self.routes.read().await;
        routes
            .values()
            .flat_map(|bucket| bucket.values().cloned())
            .collect()
    }

    /// Returns the routes selected by `query`.
    pub async fn lookup(&self, query: &Query) -> Result<Vec<Route>, TableError> {
        let routes = self.routes.read().await;

        if query.is_wildcard_service() {
            return Ok(routes
                .values()
                .flat_map(|bucket| bucket.values())
                .filter(|route| query.matches(route))
                .cloned()
                .collect());
        }

        match routes.get(&query.service) {
            Some(bucket) if !bucket.is_empty() => Ok(bucket
                .values()
                .filter(|route| query.matches(route))
                .cloned()
                .collect()),
            _ if query.policy.errors_on_missing_service() => Err(TableError::RouteNotFound),
            _ => Ok(Vec::new()),
        }
    }

    /// Registers a new watcher on the change feed.
    pub async fn watch(&self, options: WatchOptions) -> Watcher {
        let (id, slot, watcher) = WatcherSlot::pair(options);
        self.watchers.write().await.insert(id, slot);

        debug!(
            event = events::TABLE_WATCH_REGISTER,
            component = COMPONENT,
            watcher_id = %id,
            service = watcher.service(),
            "registered table watcher"
        );
        watcher
    }

    /// Number of stored routes across all services.
    pub async fn size(&self) -> usize {
        let routes = self.routes.read().await;
        routes.values().map(HashMap::len).sum()
    }

    async fn publish(&self, event: Event) {
        debug!(
            event = mutation_event_name(event.event_type),
            component = COMPONENT,
            route = %fields::format_route(&event.route),
            route_hash = %fields::format_route_hash(event.route.hash()),
            "table mutated"
        );

        let mut gone = Vec::new();
        {
            let watchers = self.watchers.read().await;
            for (id, slot) in watchers.iter() {
                match slot.deliver(&event) {
                    Delivery::Delivered | Delivery::Skipped => {}
                    Delivery::Dropped => {
                        warn!(
                            event = events::TABLE_WATCH_DROPPED,
                            component = COMPONENT,
                            watcher_id = %id,
                            reason = fields::REASON_QUEUE_FULL,
                            route = %fields::format_route(&event.route),
                            "watcher queue full; event dropped for this watcher"
                        );
                    }
                    Delivery::Gone => gone.push(*id),
                }
            }
        }

        if gone.is_empty() {
            return;
        }

        let mut watchers = self.watchers.write().await;
        for id in gone {
            watchers.remove(&id);
            debug!(
                event = events::TABLE_WATCH_PRUNED,
                component = COMPONENT,
                watcher_id = %id,
                reason = fields::REASON_WATCHER_STOPPED,
                "pruned stopped watcher"
            );
        }
    }

    #[cfg(test)]
    pub(crate) async fn watcher_count(&self) -> usize {
        self.watchers.read().await.len()
    }
}

fn mutation_event_name(event_type: EventType) -> &'static str {
    match event_type {
        EventType::Create => events::TABLE_ROUTE_CREATE,
        EventType::Update => events::TABLE_ROUTE_UPDATE,
        EventType::Delete => events::TABLE_ROUTE_DELETE,
    }
}
