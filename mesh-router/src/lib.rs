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

//! # mesh-router
//!
//! `mesh-router` is the routing control plane of a service mesh: a table of routes
//! to named services, a change feed over that table, and an advertisement engine
//! that propagates damped route changes to peer routers.
//!
//! Typical usage is API-first and centered on [`Table`] and [`Router`]. Peer
//! transport, node selection and the registry backend are collaborators supplied by
//! the embedding process.
//!
//! ## Routing table
//!
//! ```
//! use mesh_router::{Query, Route, Table, TableError, TableOptions, WatchOptions};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let table = Table::new(TableOptions::default());
//! let mut watcher = table.watch(WatchOptions::service("foo")).await;
//!
//! let route = Route {
//!     service: "foo".to_string(),
//!     address: "10.0.0.1:8080".to_string(),
//!     network: "n1".to_string(),
//!     ..Default::default()
//! };
//! table.create(route.clone()).await.unwrap();
//!
//! let created = watcher.next().await.unwrap();
//! assert_eq!(created.route, route);
//!
//! let found = table
//!     .lookup(&Query::service("foo").with_network("n1"))
//!     .await
//!     .unwrap();
//! assert_eq!(found.len(), 1);
//! assert_eq!(
//!     table.lookup(&Query::service("bar")).await,
//!     Err(TableError::RouteNotFound)
//! );
//! # });
//! ```
//!
//! ## Advertising
//!
//! A transport calls [`Router::advertise`] once, forwards every [`Advert`] it
//! yields to peers, hands peer adverts to [`Router::process`] and calls
//! [`Router::stop`] on shutdown.
//!
//! ```
//! use mesh_router::{AdvertType, Router, RouterOptions};
//! use registry_static_file::StaticFileRegistry;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = Arc::new(StaticFileRegistry::new(
//!     "../utils/registry-static-file/static-configs/testdata.json",
//! ));
//! let router = Router::new(RouterOptions::default(), registry);
//!
//! let mut adverts = router.advertise().await.unwrap();
//! let announce = adverts.recv().await.unwrap();
//! assert_eq!(announce.advert_type, AdvertType::Announce);
//! assert!(!announce.events.is_empty());
//!
//! router.stop().await.unwrap();
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - Table: route storage, lookup and per-watcher fan-out
//! - Router: advertising session lifecycle, registry mirroring, peer advert processing
//! - Flap damping: penalty decay and hysteresis deciding what to advertise and when
//! - Runtime: task spawning and failure reporting
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events and does not unconditionally initialize a global
//! subscriber. Binaries and tests are responsible for one-time
//! `tracing_subscriber` initialization at process boundaries.

mod error;
pub use error::{RegistryError, RouterError, TableError};

mod event;
pub use event::{Advert, AdvertType, Event, EventType};

mod route;
pub use route::{Route, DEFAULT_LINK, DEFAULT_LOCAL_METRIC, WILDCARD};

mod registry;
pub use registry::{Node, Registry, RegistryAction, RegistryEvent, RegistryWatcher, Service};

mod table;
pub use table::query::{Query, QueryPolicy};
pub use table::watcher::{WatchOptions, Watcher};
pub use table::{Table, TableOptions, UpdatePolicy};

mod router;
pub use router::options::{
    AdvertiseStrategy, RouterOptions, DEFAULT_ADVERTISE_TICK, DEFAULT_ADVERT_TTL,
    DEFAULT_MAX_SUPPRESS_TIME, DEFAULT_NETWORK,
};
pub use router::status::{Status, StatusCode};
pub use router::Router;

#[doc(hidden)]
pub mod observability;
mod runtime;
