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

//! Error taxonomy for the table, the registry collaborator and the router.

use thiserror::Error;

/// Failures returned by [`Table`](crate::Table) and [`Watcher`](crate::Watcher).
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TableError {
    #[error("duplicate route")]
    DuplicateRoute,
    #[error("route not found")]
    RouteNotFound,
    #[error("watcher stopped")]
    WatcherStopped,
}

/// Failures reported by a [`Registry`](crate::Registry) implementation.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RegistryError {
    #[error("registry watcher stopped")]
    WatcherStopped,
    #[error("service {0} not found")]
    NotFound(String),
    #[error("registry failure: {0}")]
    Backend(String),
}

/// Failures of the router lifecycle and its background tasks.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RouterError {
    #[error("router is already running")]
    AlreadyRunning,
    #[error("router is not running")]
    NotRunning,
    #[error("invalid router options: {0}")]
    InvalidOptions(&'static str),
    #[error("table event queue closed unexpectedly")]
    EventQueueClosed,
    #[error("router task {0} panicked")]
    TaskPanicked(&'static str),
    #[error("failed to manage route for service {service}: {source}")]
    ManageRoute { service: String, source: TableError },
    #[error("failed to apply advert event for service {service}: {source}")]
    ApplyAdvert { service: String, source: TableError },
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
