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

//! Mirroring of the registry into the table, and of the table into the engine.

use crate::error::{RegistryError, RouterError, TableError};
use crate::event::Event;
use crate::observability::{events, fields};
use crate::registry::{Node, Registry, RegistryAction, RegistryEvent, RegistryWatcher};
use crate::route::{Route, DEFAULT_LINK, DEFAULT_LOCAL_METRIC};
use crate::router::options::{AdvertiseStrategy, RouterOptions};
use crate::table::watcher::Watcher;
use crate::table::{Table, UpdatePolicy};
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPONENT: &str = "registry_mirror";

/// Route through which this router reaches one locally registered node.
pub(crate) fn local_route(options: &RouterOptions, service: &str, node: &Node) -> Route {
    Route {
        service: service.to_string(),
        address: node.address.clone(),
        gateway: String::new(),
        network: options.network.clone(),
        router: options.id.clone(),
        link: DEFAULT_LINK.to_string(),
        metric: DEFAULT_LOCAL_METRIC,
    }
}

/// Best-effort load of the current registry snapshot into the table.
///
/// Failures are logged and skip the affected service; they never fail the caller.
pub(crate) async fn bootstrap(table: &Table, registry: &dyn Registry, options: &RouterOptions) {
    let services = match registry.list_services().await {
        Ok(services) => services,
        Err(err) => {
            warn!(
                event = events::ROUTER_BOOTSTRAP_SKIP,
                component = COMPONENT,
                router_id = options.id.as_str(),
                err = %err,
                "unable to list registry services; starting with an empty table"
            );
            return;
        }
    };

    for service in services {
        let versions = match registry.get_service(&service.name).await {
            Ok(versions) => versions,
            Err(err) => {
                warn!(
                    event = events::ROUTER_BOOTSTRAP_SKIP,
                    component = COMPONENT,
                    router_id = options.id.as_str(),
                    service = service.name.as_str(),
                    err = %err,
                    "unable to fetch service; skipping"
                );
                continue;
            }
        };

        let nodes = versions.iter().flat_map(|version| version.nodes.iter());
        if let Err(err) = create_routes(table, options, &service.name, nodes).await {
            warn!(
                event = events::ROUTER_BOOTSTRAP_SKIP,
                component = COMPONENT,
                router_id = options.id.as_str(),
                service = service.name.as_str(),
                err = %err,
                "unable to add service routes; skipping"
            );
        }
    }
}

async fn create_routes<'a>(
    table: &Table,
    options: &RouterOptions,
    service: &str,
    nodes: impl Iterator<Item = &'a Node>,
) -> Result<(), RouterError> {
    for node in nodes {
        match table.create(local_route(options, service, node)).await {
            Ok(()) | Err(TableError::DuplicateRoute) => {}
            Err(source) => {
                return Err(RouterError::ManageRoute {
                    service: service.to_string(),
                    source,
                })
            }
        }
    }
    Ok(())
}

async fn delete_routes<'a>(
    table: &Table,
    options: &RouterOptions,
    service: &str,
    nodes: impl Iterator<Item = &'a Node>,
) -> Result<(), RouterError> {
    for node in nodes {
        match table.delete(local_route(options, service, node)).await {
            Ok(()) | Err(TableError::RouteNotFound) => {}
            Err(source) => {
                return Err(RouterError::ManageRoute {
                    service: service.to_string(),
                    source,
                })
            }
        }
    }
    Ok(())
}

async fn update_routes<'a>(
    table: &Table,
    options: &RouterOptions,
    service: &str,
    nodes: impl Iterator<Item = &'a Node>,
) -> Result<(), RouterError> {
    for node in nodes {
        let route = local_route(options, service, node);
        let updated = match table
            .update_with(route.clone(), UpdatePolicy::InsertIfMissing)
            .await
        {
            // Unknown service: the update introduces it.
            Err(TableError::RouteNotFound) => table.create(route).await,
            other => other,
        };
        match updated {
            Ok(()) | Err(TableError::DuplicateRoute) => {}
            Err(source) => {
                return Err(RouterError::ManageRoute {
                    service: service.to_string(),
                    source,
                })
            }
        }
    }
    Ok(())
}

/// Applies one registry change to the table.
pub(crate) async fn apply_registry_event(
    table: &Table,
    options: &RouterOptions,
    registry_event: &RegistryEvent,
) -> Result<(), RouterError> {
    let service = &registry_event.service;
    debug!(
        event = events::ROUTER_REGISTRY_EVENT,
        component = COMPONENT,
        router_id = options.id.as_str(),
        action = %registry_event.action,
        service = service.name.as_str(),
        nodes = service.nodes.len(),
        "mirroring registry event"
    );

    match registry_event.action {
        RegistryAction::Create => {
            create_routes(table, options, &service.name, service.nodes.iter()).await
        }
        RegistryAction::Update => {
            update_routes(table, options, &service.name, service.nodes.iter()).await
        }
        RegistryAction::Delete => {
            delete_routes(table, options, &service.name, service.nodes.iter()).await
        }
    }
}

/// Follows the registry watch stream until the session ends.
pub(crate) async fn mirror_registry(
    table: Arc<Table>,
    options: Arc<RouterOptions>,
    mut watcher: Box<dyn RegistryWatcher>,
    shutdown: CancellationToken,
) -> Result<(), RouterError> {
    let result = loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break Ok(()),
            next = watcher.next() => match next {
                Ok(registry_event) => {
                    let applied = apply_registry_event(&table, &options, &registry_event).await;
                    if let Err(err) = applied {
                        break Err(err);
                    }
                }
                Err(RegistryError::WatcherStopped) => break Ok(()),
                Err(err) => break Err(err.into()),
            },
        }
    };

    watcher.stop();
    info!(
        event = events::RUNTIME_TASK_EXIT,
        component = COMPONENT,
        router_id = options.id.as_str(),
        failed = result.is_err(),
        "registry mirror stopped"
    );
    result
}

/// Forwards table events into the engine queue until the session ends.
///
/// Routes the advertise strategy excludes never reach the engine. Every send
/// waits for the engine and is abandoned on cancellation.
pub(crate) async fn drain_table(
    mut watcher: Watcher,
    strategy: AdvertiseStrategy,
    engine_queue: Sender<Event>,
    shutdown: CancellationToken,
) -> Result<(), RouterError> {
    let result = loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break Ok(()),
            next = watcher.next() => match next {
                Ok(event) if !strategy.admits(&event.route) => {
                    debug!(
                        event = events::ADVERT_FILTERED,
                        component = COMPONENT,
                        route = %fields::format_route(&event.route),
                        reason = fields::REASON_STRATEGY,
                        "table event not advertised under current strategy"
                    );
                }
                Ok(event) => {
                    tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => break Ok(()),
                        sent = engine_queue.send(event) => {
                            if sent.is_err() {
                                debug!(
                                    event = events::RUNTIME_TASK_EXIT,
                                    component = COMPONENT,
                                    watcher_id = %watcher.id(),
                                    reason = fields::REASON_QUEUE_CLOSED,
                                    "engine queue closed; stopping table drain"
                                );
                                break Ok(());
                            }
                        }
                    }
                }
                Err(TableError::WatcherStopped) => break Ok(()),
                Err(err) => break Err(err.into()),
            },
        }
    };

    watcher.stop();
    result
}
