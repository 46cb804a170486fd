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

//! Router lifecycle: advertising sessions, advert processing and accessors.
//!
//! ```
//! use mesh_router::{Router, RouterOptions, StatusCode};
//! use registry_static_file::StaticFileRegistry;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = Arc::new(StaticFileRegistry::empty());
//! let router = Router::new(RouterOptions::default().with_id("router-a"), registry);
//!
//! let mut adverts = router.advertise().await.unwrap();
//! let announce = adverts.recv().await.unwrap();
//! assert_eq!(announce.router_id, "router-a");
//!
//! router.stop().await.unwrap();
//! assert_eq!(router.status().await.code, StatusCode::Stopped);
//! # });
//! ```

pub(crate) mod emission;
pub(crate) mod flap_damping;
pub mod options;
pub(crate) mod registry_mirror;
pub mod status;

use crate::error::{RouterError, TableError};
use crate::event::{Advert, AdvertType, Event, EventType};
use crate::observability::{events, fields};
use crate::registry::Registry;
use crate::route::{Route, DEFAULT_LINK, DEFAULT_LOCAL_METRIC, WILDCARD};
use crate::runtime::task_runtime::{
    report_task_failure, spawn_monitored_task, spawn_reporting_task, spawn_router_task,
    TASK_ERROR_QUEUE_SIZE,
};
use crate::table::query::Query;
use crate::table::watcher::{WatchOptions, Watcher};
use crate::table::{Table, UpdatePolicy};
use emission::{build_advert, spawn_emission};
use flap_damping::{AdvertEngine, EngineTiming};
use options::RouterOptions;
use status::{Status, StatusCode};
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver, WeakSender};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

const COMPONENT: &str = "router";

/// Depth of the queue between the table drain and the damping engine.
const EVENT_QUEUE_SIZE: usize = 1;
/// Depth of the advert output handed to the transport.
const ADVERT_QUEUE_SIZE: usize = 1;

/// Resources of one advertising session.
struct Session {
    shutdown: CancellationToken,
    emissions: TaskTracker,
    adverts: WeakSender<Advert>,
    tasks: Vec<JoinHandle<()>>,
}

struct RouterState {
    status: Status,
    /// Bumped on every `advertise`; a supervisor only acts on its own session.
    generation: u64,
    session: Option<Session>,
}

///
/// [`Router`] keeps a [`Table`] in sync with a [`Registry`] and turns table
/// changes into damped [`Advert`]s for peer routers.
///
/// The transport collaborator calls [`Router::advertise`] once, forwards every
/// advert it yields, feeds peer adverts into [`Router::process`] and calls
/// [`Router::stop`] on shutdown.
///
/// Lifecycle: `Stopped -> Running -> Error -> Stopped`, and `Error -> Running`
/// on the next `advertise`. A failed session is never restarted automatically.
pub struct Router {
    options: Arc<RouterOptions>,
    table: Arc<Table>,
    registry: Arc<dyn Registry>,
    /// Serializes `advertise` and `stop` over their whole duration.
    lifecycle: Mutex<()>,
    state: Arc<RwLock<RouterState>>,
}

impl Router {
    /// Creates a stopped router with a fresh table built from `options.table`.
    pub fn new(options: RouterOptions, registry: Arc<dyn Registry>) -> Self {
        let table = Arc::new(Table::new(options.table.clone()));
        Self::with_table(options, table, registry)
    }

    /// Creates a stopped router over an existing, possibly shared, table.
    pub fn with_table(
        options: RouterOptions,
        table: Arc<Table>,
        registry: Arc<dyn Registry>,
    ) -> Self {
        Self {
            options: Arc::new(options),
            table,
            registry,
            lifecycle: Mutex::new(()),
            state: Arc::new(RwLock::new(RouterState {
                status: Status::stopped(),
                generation: 0,
                session: None,
            })),
        }
    }

    pub fn id(&self) -> &str {
        &self.options.id
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    pub fn table(&self) -> Arc<Table> {
        self.table.clone()
    }

    pub async fn lookup(&self, query: &Query) -> Result<Vec<Route>, TableError> {
        self.table.lookup(query).await
    }

    pub async fn watch(&self, options: WatchOptions) -> Watcher {
        self.table.watch(options).await
    }

    /// Current lifecycle status.
    pub async fn status(&self) -> Status {
        let state = self.state.read().await;
        let mut status = state.status.clone();

        let emitting = state
            .session
            .as_ref()
            .is_some_and(|session| !session.emissions.is_empty());
        if status.code == StatusCode::Running && emitting {
            status.code = StatusCode::Advertising;
        }
        status
    }

    /// Starts an advertising session and returns its advert stream.
    ///
    /// The first advert is an `Announce` carrying the routes known right after the
    /// registry bootstrap. The stream closes once the session ends.
    ///
    /// A router hands out one advert stream per session: calling this while the
    /// session runs fails with [`RouterError::AlreadyRunning`] and leaves the
    /// running session untouched. Options that cannot drive a session fail with
    /// [`RouterError::InvalidOptions`] before anything starts.
    pub async fn advertise(&self) -> Result<Receiver<Advert>, RouterError> {
        self.options.validate()?;
        let _lifecycle = self.lifecycle.lock().await;

        let previous = {
            let mut state = self.state.write().await;
            if state.status.is_running() {
                return Err(RouterError::AlreadyRunning);
            }
            state.session.take()
        };
        if let Some(session) = previous {
            reap(self.id(), session).await;
        }

        info!(
            event = events::ROUTER_ADVERTISE_START,
            component = COMPONENT,
            router_id = self.id(),
            "starting advertising session"
        );

        registry_mirror::bootstrap(&self.table, self.registry.as_ref(), &self.options).await;
        let announce_routes = self.advertised_routes().await;
        self.install_default_gateway().await?;

        let table_watcher = self.table.watch(WatchOptions::default()).await;
        let registry_watcher = self.registry.watch().await?;

        let shutdown = CancellationToken::new();
        let emissions = TaskTracker::new();
        let (adverts_tx, adverts_rx) = mpsc::channel(ADVERT_QUEUE_SIZE);
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_SIZE);
        let (errors_tx, errors_rx) = mpsc::channel(TASK_ERROR_QUEUE_SIZE);

        let announce = build_advert(
            self.id(),
            AdvertType::Announce,
            self.options.advert_ttl,
            announce_routes
                .into_iter()
                .map(|route| Event::new(EventType::Create, route))
                .collect(),
        );
        debug!(
            event = events::ADVERT_EMIT,
            component = COMPONENT,
            router_id = self.id(),
            advert = %fields::format_advert(&announce),
            "queueing announce advert"
        );
        spawn_emission(&emissions, shutdown.clone(), adverts_tx.clone(), announce);

        let mut state = self.state.write().await;
        state.generation += 1;
        let generation = state.generation;

        let mut tasks = Vec::with_capacity(4);
        tasks.push(spawn_reporting_task(
            self.id(),
            "registry_mirror",
            errors_tx.clone(),
            registry_mirror::mirror_registry(
                self.table.clone(),
                self.options.clone(),
                registry_watcher,
                shutdown.clone(),
            ),
        ));
        tasks.push(spawn_reporting_task(
            self.id(),
            "table_drain",
            errors_tx.clone(),
            registry_mirror::drain_table(
                table_watcher,
                self.options.advertise,
                events_tx,
                shutdown.clone(),
            ),
        ));

        let mut engine = AdvertEngine::new(
            self.options.id.clone(),
            EngineTiming {
                advertise_tick: self.options.advertise_tick,
                advert_ttl: self.options.advert_ttl,
                max_suppress_time: self.options.max_suppress_time,
            },
            events_rx,
            adverts_tx.clone(),
            emissions.clone(),
            shutdown.clone(),
        );
        let engine_router_id = self.options.id.clone();
        let engine_errors = errors_tx.clone();
        tasks.push(spawn_monitored_task(
            self.id(),
            "advert_engine",
            errors_tx,
            async move {
                if let Err(err) = engine.process_events().await {
                    report_task_failure(&engine_router_id, "advert_engine", &engine_errors, err);
                }
                engine.finish().await;
            },
        ));

        tasks.push(spawn_router_task(
            self.id(),
            "supervisor",
            supervise(
                self.state.clone(),
                generation,
                errors_rx,
                shutdown.clone(),
                self.options.id.clone(),
            ),
        ));

        state.status = Status::running();
        state.session = Some(Session {
            shutdown,
            emissions,
            adverts: adverts_tx.downgrade(),
            tasks,
        });
        drop(state);

        info!(
            event = events::ROUTER_ADVERTISE_OK,
            component = COMPONENT,
            router_id = self.id(),
            generation,
            "advertising session started"
        );
        Ok(adverts_rx)
    }

    /// Applies a peer advert to the table in event-time order.
    ///
    /// Events about routes this router originated are skipped. Stops at the first
    /// event that fails to apply; events applied before it stay.
    pub async fn process(&self, advert: &Advert) -> Result<(), RouterError> {
        let mut ordered = advert.events.clone();
        ordered.sort_by_key(|event| event.timestamp);

        debug!(
            event = events::ROUTER_PROCESS_ADVERT,
            component = COMPONENT,
            router_id = self.id(),
            from = advert.router_id.as_str(),
            event_count = ordered.len(),
            "processing peer advert"
        );

        for event in ordered {
            if event.route.router == self.options.id {
                debug!(
                    event = events::ROUTER_PROCESS_ADVERT,
                    component = COMPONENT,
                    router_id = self.id(),
                    from = advert.router_id.as_str(),
                    route = %fields::format_route(&event.route),
                    reason = fields::REASON_OWN_ROUTE,
                    "skipping own route echoed by peer"
                );
                continue;
            }
            let service = event.route.service.clone();
            self.table
                .update_with(event.route, UpdatePolicy::InsertIfMissing)
                .await
                .map_err(|source| RouterError::ApplyAdvert { service, source })?;
        }
        Ok(())
    }

    /// Queues an `Update` advert carrying the whole table.
    pub async fn solicit(&self) -> Result<(), RouterError> {
        let state = self.state.read().await;
        if !state.status.is_running() {
            return Err(RouterError::NotRunning);
        }
        let session = state.session.as_ref().ok_or(RouterError::NotRunning)?;
        let adverts = session.adverts.upgrade().ok_or(RouterError::NotRunning)?;

        let refresh = self
            .advertised_routes()
            .await
            .into_iter()
            .map(|route| Event::new(EventType::Update, route))
            .collect();
        let advert = build_advert(self.id(), AdvertType::Update, self.options.advert_ttl, refresh);
        spawn_emission(&session.emissions, session.shutdown.clone(), adverts, advert);
        Ok(())
    }

    /// Ends the advertising session and waits for all of its tasks.
    ///
    /// No-op when stopped. From the error state, reaps the failed session.
    pub async fn stop(&self) -> Result<(), RouterError> {
        let _lifecycle = self.lifecycle.lock().await;

        let session = {
            let mut state = self.state.write().await;
            if state.status.code == StatusCode::Stopped {
                return Ok(());
            }
            state.status = Status::stopped();
            state.session.take()
        };

        info!(
            event = events::ROUTER_STOP,
            component = COMPONENT,
            router_id = self.id(),
            "stopping router"
        );
        if let Some(session) = session {
            reap(self.id(), session).await;
        }
        Ok(())
    }

    /// Table routes the advertise strategy lets peers see.
    async fn advertised_routes(&self) -> Vec<Route> {
        let strategy = self.options.advertise;
        let mut routes = self.table.list().await;
        routes.retain(|route| strategy.admits(route));
        routes
    }

    async fn install_default_gateway(&self) -> Result<(), RouterError> {
        let Some(gateway) = self.options.gateway.as_ref() else {
            return Ok(());
        };

        let route = Route {
            service: WILDCARD.to_string(),
            address: WILDCARD.to_string(),
            gateway: gateway.clone(),
            network: WILDCARD.to_string(),
            router: self.options.id.clone(),
            link: DEFAULT_LINK.to_string(),
            metric: DEFAULT_LOCAL_METRIC,
        };
        match self.table.create(route).await {
            Ok(()) | Err(TableError::DuplicateRoute) => Ok(()),
            Err(source) => Err(RouterError::ManageRoute {
                service: WILDCARD.to_string(),
                source,
            }),
        }
    }
}

/// Cancels a session and waits until every task and emission has finished.
async fn reap(router_id: &str, session: Session) {
    session.shutdown.cancel();
    for task in session.tasks {
        if let Err(err) = task.await {
            warn!(
                event = events::RUNTIME_TASK_EXIT,
                component = COMPONENT,
                router_id,
                err = %err,
                "router task did not exit cleanly"
            );
        }
    }
    session.emissions.close();
    session.emissions.wait().await;
}

/// Moves the router to the error state on the first task failure of its session.
async fn supervise(
    state: Arc<RwLock<RouterState>>,
    generation: u64,
    mut failures: Receiver<RouterError>,
    shutdown: CancellationToken,
    router_id: String,
) {
    let failure = tokio::select! {
        biased;
        _ = shutdown.cancelled() => None,
        failure = failures.recv() => failure,
    };
    let Some(err) = failure else {
        return;
    };

    let mut state = state.write().await;
    if state.generation != generation || !state.status.is_running() {
        return;
    }

    error!(
        event = events::ROUTER_TASK_FAILED,
        component = COMPONENT,
        router_id = router_id.as_str(),
        err = %err,
        "advertising session failed; router entering error state"
    );
    state.status = Status::failed(err);
    shutdown.cancel();
}
