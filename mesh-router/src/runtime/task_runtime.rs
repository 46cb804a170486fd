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

//! Runtime helpers for spawning the long-lived router tasks.

use crate::error::RouterError;
use crate::observability::events;
use std::future::Future;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

const COMPONENT: &str = "task_runtime";

/// Capacity of the error queue shared by the reporting tasks of one session.
pub(crate) const TASK_ERROR_QUEUE_SIZE: usize = 3;

/// Spawns one named router task on the ambient tokio runtime.
pub(crate) fn spawn_router_task<F>(
    router_id: &str,
    task: &'static str,
    future: F,
) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    debug!(
        event = events::RUNTIME_SPAWN_START,
        component = COMPONENT,
        router_id,
        task,
        "spawning router task"
    );

    let exit_router_id = router_id.to_string();
    let handle = tokio::spawn(async move {
        future.await;
        debug!(
            event = events::RUNTIME_TASK_EXIT,
            component = COMPONENT,
            router_id = exit_router_id.as_str(),
            task,
            "router task exited"
        );
    });

    debug!(
        event = events::RUNTIME_SPAWN_OK,
        component = COMPONENT,
        router_id,
        task,
        "router task spawned"
    );
    handle
}

/// Logs a task failure and forwards it to the session error queue.
pub(crate) fn report_task_failure(
    router_id: &str,
    task: &'static str,
    errors: &Sender<RouterError>,
    err: RouterError,
) {
    error!(
        event = events::ROUTER_TASK_FAILED,
        component = COMPONENT,
        router_id,
        task,
        err = %err,
        "router task failed"
    );
    if errors.try_send(err).is_err() {
        warn!(
            event = events::ROUTER_TASK_FAILED,
            component = COMPONENT,
            router_id,
            task,
            "error queue unavailable; failure not reported"
        );
    }
}

/// Spawns a router task and reports a panic in it as [`RouterError::TaskPanicked`].
///
/// The returned handle completes once the task has exited, whether it panicked or not.
pub(crate) fn spawn_monitored_task<F>(
    router_id: &str,
    task: &'static str,
    errors: Sender<RouterError>,
    future: F,
) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let inner = spawn_router_task(router_id, task, future);
    let monitor_router_id = router_id.to_string();
    tokio::spawn(async move {
        match inner.await {
            Err(err) if err.is_panic() => report_task_failure(
                &monitor_router_id,
                task,
                &errors,
                RouterError::TaskPanicked(task),
            ),
            Err(err) => warn!(
                event = events::RUNTIME_TASK_EXIT,
                component = COMPONENT,
                router_id = monitor_router_id.as_str(),
                task,
                err = %err,
                "router task cancelled"
            ),
            Ok(()) => {}
        }
    })
}

/// Spawns a router task whose failure or panic is forwarded to the session error queue.
pub(crate) fn spawn_reporting_task<F>(
    router_id: &str,
    task: &'static str,
    errors: Sender<RouterError>,
    future: F,
) -> JoinHandle<()>
where
    F: Future<Output = Result<(), RouterError>> + Send + 'static,
{
    let report_router_id = router_id.to_string();
    let report_errors = errors.clone();
    spawn_monitored_task(router_id, task, errors, async move {
        if let Err(err) = future.await {
            report_task_failure(&report_router_id, task, &report_errors, err);
        }
    })
}
