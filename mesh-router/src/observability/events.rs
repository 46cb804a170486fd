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

//! Canonical structured event names used across `mesh-router`.

// Table mutations and change-feed delivery.
pub const TABLE_ROUTE_CREATE: &str = "table_route_create";
pub const TABLE_ROUTE_UPDATE: &str = "table_route_update";
pub const TABLE_ROUTE_DELETE: &str = "table_route_delete";
pub const TABLE_WATCH_REGISTER: &str = "table_watch_register";
pub const TABLE_WATCH_DROPPED: &str = "table_watch_dropped";
pub const TABLE_WATCH_PRUNED: &str = "table_watch_pruned";

// Router lifecycle.
pub const ROUTER_ADVERTISE_START: &str = "router_advertise_start";
pub const ROUTER_ADVERTISE_OK: &str = "router_advertise_ok";
pub const ROUTER_BOOTSTRAP_SKIP: &str = "router_bootstrap_skip";
pub const ROUTER_REGISTRY_EVENT: &str = "router_registry_event";
pub const ROUTER_STOP: &str = "router_stop";
pub const ROUTER_TASK_FAILED: &str = "router_task_failed";
pub const ROUTER_PROCESS_ADVERT: &str = "router_process_advert";

// Flap damping.
pub const DAMPING_SIGHTING: &str = "damping_sighting";
pub const DAMPING_SUPPRESS: &str = "damping_suppress";
pub const DAMPING_RECOVER: &str = "damping_recover";
pub const DAMPING_FLAP: &str = "damping_flap";
pub const DAMPING_EVICT: &str = "damping_evict";
pub const ADVERT_EMIT: &str = "advert_emit";
pub const ADVERT_EMIT_CANCELLED: &str = "advert_emit_cancelled";
pub const ADVERT_FILTERED: &str = "advert_filtered";
pub const ADVERT_ENGINE_STOP: &str = "advert_engine_stop";

// Runtime task supervision.
pub const RUNTIME_SPAWN_START: &str = "runtime_spawn_start";
pub const RUNTIME_SPAWN_OK: &str = "runtime_spawn_ok";
pub const RUNTIME_TASK_EXIT: &str = "runtime_task_exit";
