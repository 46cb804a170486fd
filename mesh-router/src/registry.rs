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

//! Service registry collaborator the router mirrors local routes from.

use crate::error::RegistryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// One running instance of a service.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub id: String,
    pub address: String,
    pub metadata: HashMap<String, String>,
}

/// A named service and the nodes currently serving it.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    pub name: String,
    pub version: String,
    pub nodes: Vec<Node>,
}

/// Change kind reported by a [`RegistryWatcher`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryAction {
    Create,
    Update,
    Delete,
}

impl Display for RegistryAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryAction::Create => write!(f, "create"),
            RegistryAction::Update => write!(f, "update"),
            RegistryAction::Delete => write!(f, "delete"),
        }
    }
}

/// One registry change. `service.nodes` lists the nodes the action applies to.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RegistryEvent {
    pub action: RegistryAction,
    pub service: Service,
}

/// Stream of registry changes.
#[async_trait]
pub trait RegistryWatcher: Send {
    /// Waits for the next change. Fails once the watcher is stopped.
    async fn next(&mut self) -> Result<RegistryEvent, RegistryError>;

    /// Stops the watcher. Pending and future [`RegistryWatcher::next`] calls fail.
    fn stop(&mut self);
}

///
/// [`Registry`] is the source of truth for locally reachable services.
///
/// The router reads it once when it starts advertising and then follows its watch
/// stream for the rest of the advertising session.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Lists known services. Returned entries may omit their nodes.
    async fn list_services(&self) -> Result<Vec<Service>, RegistryError>;

    /// Returns every version of `name` with its nodes.
    async fn get_service(&self, name: &str) -> Result<Vec<Service>, RegistryError>;

    /// Opens a new change stream.
    async fn watch(&self) -> Result<Box<dyn RegistryWatcher>, RegistryError>;
}
