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

//! A [`Registry`] backed by a static JSON file plus in-process registrations.
//!
//! The file maps service names to their nodes:
//!
//! ```json
//! {
//!   "greeter": [ { "id": "greeter-1", "address": "10.0.0.1:8080" } ]
//! }
//! ```
//!
//! The file is re-read on every listing, so edits show up on the next bootstrap.
//! Only [`StaticFileRegistry::register`] and [`StaticFileRegistry::deregister`]
//! produce watch events.

use async_trait::async_trait;
use mesh_router::{
    Node, Registry, RegistryAction, RegistryError, RegistryEvent, RegistryWatcher, Service,
};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tracing::{debug, warn};

const WATCH_QUEUE_SIZE: usize = 64;

type ServiceNodes = BTreeMap<String, Vec<Node>>;

pub struct StaticFileRegistry {
    static_file: Option<PathBuf>,
    registered: RwLock<ServiceNodes>,
    changes: broadcast::Sender<RegistryEvent>,
}

impl StaticFileRegistry {
    pub fn new(static_file: impl Into<PathBuf>) -> Self {
        Self::build(Some(static_file.into()))
    }

    /// A registry with no backing file and no services.
    pub fn empty() -> Self {
        Self::build(None)
    }

    fn build(static_file: Option<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(WATCH_QUEUE_SIZE);
        Self {
            static_file,
            registered: RwLock::new(BTreeMap::new()),
            changes,
        }
    }

    /// Adds the nodes of `service` and announces them as a `Create` event.
    pub async fn register(&self, service: Service) {
        {
            let mut registered = self.registered.write().await;
            let nodes = registered.entry(service.name.clone()).or_default();
            for node in &service.nodes {
                if !nodes.iter().any(|known| known.id == node.id) {
                    nodes.push(node.clone());
                }
            }
        }
        self.announce(RegistryAction::Create, service);
    }

    /// Removes the nodes of `service` and announces them as a `Delete` event.
    pub async fn deregister(&self, service: Service) {
        {
            let mut registered = self.registered.write().await;
            if let Some(nodes) = registered.get_mut(&service.name) {
                nodes.retain(|known| !service.nodes.iter().any(|node| node.id == known.id));
                if nodes.is_empty() {
                    registered.remove(&service.name);
                }
            }
        }
        self.announce(RegistryAction::Delete, service);
    }

    fn announce(&self, action: RegistryAction, service: Service) {
        debug!(
            action = %action,
            service = service.name.as_str(),
            nodes = service.nodes.len(),
            "registry change"
        );
        // No receivers simply means nobody is watching yet.
        let _ = self.changes.send(RegistryEvent { action, service });
    }

    fn read_static_file(&self) -> Result<ServiceNodes, RegistryError> {
        let Some(static_file) = self.static_file.as_ref() else {
            return Ok(BTreeMap::new());
        };

        let data = fs::read_to_string(static_file).map_err(|e| {
            RegistryError::Backend(format!(
                "unable to read {}: {e}",
                static_file.display()
            ))
        })?;
        let services: HashMap<String, Vec<Node>> = serde_json::from_str(&data).map_err(|e| {
            RegistryError::Backend(format!(
                "unable to parse {}: {e}",
                static_file.display()
            ))
        })?;

        debug!(
            file = %static_file.display(),
            services = services.len(),
            "read static registry file"
        );
        Ok(services.into_iter().collect())
    }

    async fn snapshot(&self) -> Result<ServiceNodes, RegistryError> {
        let mut services = self.read_static_file()?;
        let registered = self.registered.read().await;
        for (name, nodes) in registered.iter() {
            let known = services.entry(name.clone()).or_default();
            for node in nodes {
                if !known.iter().any(|existing| existing.id == node.id) {
                    known.push(node.clone());
                }
            }
        }
        Ok(services)
    }
}

#[async_trait]
impl Registry for StaticFileRegistry {
    async fn list_services(&self) -> Result<Vec<Service>, RegistryError> {
        Ok(self
            .snapshot()
            .await?
            .into_keys()
            .map(|name| Service {
                name,
                ..Default::default()
            })
            .collect())
    }

    async fn get_service(&self, name: &str) -> Result<Vec<Service>, RegistryError> {
        let mut services = self.snapshot().await?;
        let nodes = services
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        Ok(vec![Service {
            name: name.to_string(),
            nodes,
            ..Default::default()
        }])
    }

    async fn watch(&self) -> Result<Box<dyn RegistryWatcher>, RegistryError> {
        Ok(Box::new(StaticFileWatcher {
            changes: self.changes.subscribe(),
            stopped: false,
        }))
    }
}

struct StaticFileWatcher {
    changes: broadcast::Receiver<RegistryEvent>,
    stopped: bool,
}

#[async_trait]
impl RegistryWatcher for StaticFileWatcher {
    async fn next(&mut self) -> Result<RegistryEvent, RegistryError> {
        loop {
            if self.stopped {
                return Err(RegistryError::WatcherStopped);
            }
            match self.changes.recv().await {
                Ok(change) => return Ok(change),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "registry watcher lagged; changes skipped");
                }
                Err(RecvError::Closed) => return Err(RegistryError::WatcherStopped),
            }
        }
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}
