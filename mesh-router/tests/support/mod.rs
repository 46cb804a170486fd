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

use mesh_router::{Advert, Route};
use registry_static_file::StaticFileRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Receiver;

pub(crate) const REGISTRY_CONFIG: &str =
    "../utils/registry-static-file/static-configs/testdata.json";

/// Routes the static test registry yields after bootstrap.
#[allow(dead_code)]
pub(crate) const REGISTRY_ROUTE_COUNT: usize = 4;

pub(crate) fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[allow(dead_code)]
pub(crate) fn static_registry() -> Arc<StaticFileRegistry> {
    Arc::new(StaticFileRegistry::new(REGISTRY_CONFIG))
}

#[allow(dead_code)]
pub(crate) fn empty_registry() -> Arc<StaticFileRegistry> {
    Arc::new(StaticFileRegistry::empty())
}

#[allow(dead_code)]
pub(crate) fn route(service: &str, address: &str) -> Route {
    Route {
        service: service.to_string(),
        address: address.to_string(),
        gateway: String::new(),
        network: "local".to_string(),
        router: "peer-router".to_string(),
        link: "local".to_string(),
        metric: 1,
    }
}

#[allow(dead_code)]
pub(crate) async fn next_advert(
    adverts: &mut Receiver<Advert>,
    within: Duration,
) -> Option<Advert> {
    tokio::time::timeout(within, adverts.recv())
        .await
        .ok()
        .flatten()
}

/// Drains the advert stream and reports whether it closed within `within`.
#[allow(dead_code)]
pub(crate) async fn stream_closes(adverts: &mut Receiver<Advert>, within: Duration) -> bool {
    tokio::time::timeout(within, async { while adverts.recv().await.is_some() {} })
        .await
        .is_ok()
}
