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

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Matches any value in queries, watch filters and default-gateway routes.
pub const WILDCARD: &str = "*";
/// Link assigned to routes sourced from the local registry.
pub const DEFAULT_LINK: &str = "local";
/// Metric assigned to routes sourced from the local registry.
pub const DEFAULT_LOCAL_METRIC: i64 = 1;

///
/// [`Route`] is one path by which a named service can be reached.
///
/// A service may be reachable through many routes at the same time. Each route is
/// identified by [`Route::hash`], which covers every field except `metric`, so two
/// routes that only differ in metric are the same path.
///
/// # Examples
///
/// ```
/// use mesh_router::Route;
///
/// let route = Route {
///     service: "dest.svc".to_string(),
///     gateway: "dest.gw".to_string(),
///     network: "n".to_string(),
///     link: "l".to_string(),
///     metric: 10,
///     ..Default::default()
/// };
///
/// let mut cheaper = route.clone();
/// cheaper.metric = 1;
/// assert_eq!(route.hash(), cheaper.hash());
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Name of the destination service.
    pub service: String,
    /// Address of the service node.
    pub address: String,
    /// Next hop, when it differs from `address`.
    pub gateway: String,
    /// Network the route belongs to.
    pub network: String,
    /// Id of the router that owns the route.
    pub router: String,
    /// Link the route is reachable through.
    pub link: String,
    /// Path cost; lower is better.
    pub metric: i64,
}

impl Route {
    /// 64-bit path identity over everything but the metric.
    pub fn hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.service.hash(&mut hasher);
        self.address.hash(&mut hasher);
        self.gateway.hash(&mut hasher);
        self.network.hash(&mut hasher);
        self.router.hash(&mut hasher);
        self.link.hash(&mut hasher);
        hasher.finish()
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} via {} gw={} net={} router={} link={} metric={}",
            self.service,
            self.address,
            self.gateway,
            self.network,
            self.router,
            self.link,
            self.metric
        )
    }
}
