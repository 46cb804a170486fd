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

//! Declarative route filter used by [`Table::lookup`](crate::Table::lookup).

use crate::route::{Route, WILDCARD};
use serde::{Deserialize, Serialize};

/// What a lookup on one specific service returns when that service has no routes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum QueryPolicy {
    /// Fail with [`TableError::RouteNotFound`](crate::TableError::RouteNotFound).
    #[default]
    DiscardIfNone,
    /// Reserved. Behaves exactly like [`QueryPolicy::DiscardIfNone`].
    ClosestMatch,
    /// Return an empty result instead of failing.
    IgnoreIfNone,
}

impl QueryPolicy {
    pub(crate) fn errors_on_missing_service(self) -> bool {
        match self {
            QueryPolicy::DiscardIfNone | QueryPolicy::ClosestMatch => true,
            QueryPolicy::IgnoreIfNone => false,
        }
    }
}

///
/// [`Query`] selects routes by exact value or [`WILDCARD`] on each field.
///
/// A field matches when either side is the wildcard or both values are equal; a
/// route is selected when every field matches.
///
/// # Examples
///
/// ```
/// use mesh_router::{Query, QueryPolicy};
///
/// let query = Query::service("foo")
///     .with_network("n1")
///     .with_policy(QueryPolicy::IgnoreIfNone);
///
/// assert_eq!(query.service, "foo");
/// assert_eq!(query.gateway, "*");
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub service: String,
    pub gateway: String,
    pub network: String,
    pub router: String,
    pub link: String,
    pub policy: QueryPolicy,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            service: WILDCARD.to_string(),
            gateway: WILDCARD.to_string(),
            network: WILDCARD.to_string(),
            router: WILDCARD.to_string(),
            link: WILDCARD.to_string(),
            policy: QueryPolicy::default(),
        }
    }
}

impl Query {
    /// Matches every route of every service.
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches every route of one service.
    pub fn service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Self::default()
        }
    }

    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = gateway.into();
        self
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    pub fn with_router(mut self, router: impl Into<String>) -> Self {
        self.router = router.into();
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn with_policy(mut self, policy: QueryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub(crate) fn is_wildcard_service(&self) -> bool {
        self.service == WILDCARD
    }

    /// Field-wise match of everything but the service, which picks the bucket.
    pub(crate) fn matches(&self, route: &Route) -> bool {
        field_matches(&self.gateway, &route.gateway)
            && field_matches(&self.network, &route.network)
            && field_matches(&self.router, &route.router)
            && field_matches(&self.link, &route.link)
    }
}

fn field_matches(wanted: &str, actual: &str) -> bool {
    wanted == WILDCARD || actual == WILDCARD || wanted == actual
}
