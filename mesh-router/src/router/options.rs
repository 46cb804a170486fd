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

//! Router construction options.

use crate::error::RouterError;
use crate::route::{Route, DEFAULT_LINK};
use crate::table::TableOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Network name local routes are registered under.
pub const DEFAULT_NETWORK: &str = "local";
/// Interval between two flap-damping scans.
pub const DEFAULT_ADVERTISE_TICK: Duration = Duration::from_secs(5);
/// Lifetime peers should grant the routes of one advert.
pub const DEFAULT_ADVERT_TTL: Duration = Duration::from_secs(60);
/// Damping entries untouched for this long are dropped while still held back.
pub const DEFAULT_MAX_SUPPRESS_TIME: Duration = Duration::from_secs(300);

/// Which table routes a router hands to its peers.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvertiseStrategy {
    /// Every route in the table.
    #[default]
    All,
    /// Only routes on the local link.
    Local,
    /// Nothing; the router keeps its table to itself.
    None,
}

impl AdvertiseStrategy {
    /// Whether `route` may appear in an advert under this strategy.
    pub fn admits(self, route: &Route) -> bool {
        match self {
            AdvertiseStrategy::All => true,
            AdvertiseStrategy::Local => route.link == DEFAULT_LINK,
            AdvertiseStrategy::None => false,
        }
    }
}

///
/// [`RouterOptions`] configures one [`Router`](crate::Router) instance.
///
/// Durations are expressed in milliseconds in serialized form, so a JSON5 config
/// reads `advertise_tick_ms: 5000`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterOptions {
    /// Unique router id stamped on every advert and every local route.
    pub id: String,
    pub network: String,
    /// Installs a wildcard default route through this gateway on `advertise`.
    pub gateway: Option<String>,
    #[serde(rename = "advertise_tick_ms", with = "duration_ms")]
    pub advertise_tick: Duration,
    #[serde(rename = "advert_ttl_ms", with = "duration_ms")]
    pub advert_ttl: Duration,
    #[serde(rename = "max_suppress_time_ms", with = "duration_ms")]
    pub max_suppress_time: Duration,
    pub advertise: AdvertiseStrategy,
    pub table: TableOptions,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            network: DEFAULT_NETWORK.to_string(),
            gateway: None,
            advertise_tick: DEFAULT_ADVERTISE_TICK,
            advert_ttl: DEFAULT_ADVERT_TTL,
            max_suppress_time: DEFAULT_MAX_SUPPRESS_TIME,
            advertise: AdvertiseStrategy::default(),
            table: TableOptions::default(),
        }
    }
}

impl RouterOptions {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_advertise(mut self, strategy: AdvertiseStrategy) -> Self {
        self.advertise = strategy;
        self
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = Some(gateway.into());
        self
    }

    pub fn with_advertise_tick(mut self, tick: Duration) -> Self {
        self.advertise_tick = tick;
        self
    }

    pub fn with_table(mut self, table: TableOptions) -> Self {
        self.table = table;
        self
    }

    /// Rejects settings an advertising session cannot run with.
    pub fn validate(&self) -> Result<(), RouterError> {
        if self.id.is_empty() {
            return Err(RouterError::InvalidOptions("id must not be empty"));
        }
        if self.advertise_tick.is_zero() {
            return Err(RouterError::InvalidOptions("advertise_tick_ms must be non-zero"));
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AdvertiseStrategy, RouterOptions, DEFAULT_ADVERTISE_TICK, DEFAULT_MAX_SUPPRESS_TIME,
    };
    use crate::error::RouterError;
    use crate::route::Route;
    use crate::table::UpdatePolicy;
    use std::time::Duration;

    #[test]
    fn defaults_generate_distinct_ids() {
        let first = RouterOptions::default();
        let second = RouterOptions::default();

        assert_ne!(first.id, second.id);
        assert_eq!(first.network, "local");
        assert_eq!(first.advertise_tick, DEFAULT_ADVERTISE_TICK);
        assert_eq!(first.max_suppress_time, DEFAULT_MAX_SUPPRESS_TIME);
        assert!(first.gateway.is_none());
        assert_eq!(first.advertise, AdvertiseStrategy::All);
        assert_eq!(first.validate(), Ok(()));
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let options: RouterOptions = serde_json::from_str(
            r#"{
                "id": "router-a",
                "gateway": "10.0.0.1:8080",
                "advertise_tick_ms": 250,
                "advertise": "local",
                "table": { "update_policy": "insert_if_missing" }
            }"#,
        )
        .unwrap();

        assert_eq!(options.id, "router-a");
        assert_eq!(options.gateway.as_deref(), Some("10.0.0.1:8080"));
        assert_eq!(options.advertise_tick, Duration::from_millis(250));
        assert_eq!(options.advert_ttl, Duration::from_secs(60));
        assert_eq!(options.advertise, AdvertiseStrategy::Local);
        assert_eq!(options.table.update_policy, UpdatePolicy::InsertIfMissing);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed = serde_json::from_str::<RouterOptions>(r#"{ "tick": 5 }"#);
        assert!(parsed.is_err());

        let parsed = serde_json::from_str::<RouterOptions>(r#"{ "address": "10.0.0.1:8084" }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn zero_advertise_tick_is_rejected() {
        let options: RouterOptions =
            serde_json::from_str(r#"{ "advertise_tick_ms": 0 }"#).unwrap();

        assert_eq!(
            options.validate(),
            Err(RouterError::InvalidOptions(
                "advertise_tick_ms must be non-zero"
            ))
        );
    }

    #[test]
    fn strategies_filter_by_link() {
        let local = Route {
            link: "local".to_string(),
            ..Default::default()
        };
        let remote = Route {
            link: "peer-link".to_string(),
            ..Default::default()
        };

        assert!(AdvertiseStrategy::All.admits(&remote));
        assert!(AdvertiseStrategy::Local.admits(&local));
        assert!(!AdvertiseStrategy::Local.admits(&remote));
        assert!(!AdvertiseStrategy::None.admits(&local));
    }
}
