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

mod support;

use mesh_router::{
    EventType, Query, QueryPolicy, Route, Table, TableError, TableOptions, WatchOptions,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn create_twice_keeps_a_single_route() {
    support::init_logging();
    let table = Table::new(TableOptions::default());
    let route = Route {
        service: "dest.svc".to_string(),
        gateway: "dest.gw".to_string(),
        network: "n".to_string(),
        link: "l".to_string(),
        metric: 10,
        ..Default::default()
    };

    assert_eq!(table.create(route.clone()).await, Ok(()));
    assert_eq!(table.size().await, 1);
    assert_eq!(table.create(route).await, Err(TableError::DuplicateRoute));
    assert_eq!(table.size().await, 1);
}

#[tokio::test]
async fn delete_after_create_then_missing() {
    let table = Table::default();
    let route = support::route("foo", "10.0.0.1:80");

    table.create(route.clone()).await.unwrap();
    assert_eq!(table.delete(route.clone()).await, Ok(()));
    assert_eq!(table.delete(route).await, Err(TableError::RouteNotFound));
}

#[tokio::test]
async fn update_contract() {
    let table = Table::default();
    let mut route = support::route("foo", "10.0.0.1:80");

    assert_eq!(
        table.update(route.clone()).await,
        Err(TableError::RouteNotFound)
    );

    table.create(route.clone()).await.unwrap();
    route.metric = 42;
    assert_eq!(table.update(route).await, Ok(()));
    assert_eq!(table.size().await, 1);
    assert_eq!(table.list().await[0].metric, 42);
}

#[tokio::test]
async fn wildcard_lookup_is_the_union_of_list() {
    let table = Table::default();
    for (service, address) in [("a", "1"), ("a", "2"), ("b", "3"), ("c", "4")] {
        table.create(support::route(service, address)).await.unwrap();
    }

    let mut listed: Vec<u64> = table.list().await.iter().map(Route::hash).collect();
    let mut looked_up: Vec<u64> = table
        .lookup(&Query::all())
        .await
        .unwrap()
        .iter()
        .map(Route::hash)
        .collect();
    listed.sort_unstable();
    looked_up.sort_unstable();

    assert_eq!(listed, looked_up);
}

#[tokio::test]
async fn network_filter_honours_wildcards_on_both_sides() {
    let table = Table::default();
    let mut n1 = support::route("svc", "1");
    n1.network = "n1".to_string();
    let mut n2 = support::route("svc", "2");
    n2.network = "n2".to_string();
    let mut any = support::route("svc", "3");
    any.network = "*".to_string();
    for route in [n1, n2, any] {
        table.create(route).await.unwrap();
    }

    let found = table
        .lookup(&Query::service("svc").with_network("n1"))
        .await
        .unwrap();

    let mut networks: Vec<String> = found.into_iter().map(|route| route.network).collect();
    networks.sort();
    assert_eq!(networks, vec!["*".to_string(), "n1".to_string()]);
}

#[tokio::test]
async fn lookup_policy_on_unknown_service() {
    let table = Table::default();

    assert_eq!(
        table.lookup(&Query::service("svc")).await,
        Err(TableError::RouteNotFound)
    );
    assert_eq!(
        table
            .lookup(&Query::service("svc").with_policy(QueryPolicy::IgnoreIfNone))
            .await,
        Ok(Vec::new())
    );
}

#[tokio::test]
async fn filtered_watcher_sees_only_its_service() {
    let table = Table::default();
    let mut watcher = table.watch(WatchOptions::service("foo")).await;

    table.create(support::route("foo", "1")).await.unwrap();
    let event = watcher.next().await.unwrap();
    assert_eq!(event.event_type, EventType::Create);
    assert_eq!(event.route.service, "foo");

    table.create(support::route("bar", "1")).await.unwrap();
    let unblocked = tokio::time::timeout(Duration::from_millis(100), watcher.next()).await;
    assert!(unblocked.is_err());
}

#[tokio::test]
async fn every_watcher_gets_its_own_copy() {
    let table = Table::default();
    let mut first = table.watch(WatchOptions::default()).await;
    let mut second = table.watch(WatchOptions::default()).await;

    table.create(support::route("foo", "1")).await.unwrap();
    table.delete(support::route("foo", "1")).await.unwrap();

    for watcher in [&mut first, &mut second] {
        assert_eq!(watcher.next().await.unwrap().event_type, EventType::Create);
        assert_eq!(watcher.next().await.unwrap().event_type, EventType::Delete);
    }
}

#[tokio::test]
async fn raw_event_stream_works_inside_select() {
    let table = Table::default();
    let mut watcher = table.watch(WatchOptions::service("foo")).await;
    let deadline = tokio::time::sleep(Duration::from_secs(5));
    tokio::pin!(deadline);

    table.create(support::route("bar", "1")).await.unwrap();
    table.create(support::route("foo", "1")).await.unwrap();
    table.update(support::route("foo", "1")).await.unwrap();

    let mut seen = Vec::new();
    while seen.len() < 2 {
        tokio::select! {
            _ = &mut deadline => break,
            event = watcher.events().recv() => {
                let event = event.unwrap();
                assert_eq!(event.route.service, "foo");
                seen.push(event.event_type);
            }
        }
    }
    assert_eq!(seen, vec![EventType::Create, EventType::Update]);

    let idle = tokio::time::timeout(Duration::from_millis(100), watcher.events().recv()).await;
    assert!(idle.is_err());
}

#[tokio::test]
async fn stopped_watcher_does_not_affect_the_table() {
    let table = Table::default();
    let mut watcher = table.watch(WatchOptions::default()).await;

    watcher.stop();

    assert_eq!(watcher.next().await, Err(TableError::WatcherStopped));
    assert_eq!(table.create(support::route("foo", "1")).await, Ok(()));
    assert_eq!(watcher.next().await, Err(TableError::WatcherStopped));
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_writers_each_land_exactly_once() {
    let table = Arc::new(Table::default());
    let mut writers = Vec::new();

    for writer in 0..8 {
        let table = table.clone();
        writers.push(tokio::spawn(async move {
            for n in 0..25 {
                table
                    .create(support::route("svc", &format!("{writer}-{n}")))
                    .await
                    .unwrap();
            }
        }));
    }
    for writer in writers {
        writer.await.unwrap();
    }

    assert_eq!(table.size().await, 200);
}

#[tokio::test]
async fn slow_watcher_never_blocks_mutations() {
    let table = Table::default();
    let mut slow = table.watch(WatchOptions::default()).await;

    let writes = tokio::time::timeout(Duration::from_secs(5), async {
        for n in 0..100 {
            table
                .create(support::route("svc", &n.to_string()))
                .await
                .unwrap();
        }
    })
    .await;
    assert!(writes.is_ok());

    // The bounded queue kept the oldest events; later ones were dropped for this watcher.
    assert_eq!(slow.next().await.unwrap().route.address, "0");
}
