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

mod config;

use crate::config::{AdvertLogFormat, Config};
use clap::Parser;
use mesh_router::{Advert, Router};
use registry_static_file::StaticFileRegistry;
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command()]
struct RouterArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

fn log_advert(format: AdvertLogFormat, advert: &Advert) -> Result<(), Box<dyn Error>> {
    match format {
        AdvertLogFormat::Summary => info!(
            router_id = advert.router_id.as_str(),
            advert_type = %advert.advert_type,
            event_count = advert.events.len(),
            ttl_secs = advert.ttl.as_secs(),
            "advert"
        ),
        AdvertLogFormat::Json => info!(advert = %serde_json::to_string(advert)?, "advert"),
    }
    Ok(())
}

/// Why the advert relay loop ended.
#[derive(Debug, PartialEq, Eq)]
enum RelayEnd {
    Interrupted,
    StreamClosed,
    LogFailed,
}

/// Prints adverts until `shutdown` resolves, the stream closes or printing fails.
async fn relay_adverts<S>(
    adverts: &mut Receiver<Advert>,
    format: AdvertLogFormat,
    shutdown: S,
) -> RelayEnd
where
    S: Future,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Ctrl-C received");
                return RelayEnd::Interrupted;
            }
            advert = adverts.recv() => match advert {
                Some(advert) => {
                    if let Err(err) = log_advert(format, &advert) {
                        error!(err = %err, "unable to log advert; shutting down");
                        return RelayEnd::LogFailed;
                    }
                }
                None => return RelayEnd::StreamClosed,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    info!("Started mesh-routerd");

    let args = RouterArgs::parse();
    let config = Config::load(&args.config)?;

    let registry = Arc::new(StaticFileRegistry::new(config.registry.file_path));
    let router = Router::new(config.router, registry);

    let mut adverts = router.advertise().await?;
    info!(router_id = router.id(), "advertising; press Ctrl-C to stop");

    let end = relay_adverts(
        &mut adverts,
        config.advert_log.format,
        tokio::signal::ctrl_c(),
    )
    .await;
    if end == RelayEnd::StreamClosed {
        let status = router.status().await;
        warn!(
            code = %status.code,
            err = ?status.error,
            "advert stream closed"
        );
    }

    router.stop().await?;
    info!("mesh-routerd stopped");
    Ok(())
}
