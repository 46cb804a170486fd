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

//! Router lifecycle status.

use crate::error::RouterError;
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusCode {
    /// Advertising session is live.
    Running,
    /// Live, with at least one advert emission in flight.
    Advertising,
    Stopped,
    /// A session task failed; call `advertise` again to recover.
    Error,
}

impl Display for StatusCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusCode::Running => write!(f, "running"),
            StatusCode::Advertising => write!(f, "advertising"),
            StatusCode::Stopped => write!(f, "stopped"),
            StatusCode::Error => write!(f, "error"),
        }
    }
}

/// Snapshot of a router's lifecycle state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Status {
    pub code: StatusCode,
    /// The failure that moved the router to [`StatusCode::Error`].
    pub error: Option<RouterError>,
}

impl Status {
    pub(crate) fn stopped() -> Self {
        Self {
            code: StatusCode::Stopped,
            error: None,
        }
    }

    pub(crate) fn running() -> Self {
        Self {
            code: StatusCode::Running,
            error: None,
        }
    }

    pub(crate) fn failed(error: RouterError) -> Self {
        Self {
            code: StatusCode::Error,
            error: Some(error),
        }
    }

    /// True for both [`StatusCode::Running`] and [`StatusCode::Advertising`].
    pub fn is_running(&self) -> bool {
        matches!(self.code, StatusCode::Running | StatusCode::Advertising)
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::stopped()
    }
}
