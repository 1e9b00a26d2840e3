//!  Delulu Travel Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Error taxonomy shared by every query operation.

use chrono::NaiveDate;
use thiserror::Error;

use crate::locations::AirportCode;

#[derive(Debug, Error)]
pub enum FareError {
    /// Session setup failed (client build, proxy, handshake).
    #[error("session initialization failed: {0:#}")]
    Initialization(anyhow::Error),

    /// Malformed query parameters, rejected before any network I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Transport or parsing failure on one query.
    #[error("query failed: {0:#}")]
    Query(anyhow::Error),

    /// Explicit cancellation or per-query deadline.
    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("deep link serialization failed: {0}")]
    Serialization(String),

    /// The airport-level re-query came back without a typical-price band.
    #[error("missing price range for {origin}-{destination} departing {departure}")]
    MissingPriceRange {
        departure: NaiveDate,
        return_date: Option<NaiveDate>,
        origin: AirportCode,
        destination: AirportCode,
    },
}

impl FareError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Whether the error must end the whole run even when the caller
    /// is willing to skip failed price-graph points.
    pub fn is_fatal_for_run(&self) -> bool {
        match self {
            Self::Initialization(_)
            | Self::InvalidArgument(_)
            | Self::Cancelled(_)
            | Self::Serialization(_) => true,
            Self::Query(_) | Self::MissingPriceRange { .. } => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}
