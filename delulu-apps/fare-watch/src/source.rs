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

//! # Flight Data Source Boundary
//!
//! Request/response shapes exchanged with the external flight-data service.
//! The wire format stays behind [`FlightSource`]; [`crate::GoogleFlights`] is
//! the production implementation.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::offers::OfferSet;
use crate::options::{Language, SearchOptions};
use crate::price_graph::PriceGraphPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationKind {
    Airport,
    /// Knowledge-graph id of a metropolitan area, e.g. `/m/0d6lp`.
    City,
}

/// A location as the data source addresses it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaceId {
    pub kind: LocationKind,
    pub id: String,
}

impl PlaceId {
    pub fn airport(code: impl Into<String>) -> Self {
        Self {
            kind: LocationKind::Airport,
            id: code.into(),
        }
    }

    pub fn city(id: impl Into<String>) -> Self {
        Self {
            kind: LocationKind::City,
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leg {
    pub date: NaiveDate,
    pub from: Vec<PlaceId>,
    pub to: Vec<PlaceId>,
}

/// An offer query with every city already resolved: the legs to fly plus
/// the options they are priced under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub legs: Vec<Leg>,
    pub options: SearchOptions,
}

impl ResolvedQuery {
    pub fn departure(&self) -> Option<NaiveDate> {
        self.legs.first().map(|l| l.date)
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        if self.legs.len() == 2 {
            self.legs.get(1).map(|l| l.date)
        } else {
            None
        }
    }
}

/// One calendar-graph window: departures in `[departure_from, departure_to]`,
/// returning `trip_length` days later (`None` for one-way).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarRequest {
    pub from: Vec<PlaceId>,
    pub to: Vec<PlaceId>,
    pub departure_from: NaiveDate,
    pub departure_to: NaiveDate,
    pub trip_length: Option<u32>,
    pub options: SearchOptions,
}

/// The external flight-data service.
///
/// Implementations return raw data and report failures with `anyhow`;
/// the session applies validation, filtering, deadlines and cancellation.
#[async_trait]
pub trait FlightSource: Send + Sync {
    /// Cheap reachability check run once when a session is created.
    async fn probe(&self) -> anyhow::Result<()>;

    async fn resolve_city(&self, name: &str, language: &Language) -> anyhow::Result<PlaceId>;

    /// Lowest fare per departure date. May include dates outside the
    /// requested window or without a price; the caller filters.
    async fn calendar_graph(
        &self,
        request: &CalendarRequest,
    ) -> anyhow::Result<Vec<PriceGraphPoint>>;

    async fn shopping_results(&self, query: &ResolvedQuery) -> anyhow::Result<OfferSet>;
}
