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

//! # Price Graph
//!
//! Side-effect free half of the price-graph query: argument validation,
//! candidate departure enumeration, request windowing and normalization of
//! whatever the data source returned.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::error::FareError;
use crate::locations::Locations;
use crate::offers::Price;
use crate::options::{SearchOptions, TripType};

/// Widest departure window one calendar request may cover.
pub const MAX_GRAPH_WINDOW_DAYS: usize = 61;

/// Lowest fare for one departure date. `price` of `None` or zero means the
/// fare is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceGraphPoint {
    pub departure: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub price: Option<Price>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceGraphArgs {
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    /// Days between departure and return.
    pub trip_length: u32,
    pub src_cities: Vec<String>,
    pub dst_cities: Vec<String>,
    pub options: SearchOptions,
}

impl PriceGraphArgs {
    pub fn validate(&self) -> Result<(), FareError> {
        self.options.validate()?;
        if self.range_start > self.range_end {
            return Err(FareError::invalid(format!(
                "range start {} is after range end {}",
                self.range_start, self.range_end
            )));
        }
        if self.options.trip == TripType::MultiCity {
            return Err(FareError::invalid(
                "price graphs are only available for round-trip and one-way searches",
            ));
        }
        self.src_locations()?;
        self.dst_locations()?;
        Ok(())
    }

    pub(crate) fn src_locations(&self) -> Result<Locations, FareError> {
        Locations::cities(self.src_cities.iter().cloned())
            .map_err(|e| FareError::invalid(format!("source cities: {e}")))
    }

    pub(crate) fn dst_locations(&self) -> Result<Locations, FareError> {
        Locations::cities(self.dst_cities.iter().cloned())
            .map_err(|e| FareError::invalid(format!("destination cities: {e}")))
    }

    fn return_for(&self, departure: NaiveDate) -> Option<NaiveDate> {
        match self.options.trip {
            TripType::RoundTrip => departure.checked_add_days(Days::new(self.trip_length.into())),
            _ => None,
        }
    }

    /// Departure dates whose whole trip fits in the range, ascending.
    pub fn candidate_departures(&self) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        let mut day = self.range_start;
        while day <= self.range_end {
            let fits = match self.options.trip {
                TripType::RoundTrip => self.return_for(day).is_some_and(|r| r <= self.range_end),
                _ => true,
            };
            if !fits {
                break;
            }
            dates.push(day);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        dates
    }

    /// Request trip length: `None` for one-way graphs.
    pub(crate) fn request_trip_length(&self) -> Option<u32> {
        match self.options.trip {
            TripType::RoundTrip => Some(self.trip_length),
            _ => None,
        }
    }

    /// Consecutive departure windows of at most [`MAX_GRAPH_WINDOW_DAYS`].
    pub(crate) fn windows(&self) -> Vec<(NaiveDate, NaiveDate)> {
        self.candidate_departures()
            .chunks(MAX_GRAPH_WINDOW_DAYS)
            .filter_map(|chunk| Some((*chunk.first()?, *chunk.last()?)))
            .collect()
    }

    /// Keep priced points on candidate dates with the expected return date,
    /// one per departure (cheapest wins), ascending by departure.
    pub(crate) fn normalize(&self, raw: Vec<PriceGraphPoint>) -> Vec<PriceGraphPoint> {
        let candidates: BTreeSet<NaiveDate> = self.candidate_departures().into_iter().collect();
        let mut by_day: BTreeMap<NaiveDate, PriceGraphPoint> = BTreeMap::new();

        for point in raw {
            let Some(price) = point.price.filter(|&p| p > 0) else {
                continue;
            };
            if !candidates.contains(&point.departure) {
                continue;
            }
            let expected_return = self.return_for(point.departure);
            if point.return_date.is_some() && point.return_date != expected_return {
                tracing::trace!(
                    "Dropping graph point {} -> {:?}: trip length mismatch",
                    point.departure,
                    point.return_date
                );
                continue;
            }
            let normalized = PriceGraphPoint {
                departure: point.departure,
                return_date: expected_return,
                price: Some(price),
            };
            by_day
                .entry(point.departure)
                .and_modify(|kept| {
                    if kept.price.is_some_and(|p| price < p) {
                        *kept = normalized;
                    }
                })
                .or_insert(normalized);
        }

        by_day.into_values().collect()
    }
}
