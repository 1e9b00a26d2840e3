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

//! # Offer Queries
//!
//! Arguments and results of a detailed offer query for one date pair.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::FareError;
use crate::locations::{AirportCode, Locations};
use crate::options::{SearchOptions, TripType};

/// Whole units of the query currency, as displayed by the data source.
pub type Price = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferArgs {
    pub date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub src: Locations,
    pub dst: Locations,
    pub options: SearchOptions,
}

impl OfferArgs {
    pub fn builder(date: NaiveDate) -> OfferArgsBuilder {
        OfferArgsBuilder {
            date,
            return_date: None,
            src_cities: Vec::new(),
            src_airports: Vec::new(),
            dst_cities: Vec::new(),
            dst_airports: Vec::new(),
            options: SearchOptions::default(),
        }
    }

    pub fn validate(&self) -> Result<(), FareError> {
        self.options.validate()?;
        if self.src.is_empty() || self.dst.is_empty() {
            return Err(FareError::invalid("origin and destination are required"));
        }
        match (self.options.trip, self.return_date) {
            (TripType::RoundTrip, None) => Err(FareError::invalid(
                "round trip requires a return date",
            )),
            (TripType::RoundTrip, Some(ret)) if ret < self.date => Err(FareError::invalid(
                format!("return date {} is before departure {}", ret, self.date),
            )),
            (TripType::OneWay, Some(_)) => Err(FareError::invalid(
                "one-way trip cannot have a return date",
            )),
            (TripType::MultiCity, _) => Err(FareError::invalid(
                "multi-city itineraries are not supported by offer queries",
            )),
            _ => Ok(()),
        }
    }

    /// Whether both sides name exactly one airport, the only shape whose
    /// price range is comparable.
    pub fn is_single_pair(&self) -> bool {
        self.src.single_airport().is_some() && self.dst.single_airport().is_some()
    }
}

#[derive(Debug, Clone)]
pub struct OfferArgsBuilder {
    date: NaiveDate,
    return_date: Option<NaiveDate>,
    src_cities: Vec<String>,
    src_airports: Vec<String>,
    dst_cities: Vec<String>,
    dst_airports: Vec<String>,
    options: SearchOptions,
}

impl OfferArgsBuilder {
    pub fn return_date(mut self, return_date: NaiveDate) -> Self {
        self.return_date = Some(return_date);
        self
    }

    pub fn maybe_return_date(mut self, return_date: Option<NaiveDate>) -> Self {
        self.return_date = return_date;
        self
    }

    pub fn src_cities<I, S>(mut self, cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.src_cities = cities.into_iter().map(Into::into).collect();
        self
    }

    pub fn src_airports<I, S>(mut self, airports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.src_airports = airports.into_iter().map(Into::into).collect();
        self
    }

    pub fn dst_cities<I, S>(mut self, cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dst_cities = cities.into_iter().map(Into::into).collect();
        self
    }

    pub fn dst_airports<I, S>(mut self, airports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dst_airports = airports.into_iter().map(Into::into).collect();
        self
    }

    pub fn options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<OfferArgs, FareError> {
        let args = OfferArgs {
            date: self.date,
            return_date: self.return_date,
            src: Locations::from_parts("origin", self.src_cities, self.src_airports)?,
            dst: Locations::from_parts("destination", self.dst_cities, self.dst_airports)?,
            options: self.options,
        };
        args.validate()?;
        Ok(args)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layover {
    pub airport_city: Option<String>,
    pub duration_minutes: Option<i32>,
}

/// Itinerary details. Carried for display only, never used in comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Itinerary {
    pub airline: Option<String>,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub arrival_plus_days: i32,
    pub duration_minutes: Option<i32>,
    pub stops: Option<i32>,
    pub layovers: Vec<Layover>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Offer {
    pub departure: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub origin: AirportCode,
    pub destination: AirportCode,
    /// Absent or zero means the offer is not comparable.
    pub price: Option<Price>,
    pub itinerary: Itinerary,
}

impl Offer {
    pub fn comparable_price(&self) -> Option<Price> {
        self.price.filter(|&p| p > 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceLevel {
    Low,
    Typical,
    High,
}

/// Typical-price band for one route and date pair: prices in `low..=high`
/// are typical, below `low` they are low, above `high` they are high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceRange {
    pub low: Price,
    pub high: Price,
}

impl PriceRange {
    /// Bounds are reordered if given backwards.
    pub fn new(a: Price, b: Price) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    pub fn typical(&self) -> std::ops::RangeInclusive<Price> {
        self.low..=self.high
    }

    pub fn classify(&self, price: Price) -> PriceLevel {
        if price < self.low {
            PriceLevel::Low
        } else if price > self.high {
            PriceLevel::High
        } else {
            PriceLevel::Typical
        }
    }
}

/// Offers for one query (unordered) and, when known, the price band.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OfferSet {
    pub offers: Vec<Offer>,
    pub price_range: Option<PriceRange>,
}
