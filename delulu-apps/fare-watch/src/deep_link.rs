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

//! # Deep Link Serializer
//!
//! Side-effect free construction of shareable Google Flights search URLs.
//! The `tfs` parameter is the base64 of the protobuf [`Info`] message.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::error::FareError;
use crate::flights_proto::{self, FlightData, Info, LOCATION_KIND_CITY, Location, Seat, Trip};
use crate::source::{Leg, LocationKind, PlaceId, ResolvedQuery};

pub const SEARCH_BASE_URL: &str = "https://www.google.com/travel/flights/search";

/// UI state blob the search page expects alongside `tfs`.
const TFU_PARAM: &str = "EgQIABABIgA";

fn to_location(place: &PlaceId) -> Location {
    Location {
        kind: match place.kind {
            LocationKind::Airport => None,
            LocationKind::City => Some(LOCATION_KIND_CITY),
        },
        code: place.id.clone(),
    }
}

fn to_flight_data(leg: &Leg, max_stops: Option<i32>, index: usize) -> Result<FlightData, FareError> {
    if leg.from.is_empty() || leg.to.is_empty() {
        return Err(FareError::Serialization(format!(
            "leg {} on {} has no {} locations",
            index + 1,
            leg.date,
            if leg.from.is_empty() { "origin" } else { "destination" }
        )));
    }
    if let Some(place) = leg.from.iter().chain(&leg.to).find(|p| p.id.trim().is_empty()) {
        return Err(FareError::Serialization(format!(
            "leg {} on {} has an empty {:?} id",
            index + 1,
            leg.date,
            place.kind
        )));
    }
    Ok(FlightData {
        date: leg.date.format("%Y-%m-%d").to_string(),
        max_stops,
        airlines: Vec::new(),
        from_flight: leg.from.iter().map(to_location).collect(),
        to_flight: leg.to.iter().map(to_location).collect(),
    })
}

/// Base64 `tfs` value for a resolved query.
pub fn encode_tfs(query: &ResolvedQuery) -> Result<String, FareError> {
    if query.legs.is_empty() {
        return Err(FareError::Serialization("query has no flight legs".into()));
    }
    query
        .options
        .validate()
        .map_err(|e| FareError::Serialization(e.to_string()))?;

    let max_stops = query.options.stops.max_stops();
    let data = query
        .legs
        .iter()
        .enumerate()
        .map(|(i, leg)| to_flight_data(leg, max_stops, i))
        .collect::<Result<Vec<_>, _>>()?;

    let info = Info {
        data,
        passengers: query.options.travelers.passenger_codes(),
        seat: Some(Seat::from(query.options.cabin) as i32),
        trip: Some(Trip::from(query.options.trip) as i32),
    };
    Ok(STANDARD.encode(flights_proto::encode_info(&info)))
}

/// Shareable search URL. Identical queries always yield identical URLs.
pub fn deep_link(query: &ResolvedQuery) -> Result<String, FareError> {
    let tfs = encode_tfs(query)?;
    Ok(format!(
        "{}?tfs={}&hl={}&curr={}&tfu={}",
        SEARCH_BASE_URL,
        urlencoding::encode(&tfs),
        urlencoding::encode(query.options.language.as_str()),
        query.options.currency,
        TFU_PARAM
    ))
}
