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

// Library for delulu-fare-watch
// Finds round-trip fares that undercut Google Flights' "low price" band.

mod calendar_parser;
pub(crate) mod consent_cookie;
mod deep_link;
mod error;
mod flights_proto;
mod google_flights;
mod locations;
mod offers;
mod offers_parser;
mod options;
mod orchestrator;
mod price_graph;
mod selector;
mod session;
mod source;

pub use calendar_parser::parse_calendar_graph;
pub use consent_cookie::consent_cookie_header;
pub use deep_link::{deep_link, encode_tfs, SEARCH_BASE_URL};
pub use error::FareError;
pub use google_flights::GoogleFlights;
pub use locations::{AirportCode, Locations};
pub use offers::{Itinerary, Layover, Offer, OfferArgs, OfferArgsBuilder, OfferSet, Price, PriceLevel, PriceRange};
pub use offers_parser::parse_offers_page;
pub use options::{
    Cabin, Currency, Language, SearchOptions, Stops, Travelers, TripType, MAX_TRAVELERS,
};
pub use orchestrator::{
    find_cheap_offers, find_cheap_offers_streaming, CheapOffer, CheapOfferSearch, FailurePolicy,
};
pub use price_graph::{PriceGraphArgs, PriceGraphPoint, MAX_GRAPH_WINDOW_DAYS};
pub use selector::select_best;
pub use session::{Session, SessionConfig};
pub use source::{CalendarRequest, FlightSource, Leg, LocationKind, PlaceId, ResolvedQuery};

// Re-exported so callers do not need a direct tokio-util dependency.
pub use tokio_util::sync::CancellationToken;
