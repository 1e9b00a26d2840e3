//! # Prost Abstraction Layer
//!
//! Protobuf messages behind the `tfs` parameter of Google Flights search URLs.
//! Declared with prost derives so no protoc step is needed at build time.

use prost::Message;

/// `kind` value marking a city (knowledge-graph id) rather than an airport.
pub(crate) const LOCATION_KIND_CITY: i32 = 3;

/// An airport code or a city id. Airports leave `kind` unset so the message
/// stays `{2: code}` on the wire.
#[derive(Clone, PartialEq, Message)]
pub struct Location {
    #[prost(int32, optional, tag = "1")]
    pub kind: Option<i32>,
    #[prost(string, tag = "2")]
    pub code: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct FlightData {
    #[prost(string, tag = "2")]
    pub date: String,
    #[prost(int32, optional, tag = "5")]
    pub max_stops: Option<i32>,
    #[prost(string, repeated, tag = "6")]
    pub airlines: Vec<String>,
    #[prost(message, repeated, tag = "13")]
    pub from_flight: Vec<Location>,
    #[prost(message, repeated, tag = "14")]
    pub to_flight: Vec<Location>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Info {
    #[prost(message, repeated, tag = "3")]
    pub data: Vec<FlightData>,
    #[prost(enumeration = "Passenger", repeated, tag = "8")]
    pub passengers: Vec<i32>,
    #[prost(enumeration = "Seat", optional, tag = "9")]
    pub seat: Option<i32>,
    #[prost(enumeration = "Trip", optional, tag = "19")]
    pub trip: Option<i32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Seat {
    UnknownSeat = 0,
    Economy = 1,
    PremiumEconomy = 2,
    Business = 3,
    First = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Trip {
    UnknownTrip = 0,
    RoundTrip = 1,
    OneWay = 2,
    MultiCity = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Passenger {
    UnknownPassenger = 0,
    Adult = 1,
    Child = 2,
    InfantInSeat = 3,
    InfantOnLap = 4,
}

pub(crate) fn encode_info(info: &Info) -> Vec<u8> {
    info.encode_to_vec()
}
