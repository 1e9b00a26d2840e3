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

//! # Search Options
//!
//! Traveler counts, currency, cabin, stop policy, trip type and response
//! language shared by every query of a run. Codes are validated on
//! construction so a typo fails locally instead of at the remote service.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::FareError;
use crate::flights_proto::{Passenger, Seat, Trip};

// =============================================================================
// Travelers
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Travelers {
    pub adults: u32,
    pub children: u32,
    pub infants_in_seat: u32,
    pub infants_on_lap: u32,
}

/// Passenger cap of a single Google Flights search.
pub const MAX_TRAVELERS: u32 = 9;

impl Default for Travelers {
    fn default() -> Self {
        Self::adults(1)
    }
}

impl Travelers {
    pub fn adults(adults: u32) -> Self {
        Self {
            adults,
            children: 0,
            infants_in_seat: 0,
            infants_on_lap: 0,
        }
    }

    pub fn validate(&self) -> Result<(), FareError> {
        if self.adults == 0 {
            return Err(FareError::invalid("at least one adult is required"));
        }
        match self.total() {
            Some(n) if n <= MAX_TRAVELERS => {}
            _ => {
                return Err(FareError::invalid(format!(
                    "at most {MAX_TRAVELERS} travelers per search"
                )));
            }
        }
        if self.infants_on_lap > self.adults {
            return Err(FareError::invalid(format!(
                "cannot have more infants on lap ({}) than adults ({})",
                self.infants_on_lap, self.adults
            )));
        }
        Ok(())
    }

    /// `None` on overflow.
    pub fn total(&self) -> Option<u32> {
        self.adults
            .checked_add(self.children)?
            .checked_add(self.infants_in_seat)?
            .checked_add(self.infants_on_lap)
    }

    /// One protobuf passenger entry per traveler, adults first.
    pub(crate) fn passenger_codes(&self) -> Vec<i32> {
        [
            (Passenger::Adult, self.adults),
            (Passenger::Child, self.children),
            (Passenger::InfantInSeat, self.infants_in_seat),
            (Passenger::InfantOnLap, self.infants_on_lap),
        ]
        .into_iter()
        .flat_map(|(kind, count)| std::iter::repeat_n(kind as i32, count as usize))
        .collect()
    }
}

// =============================================================================
// Cabin / stops / trip type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cabin {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl From<Cabin> for Seat {
    fn from(c: Cabin) -> Seat {
        match c {
            Cabin::Economy => Seat::Economy,
            Cabin::PremiumEconomy => Seat::PremiumEconomy,
            Cabin::Business => Seat::Business,
            Cabin::First => Seat::First,
        }
    }
}

impl FromStr for Cabin {
    type Err = FareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "economy" | "e" => Ok(Cabin::Economy),
            "premium_economy" | "premium" | "pe" => Ok(Cabin::PremiumEconomy),
            "business" | "b" => Ok(Cabin::Business),
            "first" | "f" => Ok(Cabin::First),
            _ => Err(FareError::invalid(format!(
                "invalid cabin class: {s}. Use: economy, premium_economy, business, first"
            ))),
        }
    }
}

/// Stop-count policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Stops {
    #[default]
    Any,
    Nonstop,
    OneStop,
    TwoOrFewer,
}

impl Stops {
    /// Maximum number of stops, `None` when unrestricted.
    pub fn max_stops(self) -> Option<i32> {
        match self {
            Stops::Any => None,
            Stops::Nonstop => Some(0),
            Stops::OneStop => Some(1),
            Stops::TwoOrFewer => Some(2),
        }
    }

    /// Code used by the calendar RPC.
    pub(crate) fn rpc_code(self) -> i32 {
        match self {
            Stops::Any => 0,
            Stops::Nonstop => 1,
            Stops::OneStop => 2,
            Stops::TwoOrFewer => 3,
        }
    }
}

impl FromStr for Stops {
    type Err = FareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any" | "anystops" => Ok(Stops::Any),
            "nonstop" | "direct" | "0" => Ok(Stops::Nonstop),
            "onestop" | "one" | "1" => Ok(Stops::OneStop),
            "twoorfewer" | "two" | "2" => Ok(Stops::TwoOrFewer),
            _ => Err(FareError::invalid(format!(
                "invalid stop policy: {s}. Use: any, nonstop, onestop, twoorfewer"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TripType {
    #[default]
    RoundTrip,
    OneWay,
    MultiCity,
}

impl From<TripType> for Trip {
    fn from(t: TripType) -> Trip {
        match t {
            TripType::RoundTrip => Trip::RoundTrip,
            TripType::OneWay => Trip::OneWay,
            TripType::MultiCity => Trip::MultiCity,
        }
    }
}

impl FromStr for TripType {
    type Err = FareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "roundtrip" | "round" | "rt" => Ok(TripType::RoundTrip),
            "oneway" | "one" | "ow" => Ok(TripType::OneWay),
            "multicity" | "multi" | "mc" => Ok(TripType::MultiCity),
            _ => Err(FareError::invalid(format!(
                "invalid trip type: {s}. Use: roundtrip, oneway, multicity"
            ))),
        }
    }
}

// =============================================================================
// Currency
// =============================================================================

/// ISO 4217 codes accepted by Google Flights.
const ISO_4217: &[&str] = &[
    "AED", "ARS", "AUD", "BGN", "BHD", "BRL", "CAD", "CHF", "CLP", "CNY", "COP", "CZK", "DKK",
    "DZD", "EGP", "EUR", "GBP", "GEL", "HKD", "HUF", "IDR", "ILS", "INR", "ISK", "JOD", "JPY",
    "KES", "KRW", "KWD", "KZT", "LKR", "MAD", "MXN", "MYR", "NGN", "NOK", "NZD", "OMR", "PEN",
    "PHP", "PKR", "PLN", "QAR", "RON", "RSD", "RUB", "SAR", "SEK", "SGD", "THB", "TRY", "TWD",
    "UAH", "USD", "VND", "XAF", "XOF", "ZAR",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Currency(&'static str);

impl Currency {
    pub const USD: Currency = Currency("USD");
    pub const EUR: Currency = Currency("EUR");

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::USD
    }
}

impl FromStr for Currency {
    type Err = FareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        ISO_4217
            .iter()
            .find(|code| **code == upper)
            .map(|code| Currency(*code))
            .ok_or_else(|| FareError::invalid(format!("unknown ISO 4217 currency code: {s:?}")))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

// =============================================================================
// Language
// =============================================================================

static BCP47_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]{2,3})(?:-([A-Za-z]{4}))?(?:-([A-Za-z]{2}|[0-9]{3}))?$").unwrap()
});

/// BCP-47 language tag (language, optional script, optional region),
/// stored in canonical casing: `en`, `en-US`, `zh-Hant-TW`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language(String);

impl Language {
    pub fn english() -> Self {
        Language("en".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::english()
    }
}

impl FromStr for Language {
    type Err = FareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "-");
        let caps = BCP47_RE
            .captures(&normalized)
            .ok_or_else(|| FareError::invalid(format!("invalid BCP-47 language tag: {s:?}")))?;

        let mut tag = caps[1].to_ascii_lowercase();
        if let Some(script) = caps.get(2) {
            let script = script.as_str();
            tag.push('-');
            tag.push_str(&script[..1].to_ascii_uppercase());
            tag.push_str(&script[1..].to_ascii_lowercase());
        }
        if let Some(region) = caps.get(3) {
            tag.push('-');
            tag.push_str(&region.as_str().to_ascii_uppercase());
        }
        Ok(Language(tag))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// SearchOptions
// =============================================================================

/// Immutable per-run query options.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SearchOptions {
    pub travelers: Travelers,
    pub currency: Currency,
    pub cabin: Cabin,
    pub stops: Stops,
    pub trip: TripType,
    pub language: Language,
}

impl SearchOptions {
    pub fn validate(&self) -> Result<(), FareError> {
        self.travelers.validate()
    }
}
