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

//! Origin/destination sides of a query: either a group of city names or a
//! set of specific airports, never both.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::FareError;

/// Three-letter IATA airport code, upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AirportCode(String);

impl AirportCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AirportCode {
    type Err = FareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(FareError::invalid(format!(
                "invalid IATA airport code: {s:?}"
            )));
        }
        Ok(AirportCode(code.to_ascii_uppercase()))
    }
}

impl fmt::Display for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<AirportCode> for String {
    fn from(code: AirportCode) -> String {
        code.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locations {
    /// Metropolitan areas, resolved to airport groups by the data source.
    Cities(Vec<String>),
    Airports(Vec<AirportCode>),
}

impl Locations {
    pub fn cities<I, S>(names: I) -> Result<Self, FareError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|n| n.into().trim().to_string())
            .collect();
        if names.is_empty() {
            return Err(FareError::invalid("city list is empty"));
        }
        if names.iter().any(|n| n.is_empty()) {
            return Err(FareError::invalid("city names must not be blank"));
        }
        Ok(Locations::Cities(names))
    }

    pub fn airports<I, S>(codes: I) -> Result<Self, FareError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let codes = codes
            .into_iter()
            .map(|c| c.into().parse::<AirportCode>())
            .collect::<Result<Vec<_>, _>>()?;
        if codes.is_empty() {
            return Err(FareError::invalid("airport list is empty"));
        }
        Ok(Locations::Airports(codes))
    }

    /// Build one side from loosely-typed inputs; exactly one of the two
    /// lists must be populated.
    pub fn from_parts(
        side: &str,
        cities: Vec<String>,
        airports: Vec<String>,
    ) -> Result<Self, FareError> {
        match (cities.is_empty(), airports.is_empty()) {
            (false, true) => Self::cities(cities),
            (true, false) => Self::airports(airports),
            (false, false) => Err(FareError::invalid(format!(
                "{side}: supply either cities or airports, not both"
            ))),
            (true, true) => Err(FareError::invalid(format!(
                "{side}: one of cities or airports is required"
            ))),
        }
    }

    pub fn is_airport_level(&self) -> bool {
        matches!(self, Locations::Airports(_))
    }

    /// The airport when this side names exactly one.
    pub fn single_airport(&self) -> Option<&AirportCode> {
        match self {
            Locations::Airports(codes) if codes.len() == 1 => codes.first(),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Locations::Cities(names) => names.len(),
            Locations::Airports(codes) => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Locations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locations::Cities(names) => f.write_str(&names.join("|")),
            Locations::Airports(codes) => {
                let codes: Vec<&str> = codes.iter().map(AirportCode::as_str).collect();
                f.write_str(&codes.join("|"))
            }
        }
    }
}
