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

//! # Offers Page Parser
//!
//! Side-effect free HTML parsing for Google Flights search result pages.
//! Extracts one offer per result card plus the "usually cost between" band.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::locations::AirportCode;
use crate::offers::{Itinerary, Layover, Offer, OfferSet, Price, PriceRange};

struct CardSelectors {
    results_container: Selector,
    card: Selector,
    airline: Selector,
    times: Selector,
    duration: Selector,
    stops: Selector,
    stops_container: Selector,
    arrives_next_day: Selector,
    price: Selector,
}

static SELECTORS: Lazy<CardSelectors> = Lazy::new(|| CardSelectors {
    results_container: Selector::parse(r#"div[jsname="YdtKid"]"#).unwrap(),
    card: Selector::parse(r#"ul.Rk10dc li"#).unwrap(),
    airline: Selector::parse(r#"div.sSHqwe.tPgKwe.ogfYpf span"#).unwrap(),
    times: Selector::parse(r#"span.mv1WYe div"#).unwrap(),
    duration: Selector::parse(r#"div.Ak5kof div"#).unwrap(),
    stops: Selector::parse(r#".BbR8Ec .ogfYpf"#).unwrap(),
    stops_container: Selector::parse(r#".BbR8Ec .sSHqwe"#).unwrap(),
    arrives_next_day: Selector::parse(r#"span.bOzv6"#).unwrap(),
    price: Selector::parse(r#".YMlIz.FpEdX"#).unwrap(),
});

static DURATION_H_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*(?:h|hr)").unwrap());
static DURATION_M_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*m").unwrap());
static LAYOVER_ARIA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*hr\s*(?:(\d+)\s*min)?[^.]*?in\s+([A-Za-z][A-Za-z\s]*)").unwrap()
});
static AIRPORT_PAIR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z]{3})\s*[–—-]\s*([A-Z]{3})\b").unwrap());
static AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d(?:[\d,.\u{a0}\u{202f}]*\d)?").unwrap());

const BAND_MARKER: &str = "usually cost between";

/// Parse a results page for the given date pair.
///
/// `default_pair` is used for cards that do not print their airports, which
/// is the case for single-airport searches. Cards without a resolvable pair
/// are dropped.
pub fn parse_offers_page(
    html: &str,
    departure: NaiveDate,
    return_date: Option<NaiveDate>,
    default_pair: Option<(&AirportCode, &AirportCode)>,
) -> Result<OfferSet> {
    let document = Html::parse_document(html);

    let containers: Vec<_> = document.select(&SELECTORS.results_container).collect();
    if containers.is_empty() && !html.contains("No results returned") {
        bail!("No results container found; the page layout may have changed");
    }

    let mut offers = Vec::new();
    let mut dropped = 0usize;
    for container in containers {
        for card in container.select(&SELECTORS.card) {
            match parse_card(card, departure, return_date, default_pair) {
                Some(offer) => offers.push(offer),
                None => dropped += 1,
            }
        }
    }

    let page_text: String = document.root_element().text().collect::<Vec<_>>().join(" ");
    let price_range = parse_price_band(&page_text);

    tracing::debug!(
        "Parsed {} offers ({} cards dropped), price band: {:?}",
        offers.len(),
        dropped,
        price_range
    );
    Ok(OfferSet {
        offers,
        price_range,
    })
}

fn parse_card(
    card: ElementRef,
    departure: NaiveDate,
    return_date: Option<NaiveDate>,
    default_pair: Option<(&AirportCode, &AirportCode)>,
) -> Option<Offer> {
    let card_text: String = card.text().collect::<Vec<_>>().join(" ");

    let (origin, destination) = match AIRPORT_PAIR_RE.captures(&card_text) {
        Some(caps) => (caps[1].parse().ok()?, caps[2].parse().ok()?),
        None => {
            let (from, to) = default_pair?;
            (from.clone(), to.clone())
        }
    };

    let airline = card
        .select(&SELECTORS.airline)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty());

    let times: Vec<_> = card.select(&SELECTORS.times).collect();
    let departure_time = times
        .first()
        .map(|el| normalize_time(&el.text().collect::<String>()));
    let arrival_time = times
        .get(1)
        .map(|el| normalize_time(&el.text().collect::<String>()));

    let arrival_plus_days = card
        .select(&SELECTORS.arrives_next_day)
        .next()
        .and_then(|el| {
            let text: String = el.text().collect();
            text.trim().trim_start_matches('+').split_whitespace().next()?.parse().ok()
        })
        .unwrap_or(0);

    let duration_minutes = card
        .select(&SELECTORS.duration)
        .next()
        .map(|el| parse_duration(&el.text().collect::<String>()))
        .filter(|&m| m > 0);

    let stops = card.select(&SELECTORS.stops).next().map(|el| {
        let label: String = el.text().collect();
        parse_stops(&label)
    });

    let price = card
        .select(&SELECTORS.price)
        .next()
        .and_then(|el| parse_amount(&el.text().collect::<String>()));

    Some(Offer {
        departure,
        return_date,
        origin,
        destination,
        price,
        itinerary: Itinerary {
            airline,
            departure_time,
            arrival_time,
            arrival_plus_days,
            duration_minutes,
            stops,
            layovers: parse_layovers(card),
        },
    })
}

fn parse_layovers(card: ElementRef) -> Vec<Layover> {
    card.select(&SELECTORS.stops_container)
        .filter_map(|el| el.value().attr("aria-label"))
        .flat_map(|label| parse_layover_label(label).into_iter())
        .collect()
}

fn parse_layover_label(label: &str) -> Vec<Layover> {
    LAYOVER_ARIA_RE
        .captures_iter(label)
        .map(|cap| {
            let hours: i32 = cap.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
            let mins: i32 = cap.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
            Layover {
                airport_city: cap.get(3).map(|m| m.as_str().trim().to_string()),
                duration_minutes: Some(hours * 60 + mins),
            }
        })
        .collect()
}

fn parse_stops(label: &str) -> i32 {
    if label.contains("Nonstop") {
        return 0;
    }
    label
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            tracing::warn!("Could not parse number of stops from: '{}'", label);
            1
        })
}

/// "$1,234" / "1 234 €" -> 1234
fn parse_amount(text: &str) -> Option<Price> {
    let m = AMOUNT_RE.find(text)?;
    let digits: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// "...usually cost between $250–$480." -> 250..=480
fn parse_price_band(text: &str) -> Option<PriceRange> {
    let start = text.find(BAND_MARKER)? + BAND_MARKER.len();
    let tail: String = text[start..].chars().take(80).collect();
    let mut amounts = AMOUNT_RE.find_iter(&tail).filter_map(|m| parse_amount(m.as_str()));
    let low = amounts.next()?;
    let high = amounts.next()?;
    Some(PriceRange::new(low, high))
}

fn normalize_time(s: &str) -> String {
    s.split_whitespace().next().unwrap_or(s).to_string()
}

fn parse_duration(s: &str) -> i32 {
    let s = s.trim();
    let hours = DURATION_H_RE
        .captures(s)
        .and_then(|caps| caps[1].parse::<i32>().ok())
        .unwrap_or(0);
    let minutes = DURATION_M_RE
        .captures(s)
        .and_then(|caps| caps[1].parse::<i32>().ok())
        .unwrap_or(0);
    if hours == 0 && minutes == 0 && !s.is_empty() {
        tracing::debug!("Could not parse duration from: '{}'", s);
    }
    hours * 60 + minutes
}
