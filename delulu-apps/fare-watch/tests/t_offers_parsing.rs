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

//! Results-page parsing against a trimmed inline fixture.
//!
//! Run with:
//!     cargo test --test t_offers_parsing

use chrono::NaiveDate;

use delulu_fare_watch::{parse_offers_page, select_best, AirportCode, PriceLevel};

const RESULTS_PAGE: &str = r#"
<html><body>
<div class="gOatQ">Prices are currently low. The least expensive flights for similar trips
to New York usually cost between $350–$520.</div>
<div jsname="YdtKid">
  <ul class="Rk10dc">
    <li>
      <div class="sSHqwe tPgKwe ogfYpf"><span>Alaska</span></div>
      <span class="mv1WYe"><div>6:05 AM</div><div>2:40 PM</div></span>
      <div class="Ak5kof"><div>5 hr 35 min</div><div>SFO–JFK</div></div>
      <div class="BbR8Ec"><div class="ogfYpf">Nonstop</div></div>
      <div class="YMlIz FpEdX"><span>$312</span></div>
    </li>
    <li>
      <div class="sSHqwe tPgKwe ogfYpf"><span>United</span></div>
      <span class="mv1WYe"><div>9:00 PM</div><div>7:55 AM</div></span>
      <span class="bOzv6">+1</span>
      <div class="Ak5kof"><div>7 hr 55 min</div><div>SJC–EWR</div></div>
      <div class="BbR8Ec">
        <div class="ogfYpf">1 stop</div>
        <div class="sSHqwe" aria-label="Layover (1 of 1) is a 1 hr 10 min layover at Denver International Airport in Denver."></div>
      </div>
      <div class="YMlIz FpEdX"><span>$1,045</span></div>
    </li>
    <li>
      <div class="sSHqwe tPgKwe ogfYpf"><span>JetBlue</span></div>
      <div class="Ak5kof"><div>5 hr 50 min</div><div>SFO–JFK</div></div>
      <div class="YMlIz FpEdX"><span>Price unavailable</span></div>
    </li>
  </ul>
</div>
</body></html>
"#;

fn dates() -> (NaiveDate, Option<NaiveDate>) {
    (
        NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
        NaiveDate::from_ymd_opt(2026, 12, 8),
    )
}

#[test]
fn test_cards_and_band_are_extracted() {
    let (dep, ret) = dates();
    let set = parse_offers_page(RESULTS_PAGE, dep, ret, None).unwrap();
    assert_eq!(set.offers.len(), 3);

    let first = &set.offers[0];
    assert_eq!(first.origin.as_str(), "SFO");
    assert_eq!(first.destination.as_str(), "JFK");
    assert_eq!(first.price, Some(312));
    assert_eq!(first.departure, dep);
    assert_eq!(first.return_date, ret);
    assert_eq!(first.itinerary.airline.as_deref(), Some("Alaska"));
    assert_eq!(first.itinerary.departure_time.as_deref(), Some("6:05"));
    assert_eq!(first.itinerary.duration_minutes, Some(335));
    assert_eq!(first.itinerary.stops, Some(0));

    let second = &set.offers[1];
    assert_eq!(second.origin.as_str(), "SJC");
    assert_eq!(second.price, Some(1045));
    assert_eq!(second.itinerary.arrival_plus_days, 1);
    assert_eq!(second.itinerary.stops, Some(1));
    assert_eq!(second.itinerary.layovers.len(), 1);
    assert_eq!(second.itinerary.layovers[0].duration_minutes, Some(70));

    assert_eq!(set.offers[2].price, None);

    let band = set.price_range.expect("band should be parsed");
    assert_eq!((band.low, band.high), (350, 520));
    assert_eq!(band.classify(312), PriceLevel::Low);
    assert_eq!(band.classify(1045), PriceLevel::High);
}

#[test]
fn test_best_offer_from_parsed_page() {
    let (dep, ret) = dates();
    let set = parse_offers_page(RESULTS_PAGE, dep, ret, None).unwrap();
    let best = select_best(&set.offers).unwrap();
    assert_eq!(best.itinerary.airline.as_deref(), Some("Alaska"));
    let band = set.price_range.unwrap();
    assert!(best.price.unwrap() < band.low);
}

#[test]
fn test_default_pair_fills_cards_without_airports() {
    let page = r#"<div jsname="YdtKid"><ul class="Rk10dc"><li>
        <div class="sSHqwe tPgKwe ogfYpf"><span>Delta</span></div>
        <div class="YMlIz FpEdX"><span>$289</span></div>
    </li></ul></div>"#;
    let (dep, ret) = dates();
    let sfo: AirportCode = "SFO".parse().unwrap();
    let jfk: AirportCode = "JFK".parse().unwrap();

    let without = parse_offers_page(page, dep, ret, None).unwrap();
    assert!(without.offers.is_empty());

    let with = parse_offers_page(page, dep, ret, Some((&sfo, &jfk))).unwrap();
    assert_eq!(with.offers.len(), 1);
    assert_eq!(with.offers[0].origin, sfo);
    assert_eq!(with.offers[0].price, Some(289));
    assert!(with.price_range.is_none());
}

#[test]
fn test_empty_results_page() {
    let (dep, ret) = dates();
    let set = parse_offers_page("<html><body>No results returned.</body></html>", dep, ret, None)
        .unwrap();
    assert!(set.offers.is_empty());
    assert!(set.price_range.is_none());
}

#[test]
fn test_unknown_layout_is_an_error() {
    let (dep, ret) = dates();
    assert!(parse_offers_page("<html><body><p>hello</p></body></html>", dep, ret, None).is_err());
}
