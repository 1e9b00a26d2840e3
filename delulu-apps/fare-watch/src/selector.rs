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

//! Best-offer selection.

use crate::offers::Offer;

/// Cheapest offer with a strictly positive price; the first one seen wins a
/// tie. `None` when no offer has a usable price.
pub fn select_best(offers: &[Offer]) -> Option<&Offer> {
    let mut best: Option<(&Offer, u32)> = None;
    for offer in offers {
        let Some(price) = offer.comparable_price() else {
            continue;
        };
        match best {
            Some((_, best_price)) if price >= best_price => {}
            _ => best = Some((offer, price)),
        }
    }
    best.map(|(offer, _)| offer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offers::Itinerary;
    use chrono::NaiveDate;

    fn offer(airline: &str, price: Option<u32>) -> Offer {
        Offer {
            departure: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2026, 12, 8),
            origin: "SFO".parse().unwrap(),
            destination: "JFK".parse().unwrap(),
            price,
            itinerary: Itinerary {
                airline: Some(airline.to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn empty_and_unpriced_sets_have_no_best() {
        assert!(select_best(&[]).is_none());
        assert!(select_best(&[offer("AA", None), offer("UA", Some(0))]).is_none());
    }

    #[test]
    fn zero_prices_never_win() {
        let offers = [offer("AA", Some(0)), offer("UA", Some(410)), offer("DL", None)];
        assert_eq!(select_best(&offers).unwrap().itinerary.airline.as_deref(), Some("UA"));
    }

    #[test]
    fn first_seen_wins_ties() {
        let offers = [offer("B6", Some(300)), offer("AS", Some(300)), offer("UA", Some(350))];
        assert_eq!(select_best(&offers).unwrap().itinerary.airline.as_deref(), Some("B6"));
    }
}
