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

//! # Cheap-offer search
//!
//! Price graph over a date range, then for every priced departure:
//! city-level offers, best offer, airport-level re-query for the band, and a
//! report when the best price undercuts the band's low end.

use std::fmt;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::FareError;
use crate::locations::AirportCode;
use crate::offers::{Offer, OfferArgs, Price, PriceRange};
use crate::options::SearchOptions;
use crate::price_graph::{PriceGraphArgs, PriceGraphPoint};
use crate::selector::select_best;
use crate::session::Session;

/// What to do when one price-graph point fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// First error ends the run.
    #[default]
    Abort,
    /// Log and move on. Cancellation and invalid arguments still abort.
    SkipPoint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheapOfferSearch {
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub trip_length: u32,
    pub src_cities: Vec<String>,
    pub dst_cities: Vec<String>,
    pub options: SearchOptions,
    /// Graph points checked concurrently.
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
}

impl CheapOfferSearch {
    pub const DEFAULT_CONCURRENCY: usize = 4;

    pub fn new<S, D>(
        range_start: NaiveDate,
        range_end: NaiveDate,
        trip_length: u32,
        src_cities: S,
        dst_cities: D,
    ) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            range_start,
            range_end,
            trip_length,
            src_cities: src_cities.into_iter().map(Into::into).collect(),
            dst_cities: dst_cities.into_iter().map(Into::into).collect(),
            options: SearchOptions::default(),
            concurrency: Self::DEFAULT_CONCURRENCY,
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn graph_args(&self) -> PriceGraphArgs {
        PriceGraphArgs {
            range_start: self.range_start,
            range_end: self.range_end,
            trip_length: self.trip_length,
            src_cities: self.src_cities.clone(),
            dst_cities: self.dst_cities.clone(),
            options: self.options.clone(),
        }
    }

    fn validate(&self) -> Result<(), FareError> {
        if self.concurrency == 0 {
            return Err(FareError::invalid("concurrency must be at least 1"));
        }
        self.graph_args().validate()
    }

    fn city_level_args(&self, point: &PriceGraphPoint) -> Result<OfferArgs, FareError> {
        OfferArgs::builder(point.departure)
            .maybe_return_date(point.return_date)
            .src_cities(self.src_cities.iter().cloned())
            .dst_cities(self.dst_cities.iter().cloned())
            .options(self.options.clone())
            .build()
    }
}

/// An offer priced below the low end of the typical band for its own
/// dates and airport pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheapOffer {
    pub departure: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub origin: AirportCode,
    pub destination: AirportCode,
    pub price: Price,
    pub price_range: PriceRange,
    pub url: String,
}

impl fmt::Display for CheapOffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.return_date {
            Some(ret) => writeln!(f, "{} {}", self.departure, ret)?,
            None => writeln!(f, "{}", self.departure)?,
        }
        writeln!(f, "price {}", self.price)?;
        write!(f, "{}", self.url)
    }
}

/// A price band may only be compared with an offer for the same dates and
/// the same single origin/destination airport pair.
fn ensure_same_pair(offer: &Offer, args: &OfferArgs) -> Result<(), FareError> {
    let same_pair = args.src.single_airport() == Some(&offer.origin)
        && args.dst.single_airport() == Some(&offer.destination);
    let same_dates = args.date == offer.departure && args.return_date == offer.return_date;
    if same_pair && same_dates {
        return Ok(());
    }
    Err(FareError::invalid(format!(
        "price band query {}-{} on {} does not match offer {}-{} on {}",
        args.src, args.dst, args.date, offer.origin, offer.destination, offer.departure
    )))
}

async fn check_point(
    session: &Session,
    search: &CheapOfferSearch,
    point: PriceGraphPoint,
    cancel: &CancellationToken,
) -> Result<Option<CheapOffer>, FareError> {
    let city_args = search.city_level_args(&point)?;
    let city_level = session.get_offers(&city_args, cancel).await?;

    let Some(best) = select_best(&city_level.offers) else {
        tracing::debug!(
            "{} {:?}: no priced offer among {} results, skipping",
            point.departure,
            point.return_date,
            city_level.offers.len()
        );
        return Ok(None);
    };
    let Some(price) = best.comparable_price() else {
        return Ok(None);
    };

    // The band is only comparable for the best offer's own dates and pair.
    let pair_args = OfferArgs::builder(best.departure)
        .maybe_return_date(best.return_date)
        .src_airports([best.origin.as_str()])
        .dst_airports([best.destination.as_str()])
        .options(search.options.clone())
        .build()?;
    ensure_same_pair(best, &pair_args)?;

    let pair_level = session.get_offers(&pair_args, cancel).await?;
    let Some(range) = pair_level.price_range else {
        return Err(FareError::MissingPriceRange {
            departure: best.departure,
            return_date: best.return_date,
            origin: best.origin.clone(),
            destination: best.destination.clone(),
        });
    };

    tracing::debug!(
        "{} {}-{}: best {} vs typical {}..={}",
        best.departure,
        best.origin,
        best.destination,
        price,
        range.low,
        range.high
    );
    if price >= range.low {
        return Ok(None);
    }

    let url = session.serialize_url(&pair_args, cancel).await?;
    Ok(Some(CheapOffer {
        departure: best.departure,
        return_date: best.return_date,
        origin: best.origin.clone(),
        destination: best.destination.clone(),
        price,
        price_range: range,
        url,
    }))
}

/// Runs the search and hands every cheap offer to `on_report` as soon as it
/// is found. Returns how many were reported.
///
/// Reports already handed out stay valid when the run later fails.
pub async fn find_cheap_offers_streaming<F>(
    session: &Session,
    search: &CheapOfferSearch,
    cancel: &CancellationToken,
    mut on_report: F,
) -> Result<usize, FareError>
where
    F: FnMut(&CheapOffer),
{
    search.validate()?;
    let graph = session.get_price_graph(&search.graph_args(), cancel).await?;
    tracing::info!(
        "Checking {} price-graph points ({} at a time)",
        graph.len(),
        search.concurrency
    );

    let mut outcomes = stream::iter(graph)
        .map(|point| async move { (point, check_point(session, search, point, cancel).await) })
        .buffer_unordered(search.concurrency);

    let mut reported = 0;
    let mut skipped = 0;
    while let Some((point, outcome)) = outcomes.next().await {
        if cancel.is_cancelled() {
            return Err(FareError::Cancelled("cheap-offer search cancelled".into()));
        }
        match outcome {
            Ok(Some(report)) => {
                tracing::info!(
                    "Cheap offer {} {}-{} at {} (typical {}..={})",
                    report.departure,
                    report.origin,
                    report.destination,
                    report.price,
                    report.price_range.low,
                    report.price_range.high
                );
                on_report(&report);
                reported += 1;
            }
            Ok(None) => {}
            Err(e) if search.failure_policy == FailurePolicy::SkipPoint && !e.is_fatal_for_run() => {
                tracing::warn!("Skipping {} {:?}: {e}", point.departure, point.return_date);
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!("Search finished: {reported} cheap offers, {skipped} points skipped");
    Ok(reported)
}

/// Collects every cheap offer, sorted by departure, return date and price.
/// Fails without partial results.
pub async fn find_cheap_offers(
    session: &Session,
    search: &CheapOfferSearch,
    cancel: &CancellationToken,
) -> Result<Vec<CheapOffer>, FareError> {
    let mut reports = Vec::new();
    find_cheap_offers_streaming(session, search, cancel, |r| reports.push(r.clone())).await?;
    reports.sort_by(|a, b| {
        (a.departure, a.return_date, a.price).cmp(&(b.departure, b.return_date, b.price))
    });
    Ok(reports)
}
