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

//! # Google Flights Client
//!
//! Effectful (time, network) [`FlightSource`] backed by Google Flights:
//! city lookup and the calendar graph go through the travel frontend RPCs,
//! offers are scraped from the search results page.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use delulu_query_queues::{QueryQueue, QueryQueueError, RetryPolicy};
use serde_json::{Value, json};
use wreq::redirect::Policy;
use wreq_util::Emulation;

use crate::calendar_parser::{parse_calendar_graph, rpc_payloads};
use crate::consent_cookie::consent_cookie_header;
use crate::deep_link::deep_link;
use crate::locations::AirportCode;
use crate::offers::OfferSet;
use crate::offers_parser::parse_offers_page;
use crate::options::{Language, SearchOptions};
use crate::price_graph::PriceGraphPoint;
use crate::session::SessionConfig;
use crate::source::{CalendarRequest, FlightSource, LocationKind, PlaceId, ResolvedQuery};

const HOME_URL: &str = "https://www.google.com/travel/flights";
const CALENDAR_RPC_URL: &str = "https://www.google.com/_/TravelFrontendUi/data/travel.frontend.flights.FlightsFrontendService/GetCalendarGraph";
const BATCH_RPC_URL: &str = "https://www.google.com/_/TravelFrontendUi/data/batchexecute";
const CITY_LOOKUP_RPC: &str = "H028ib";
const RPC_COMMON_PARAMS: &str = "soc-app=162&soc-platform=1&soc-device=1&rt=c";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// Failures worth distinguishing when deciding whether to retry.
#[derive(Debug, thiserror::Error)]
enum FetchFailure {
    #[error("HTTP error {status}: {preview}")]
    Status { status: u16, preview: String },
    #[error(
        "Consent wall detected - cookies not accepted. \
         Consider using a proxy or residential IP. Body preview: {0}"
    )]
    ConsentWall(String),
}

/// Throttling (429) and server errors are retried, as are transport-level
/// failures such as timeouts and resets.
fn is_transient(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<FetchFailure>() {
        Some(FetchFailure::Status { status, .. }) => *status == 429 || *status >= 500,
        Some(FetchFailure::ConsentWall(_)) => false,
        None => true,
    }
}

fn is_consent_page(body: &str) -> bool {
    body.contains("consent.google.com")
        || body.contains("base href=\"https://consent.google.com\"")
        || body.contains("ppConfig")
}

fn preview(body: &str, n: usize) -> String {
    body.chars().take(n).collect()
}

fn unwrap_queue_error(err: QueryQueueError) -> anyhow::Error {
    match err {
        QueryQueueError::MaxRetriesExceeded { attempts, source } => {
            source.context(format!("Request failed after {attempts} attempts"))
        }
        QueryQueueError::Permanent(source) => source,
        QueryQueueError::QueueClosed => anyhow!("Request queue is closed"),
    }
}

#[derive(Clone)]
pub struct GoogleFlights {
    client: Arc<wreq::Client>,
    query_queue: QueryQueue,
    /// Language of the handshake request.
    language: Language,
}

impl GoogleFlights {
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let mut builder = wreq::Client::builder()
            .emulation(Emulation::Safari18_5)
            .redirect(Policy::default())
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout);
        if let Some(proxy) = &config.proxy {
            let proxy = wreq::Proxy::all(proxy.as_str())
                .with_context(|| format!("Invalid proxy URL: {proxy}"))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        let query_queue = QueryQueue::with_qps_limit(config.queries_per_second.into())
            .retry_policy(RetryPolicy {
                max_retries: config.max_retries,
                ..Default::default()
            });
        Ok(Self {
            client: Arc::new(client),
            query_queue,
            language: config.language.clone(),
        })
    }

    fn probe_url(&self) -> String {
        format!("{HOME_URL}?hl={}", urlencoding::encode(self.language.as_str()))
    }

    fn cookie(language: &Language) -> String {
        consent_cookie_header(chrono::Local::now().date_naive(), language)
    }

    /// Send one request through the queue; `form` selects POST over GET.
    async fn send(&self, url: &str, form: Option<String>, language: &Language) -> Result<String> {
        let cookie = Self::cookie(language);
        let client = Arc::clone(&self.client);

        let queue_start = Instant::now();
        let body = self
            .query_queue
            .run(
                move || {
                    let url = url.to_string();
                    let cookie = cookie.clone();
                    let form = form.clone();
                    let client = client.clone();
                    async move {
                        let http_start = Instant::now();
                        tracing::trace!("[send] Starting HTTP request to: {}", url);
                        let request = match form {
                            Some(form) => client
                                .post(&url)
                                .header("Content-Type", FORM_CONTENT_TYPE)
                                .body(form),
                            None => client.get(&url),
                        };
                        let response = request.header("Cookie", &cookie).send().await?;
                        let status = response.status();
                        let body = response.text().await.context("Read body")?;
                        tracing::trace!(
                            "[send] HTTP {} in {:?}, {} KB",
                            status.as_u16(),
                            http_start.elapsed(),
                            body.len() / 1024
                        );

                        if !status.is_success() {
                            return Err(anyhow::Error::from(FetchFailure::Status {
                                status: status.as_u16(),
                                preview: preview(&body, 500),
                            }));
                        }
                        if is_consent_page(&body) {
                            return Err(anyhow::Error::from(FetchFailure::ConsentWall(
                                preview(&body, 300),
                            )));
                        }
                        Ok::<_, anyhow::Error>(body)
                    }
                },
                is_transient,
            )
            .await
            .map_err(unwrap_queue_error)?;

        tracing::debug!(
            "[send] Query queue + HTTP execution time: {:?}",
            queue_start.elapsed()
        );
        Ok(body)
    }

    fn form_body(f_req: &Value) -> String {
        format!("f.req={}", urlencoding::encode(&f_req.to_string()))
    }
}

// =============================================================================
// RPC request shapes
// =============================================================================

fn rpc_location(place: &PlaceId) -> Value {
    let kind = match place.kind {
        LocationKind::Airport => 0,
        LocationKind::City => 5,
    };
    json!([place.id, kind])
}

fn rpc_leg(from: &[PlaceId], to: &[PlaceId], date: &str, stops: i32) -> Value {
    let from: Vec<Value> = from.iter().map(rpc_location).collect();
    let to: Vec<Value> = to.iter().map(rpc_location).collect();
    json!([[from], [to], null, stops, null, null, date, null, [], [], [], null, null, [], 3])
}

fn rpc_travelers(options: &SearchOptions) -> Value {
    let t = &options.travelers;
    json!([t.adults, t.children, t.infants_on_lap, t.infants_in_seat])
}

pub(crate) fn calendar_request_body(request: &CalendarRequest) -> Result<Value> {
    let opts = &request.options;
    let stops = opts.stops.rpc_code();
    let start = request.departure_from.format("%Y-%m-%d").to_string();
    let end = request.departure_to.format("%Y-%m-%d").to_string();

    let mut legs = vec![rpc_leg(&request.from, &request.to, &start, stops)];
    if let Some(days) = request.trip_length {
        let ret = request
            .departure_from
            .checked_add_days(chrono::Days::new(days.into()))
            .context("Return date out of range")?;
        legs.push(rpc_leg(
            &request.to,
            &request.from,
            &ret.format("%Y-%m-%d").to_string(),
            stops,
        ));
    }

    let trip_code = crate::flights_proto::Trip::from(opts.trip) as i32;
    let seat_code = crate::flights_proto::Seat::from(opts.cabin) as i32;
    let trip_lengths = match request.trip_length {
        Some(days) => json!([days, days]),
        None => Value::Null,
    };
    let inner = json!([
        null,
        [
            null, null, trip_code, null, [], seat_code, rpc_travelers(opts),
            null, null, null, null, null, null, legs, null, null, null, 1
        ],
        [start, end],
        null,
        trip_lengths
    ]);
    Ok(json!([null, inner.to_string()]))
}

fn city_lookup_body(name: &str) -> Value {
    let args = json!([name, [1, 2, 3, 5, 4], null, [1, 1, 1], 1]).to_string();
    json!([[[CITY_LOOKUP_RPC, args, null, "generic"]]])
}

fn find_place_id(v: &Value) -> Option<String> {
    match v {
        Value::String(s)
            if (s.starts_with("/m/") || s.starts_with("/g/"))
                && s.len() > 3
                && s[3..].chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
        {
            Some(s.clone())
        }
        Value::Array(items) => items.iter().find_map(find_place_id),
        _ => None,
    }
}

/// First knowledge-graph id in a city lookup response.
pub(crate) fn parse_city_lookup(body: &str) -> Result<Option<String>> {
    Ok(rpc_payloads(body)?.iter().find_map(find_place_id))
}

fn single_airport(places: &[PlaceId]) -> Option<AirportCode> {
    match places {
        [only] if only.kind == LocationKind::Airport => only.id.parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl FlightSource for GoogleFlights {
    async fn probe(&self) -> Result<()> {
        let body = self.send(&self.probe_url(), None, &self.language).await?;
        tracing::debug!("Probe OK: {} KB", body.len() / 1024);
        Ok(())
    }

    async fn resolve_city(&self, name: &str, language: &Language) -> Result<PlaceId> {
        let url = format!(
            "{BATCH_RPC_URL}?rpcids={CITY_LOOKUP_RPC}&hl={}&{RPC_COMMON_PARAMS}",
            urlencoding::encode(language.as_str())
        );
        let body = self
            .send(&url, Some(Self::form_body(&city_lookup_body(name))), language)
            .await?;
        match parse_city_lookup(&body)? {
            Some(id) => {
                tracing::debug!("Resolved city '{}' to {}", name, id);
                Ok(PlaceId::city(id))
            }
            None => bail!("Could not resolve city '{}'", name),
        }
    }

    async fn calendar_graph(&self, request: &CalendarRequest) -> Result<Vec<PriceGraphPoint>> {
        let opts = &request.options;
        let url = format!(
            "{CALENDAR_RPC_URL}?hl={}&curr={}&{RPC_COMMON_PARAMS}",
            urlencoding::encode(opts.language.as_str()),
            opts.currency
        );
        let body = Self::form_body(&calendar_request_body(request)?);

        let start = Instant::now();
        let text = self.send(&url, Some(body), &opts.language).await?;
        let points = parse_calendar_graph(&text).context("Calendar graph parse failed")?;
        tracing::info!(
            "Calendar {}..{}: {} days in {:?}",
            request.departure_from,
            request.departure_to,
            points.len(),
            start.elapsed()
        );
        Ok(points)
    }

    async fn shopping_results(&self, query: &ResolvedQuery) -> Result<OfferSet> {
        let url = deep_link(query)?;
        let departure = query.departure().context("Query has no legs")?;
        let first = query.legs.first().context("Query has no legs")?;
        let pair = single_airport(&first.from).zip(single_airport(&first.to));

        tracing::info!("Fetching offers: {}", url);
        let start = Instant::now();
        let html = self.send(&url, None, &query.options.language).await?;
        let fetched = start.elapsed();

        match parse_offers_page(
            &html,
            departure,
            query.return_date(),
            pair.as_ref().map(|(a, b)| (a, b)),
        ) {
            Ok(set) => {
                tracing::debug!(
                    "Fetched in {:?}, parsed {} offers in {:?}",
                    fetched,
                    set.offers.len(),
                    start.elapsed() - fetched
                );
                Ok(set)
            }
            Err(e) => {
                let has_flight_cards = html.contains("pIav2d") || html.contains("JMc5Xc");
                let has_loading = html.contains("Loading results") || html.contains("jsshadow");
                if !has_flight_cards && has_loading {
                    tracing::warn!("Detected loading spinner without flight data.");
                } else if has_flight_cards {
                    tracing::error!("Flight HTML detected but parser failed. Parser may need updating.");
                }
                tracing::debug!("HTML preview (first 2000 chars):\n{}", preview(&html, 2000));
                Err(e).context("Offers page parse failed")
            }
        }
    }
}
