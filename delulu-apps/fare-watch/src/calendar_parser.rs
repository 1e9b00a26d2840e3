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

//! # Calendar Graph Parser
//!
//! Side-effect free decoding of the calendar-graph RPC response.
//!
//! The body is an anti-XSSI prefix (`)]}'`) followed by length-prefixed
//! chunks. Each chunk is a JSON array of `["wrb.fr", _, "<payload json>"]`
//! envelopes; inside the payload every priced day looks like
//! `["2026-12-01", "2026-12-08", [[null, 312], "..."], ...]`.

use anyhow::{Context, Result, ensure};
use chrono::NaiveDate;
use serde_json::Value;

use crate::price_graph::PriceGraphPoint;

const XSSI_PREFIX: &str = ")]}'";

/// Split an RPC body into its JSON payloads, unwrapping `wrb.fr` envelopes.
pub(crate) fn rpc_payloads(body: &str) -> Result<Vec<Value>> {
    let body = body.trim_start().strip_prefix(XSSI_PREFIX).unwrap_or(body);

    let mut chunks = Vec::new();
    for line in body.lines().map(str::trim).filter(|l| l.starts_with('[')) {
        match serde_json::from_str::<Value>(line) {
            Ok(v) => chunks.push(v),
            Err(e) => tracing::trace!("Skipping undecodable RPC chunk: {}", e),
        }
    }
    if chunks.is_empty() {
        // Single-document responses without chunk framing.
        let whole: Value =
            serde_json::from_str(body.trim()).context("RPC response contained no JSON payload")?;
        chunks.push(whole);
    }

    let mut payloads = Vec::new();
    for chunk in chunks {
        let mut envelopes = 0;
        for entry in chunk.as_array().into_iter().flatten() {
            let Some(fields) = entry.as_array() else {
                continue;
            };
            if fields.first().and_then(Value::as_str) != Some("wrb.fr") {
                continue;
            }
            envelopes += 1;
            if let Some(inner) = fields.get(2).and_then(Value::as_str) {
                payloads.push(serde_json::from_str(inner).context("Invalid wrb.fr payload")?);
            }
        }
        if envelopes == 0 {
            payloads.push(chunk);
        }
    }
    Ok(payloads)
}

fn as_date(v: &Value) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(v.as_str()?, "%Y-%m-%d").ok()
}

/// `[[null, 312], ...]` -> 312
fn price_of(v: &Value) -> Option<u32> {
    let pair = v.as_array()?.first()?.as_array()?;
    let amount = pair.get(1)?.as_f64()?;
    (amount.is_finite() && amount >= 0.0).then(|| amount.round() as u32)
}

fn collect_points(v: &Value, out: &mut Vec<PriceGraphPoint>) {
    let Some(items) = v.as_array() else {
        return;
    };
    if let (Some(departure), Some(second), Some(price)) = (
        items.first().and_then(as_date),
        items.get(1),
        items.get(2),
    ) {
        let return_date = as_date(second);
        if return_date.is_some() || second.is_null() {
            out.push(PriceGraphPoint {
                departure,
                return_date,
                price: price_of(price),
            });
            return;
        }
    }
    for item in items {
        collect_points(item, out);
    }
}

/// Decode every day of a calendar-graph response, priced or not.
pub fn parse_calendar_graph(body: &str) -> Result<Vec<PriceGraphPoint>> {
    let payloads = rpc_payloads(body)?;
    ensure!(!payloads.is_empty(), "Calendar response had no payload");

    let mut points = Vec::new();
    for payload in &payloads {
        collect_points(payload, &mut points);
    }
    tracing::debug!("Decoded {} calendar points from {} payloads", points.len(), payloads.len());
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 12, day).unwrap()
    }

    fn wrap(payload: &serde_json::Value) -> String {
        let envelope = serde_json::json!([["wrb.fr", null, payload.to_string()]]);
        let chunk = envelope.to_string();
        format!(")]}}'\n\n{}\n{}\n25\n[[\"e\",4,null,null,123]]\n", chunk.len(), chunk)
    }

    #[test]
    fn decodes_enveloped_days() {
        let payload = serde_json::json!([
            null,
            [
                ["2026-12-01", "2026-12-08", [[null, 312], "CjRI"], 1],
                ["2026-12-02", "2026-12-09", [[null, 298.0], "CjRJ"], 1],
                ["2026-12-03", "2026-12-10", [], 1]
            ]
        ]);
        let points = parse_calendar_graph(&wrap(&payload)).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].departure, d(1));
        assert_eq!(points[0].return_date, Some(d(8)));
        assert_eq!(points[0].price, Some(312));
        assert_eq!(points[1].price, Some(298));
        assert_eq!(points[2].price, None);
    }

    #[test]
    fn one_way_days_have_null_return() {
        let payload = serde_json::json!([[["2026-12-05", null, [[null, 150]]]]]);
        let points = parse_calendar_graph(&wrap(&payload)).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].return_date, None);
    }

    #[test]
    fn empty_payload_is_not_an_error() {
        let points = parse_calendar_graph(&wrap(&serde_json::json!([null, []]))).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_calendar_graph("<html>rate limited</html>").is_err());
    }
}
