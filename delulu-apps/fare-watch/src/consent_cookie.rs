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

//! SOCS consent cookie sent with every Google Flights request so the
//! consent interstitial is skipped.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{Datelike, NaiveDate};
use prost::encoding::{WireType, encode_key, encode_varint};

use crate::options::Language;

/// Opaque consent payload observed in browser cookies.
const CONSENT_BLOB: &[u8] = &[0x08, 0x80, 0xc4, 0xf6, 0xca];

fn put_length_delimited(tag: u32, data: &[u8], buf: &mut Vec<u8>) {
    encode_key(tag, WireType::LengthDelimited, buf);
    encode_varint(data.len() as u64, buf);
    buf.extend_from_slice(data);
}

/// SOCS value: tag 2 holds the consent frontend build stamped with
/// `build_day` and the primary language subtag, tag 3 the consent blob.
fn socs_value(build_day: NaiveDate, language: &Language) -> String {
    let primary = language.as_str().split('-').next().unwrap_or("en");
    let server_tag = format!(
        "boq_identityfrontenduiserver_{}{:02}{:02}.03_p0{}",
        build_day.year(),
        build_day.month(),
        build_day.day(),
        primary
    );

    let mut buf = Vec::with_capacity(server_tag.len() + CONSENT_BLOB.len() + 4);
    put_length_delimited(2, server_tag.as_bytes(), &mut buf);
    put_length_delimited(3, CONSENT_BLOB, &mut buf);
    STANDARD.encode(&buf)
}

/// Cookie header for requests issued on `today`. The build stamp is the
/// previous day, matching what a browser accepted shortly before.
pub fn consent_cookie_header(today: NaiveDate, language: &Language) -> String {
    let build_day = today.pred_opt().unwrap_or(today);
    format!("CONSENT=PENDING+987; SOCS={}", socs_value(build_day, language))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn socs_is_well_formed_protobuf() {
        let decoded = STANDARD.decode(socs_value(day(), &Language::english())).unwrap();
        // tag 2, length-delimited
        assert_eq!(decoded[0], 0x12);
        let len = decoded[1] as usize;
        let tag = std::str::from_utf8(&decoded[2..2 + len]).unwrap();
        assert_eq!(tag, "boq_identityfrontenduiserver_20260302.03_p0en");
        // tag 3 follows with the 5-byte blob
        assert_eq!(decoded[2 + len], 0x1a);
        assert_eq!(&decoded[4 + len..], CONSENT_BLOB);
    }

    #[test]
    fn header_uses_previous_day_and_language() {
        let header = consent_cookie_header(day(), &"fr-CA".parse().unwrap());
        let socs = header
            .strip_prefix("CONSENT=PENDING+987; SOCS=")
            .expect("header prefix");
        let decoded = STANDARD.decode(socs).unwrap();
        let text = String::from_utf8_lossy(&decoded);
        assert!(text.contains("20260301.03_p0fr"), "got {text}");
    }
}
