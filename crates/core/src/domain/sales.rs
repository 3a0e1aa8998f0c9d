use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// One row of `/api/sales`. Never mutated after decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    #[serde(deserialize_with = "crate::domain::de::id")]
    pub product_id: String,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(deserialize_with = "sale_date")]
    pub sale_date: NaiveDate,
    pub revenue: Decimal,
    pub quantity_sold: u64,
}

impl SaleRecord {
    pub fn display_name(&self) -> String {
        match self.product_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Product {}", self.product_id),
        }
    }
}

/// Calendar date of a sale timestamp on this machine's local calendar.
///
/// Accepts RFC 3339 (converted to local time), `YYYY-MM-DDTHH:MM:SS[.f]`,
/// `YYYY-MM-DD HH:MM:SS[.f]` and bare `YYYY-MM-DD`. Timestamps without an offset
/// are taken as already local.
pub fn parse_sale_date(s: &str) -> Option<NaiveDate> {
    parse_sale_date_in(s, &Local)
}

/// [`parse_sale_date`] against an explicit zone.
pub fn parse_sale_date_in<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<NaiveDate> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.with_timezone(tz).date_naive());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(naive.date());
        }
    }

    NaiveDate::parse_from_str(t, "%Y-%m-%d").ok()
}

// Unparsable dates reject the whole payload rather than landing in a wrong bucket.
fn sale_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_sale_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unparsable saleDate: {raw:?}")))
}
