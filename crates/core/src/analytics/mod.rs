//! Sales aggregation.
//!
//! Everything here is pure and recomputed from the full record list on each call;
//! there is no incremental path.

pub mod summary;

pub use summary::{ChartPoint, SalesSummary};

use crate::domain::sales::SaleRecord;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const TOP_PRODUCTS_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Month,
    Year,
}

impl Granularity {
    /// Zero-padded so that string order is chronological ("2024-09" < "2024-10").
    pub fn period_key(self, date: NaiveDate) -> String {
        match self {
            Granularity::Month => format!("{:04}-{:02}", date.year(), date.month()),
            Granularity::Year => format!("{:04}", date.year()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendBucket {
    pub period: String,
    pub revenue: Decimal,
    pub quantity_sold: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRanking {
    pub product_id: String,
    pub product_name: String,
    pub quantity_sold: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub revenue: Decimal,
    pub quantity_sold: u64,
}

/// One bucket per distinct period, ascending by period key.
///
/// Revenue that would overflow `Decimal` saturates at its bound.
pub fn bucket_by_period(records: &[SaleRecord], granularity: Granularity) -> Vec<TrendBucket> {
    let mut acc = BTreeMap::<String, (Decimal, u64)>::new();
    for rec in records {
        let entry = acc
            .entry(granularity.period_key(rec.sale_date))
            .or_insert((Decimal::ZERO, 0));
        entry.0 = match entry.0.checked_add(rec.revenue) {
            Some(sum) => sum,
            None => {
                tracing::warn!(
                    product_id = %rec.product_id,
                    sale_date = %rec.sale_date,
                    "bucket revenue overflowed; saturating"
                );
                entry.0.saturating_add(rec.revenue)
            }
        };
        entry.1 = entry.1.saturating_add(rec.quantity_sold);
    }

    acc.into_iter()
        .map(|(period, (revenue, quantity_sold))| TrendBucket {
            period,
            revenue,
            quantity_sold,
        })
        .collect()
}

/// Products by total quantity across the whole input, highest first. Equal totals
/// keep the order in which the products first appeared.
pub fn rank_top_products(records: &[SaleRecord], limit: usize) -> Vec<ProductRanking> {
    let mut index = HashMap::<&str, usize>::new();
    let mut out = Vec::<ProductRanking>::new();

    for rec in records {
        match index.get(rec.product_id.as_str()) {
            Some(&i) => {
                out[i].quantity_sold = out[i].quantity_sold.saturating_add(rec.quantity_sold);
            }
            None => {
                index.insert(rec.product_id.as_str(), out.len());
                out.push(ProductRanking {
                    product_id: rec.product_id.clone(),
                    product_name: rec.display_name(),
                    quantity_sold: rec.quantity_sold,
                });
            }
        }
    }

    // sort_by is stable, which is what keeps first-seen order on ties.
    out.sort_by(|a, b| b.quantity_sold.cmp(&a.quantity_sold));
    out.truncate(limit);
    out
}

pub fn current_totals(buckets: &[TrendBucket]) -> Totals {
    buckets
        .last()
        .map(|b| Totals {
            revenue: b.revenue,
            quantity_sold: b.quantity_sold,
        })
        .unwrap_or_default()
}

/// Revenue change between the two latest buckets, in percent.
///
/// `None` only when there are fewer than two buckets. A zero previous bucket gives 100
/// (or 0 if the latest is zero too) instead of dividing by zero, and a figure too large
/// for `Decimal` saturates at `Decimal::MAX` or `Decimal::MIN`.
pub fn growth(buckets: &[TrendBucket]) -> Option<Decimal> {
    let [.., previous, latest] = buckets else {
        return None;
    };

    if previous.revenue.is_zero() {
        return Some(if latest.revenue.is_zero() {
            Decimal::ZERO
        } else {
            Decimal::ONE_HUNDRED
        });
    }

    let exact = latest
        .revenue
        .checked_sub(previous.revenue)
        .and_then(|delta| delta.checked_div(previous.revenue))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED));
    if exact.is_some() {
        return exact;
    }

    // Sign of (latest - previous) / previous.
    let rising = latest.revenue > previous.revenue;
    let positive = rising == previous.revenue.is_sign_positive();
    tracing::warn!(
        previous = %previous.period,
        latest = %latest.period,
        "growth overflowed; saturating"
    );
    Some(if positive { Decimal::MAX } else { Decimal::MIN })
}
