use crate::analytics::{
    bucket_by_period, current_totals, growth, rank_top_products, Granularity, ProductRanking,
    Totals, TrendBucket, TOP_PRODUCTS_LIMIT,
};
use crate::domain::sales::SaleRecord;
use rust_decimal::Decimal;
use serde::Serialize;

/// Everything the sales screen shows for one view, computed in a single pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub view: Granularity,
    pub monthly: Vec<TrendBucket>,
    pub yearly: Vec<TrendBucket>,
    pub top_products: Vec<ProductRanking>,
    pub totals: Totals,
    pub growth: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub revenue: Decimal,
}

impl SalesSummary {
    pub fn compute(records: &[SaleRecord], view: Granularity) -> Self {
        let monthly = bucket_by_period(records, Granularity::Month);
        let yearly = bucket_by_period(records, Granularity::Year);
        let top_products = rank_top_products(records, TOP_PRODUCTS_LIMIT);

        let selected = match view {
            Granularity::Month => &monthly,
            Granularity::Year => &yearly,
        };
        let totals = current_totals(selected);
        let growth = growth(selected);

        tracing::debug!(
            records = records.len(),
            ?view,
            monthly_buckets = monthly.len(),
            yearly_buckets = yearly.len(),
            "sales summary computed"
        );

        Self {
            view,
            monthly,
            yearly,
            top_products,
            totals,
            growth,
        }
    }

    /// Buckets for the selected view.
    pub fn trends(&self) -> &[TrendBucket] {
        match self.view {
            Granularity::Month => &self.monthly,
            Granularity::Year => &self.yearly,
        }
    }

    /// Chart series for the selected view. Monthly points are labelled by month number
    /// only, yearly points by year.
    pub fn chart_points(&self) -> Vec<ChartPoint> {
        self.trends()
            .iter()
            .map(|b| {
                let label = match self.view {
                    Granularity::Month => b
                        .period
                        .split_once('-')
                        .map(|(_, month)| month.to_string())
                        .unwrap_or_else(|| b.period.clone()),
                    Granularity::Year => b.period.clone(),
                };
                ChartPoint {
                    label,
                    revenue: b.revenue,
                }
            })
            .collect()
    }
}
