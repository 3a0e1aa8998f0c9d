use ebikri_core::analytics::{Granularity, SalesSummary};
use ebikri_core::domain::business::{Dashboard, Profile};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::fmt::Write;

fn money(v: Decimal) -> String {
    format!("${:.2}", v.round_dp(2))
}

pub fn dashboard(d: &Dashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Business Dashboard");
    let _ = writeln!(out, "  Total Revenue      {}", money(d.revenue));
    let _ = writeln!(out, "  Total Orders       {}", d.total_orders);
    let _ = writeln!(out, "  Total Customers    {}", d.total_customers);
    let _ = writeln!(out, "  Total Products     {}", d.total_products);
    let _ = writeln!(out, "  Paid Payments      {}", money(d.total_paid_payments));
    let _ = writeln!(out, "  Pending Payments   {}", money(d.total_pending_payments));
    if !d.active_campaigns.is_empty() {
        let _ = writeln!(out, "  Active Campaigns");
        for (i, c) in d.active_campaigns.iter().enumerate() {
            let name = c.name.clone().unwrap_or_else(|| format!("Campaign {}", i + 1));
            let _ = writeln!(out, "    - {name}");
        }
    }
    out
}

pub fn sales(s: &SalesSummary) -> String {
    let (title, label) = match s.view {
        Granularity::Month => ("Monthly", "this month"),
        Granularity::Year => ("Yearly", "this year"),
    };

    let mut out = String::new();
    let _ = writeln!(out, "Sales Analytics ({title})");
    let _ = writeln!(out, "  Revenue {label:<11} {}", money(s.totals.revenue));
    let _ = writeln!(out, "  Units {label:<13} {}", s.totals.quantity_sold);
    match s.growth {
        Some(g) => {
            let sign = if g.is_sign_positive() && !g.is_zero() { "+" } else { "" };
            let _ = writeln!(out, "  Growth              {sign}{:.1}%", g.round_dp(1));
        }
        None => {
            let _ = writeln!(out, "  Growth              n/a");
        }
    }

    let _ = writeln!(out, "\n  Period     Revenue        Units");
    for b in s.trends() {
        let _ = writeln!(
            out,
            "  {:<10} {:>12}  {:>6}",
            b.period,
            money(b.revenue),
            b.quantity_sold
        );
    }

    let points = s.chart_points();
    let peak = points.iter().map(|p| p.revenue).max().unwrap_or_default();
    if peak > Decimal::ZERO {
        let _ = writeln!(out, "\n  Revenue Chart");
        for p in &points {
            let _ = writeln!(out, "  {:>4} |{}", p.label, bar(p.revenue, peak));
        }
    }

    if !s.top_products.is_empty() {
        let _ = writeln!(out, "\n  Top Products");
        for (i, p) in s.top_products.iter().enumerate() {
            let _ = writeln!(out, "  {}. {} ({} sold)", i + 1, p.product_name, p.quantity_sold);
        }
    }
    out
}

pub fn profile(p: &Profile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Profile");
    let _ = writeln!(out, "  Name      {}", p.user.display_name());
    if let Some(email) = &p.user.email {
        let _ = writeln!(out, "  Email     {email}");
    }
    for (key, value) in &p.user.extra {
        let _ = writeln!(out, "  {key:<9} {}", plain(value));
    }

    if let Some(business) = &p.business {
        let _ = writeln!(out, "\nBusiness");
        if let Some(name) = &business.name {
            let _ = writeln!(out, "  Name      {name}");
        }
        for (key, value) in &business.extra {
            let _ = writeln!(out, "  {key:<9} {}", plain(value));
        }
    }
    out
}

const BAR_WIDTH: u32 = 30;

// Proportional to the peak; negative values draw nothing.
fn bar(value: Decimal, peak: Decimal) -> String {
    let cells = value
        .max(Decimal::ZERO)
        .checked_mul(Decimal::from(BAR_WIDTH))
        .and_then(|v| v.checked_div(peak))
        .map(|v| v.round().to_u32().unwrap_or(BAR_WIDTH))
        .unwrap_or(BAR_WIDTH)
        .min(BAR_WIDTH);
    "#".repeat(cells as usize)
}

fn plain(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebikri_core::domain::sales::SaleRecord;
    use serde_json::json;

    #[test]
    fn dashboard_shows_two_decimal_revenue() {
        let d: Dashboard = serde_json::from_value(json!({"revenue": "1234.5", "totalOrders": 3})).unwrap();
        let text = dashboard(&d);
        assert!(text.contains("$1234.50"));
        assert!(text.contains("Total Orders       3"));
    }

    #[test]
    fn sales_table_lists_buckets_and_top_products() {
        let records: Vec<SaleRecord> = serde_json::from_value(json!([
            {"productId": "A", "productName": "Chiya", "saleDate": "2024-01-02", "revenue": "100", "quantitySold": 5},
            {"productId": "A", "productName": "Chiya", "saleDate": "2024-02-02", "revenue": "150", "quantitySold": 5}
        ]))
        .unwrap();
        let text = sales(&SalesSummary::compute(&records, Granularity::Month));

        assert!(text.contains("2024-01"));
        assert!(text.contains("2024-02"));
        assert!(text.contains("+50.0%"));
        assert!(text.contains("1. Chiya (10 sold)"));

        // 100 against a 150 peak is two thirds of the bar.
        assert!(text.contains(&format!("    01 |{}\n", "#".repeat(20))));
        assert!(text.contains(&format!("    02 |{}\n", "#".repeat(30))));
    }

    #[test]
    fn bars_clamp_and_skip_negative_values() {
        let peak = Decimal::from(10);
        assert_eq!(bar(Decimal::from(-5), peak), "");
        assert_eq!(bar(Decimal::from(5), peak), "#".repeat(15));
        assert_eq!(bar(Decimal::MAX, Decimal::ONE), "#".repeat(30));
    }

    #[test]
    fn single_bucket_has_no_growth() {
        let records: Vec<SaleRecord> = serde_json::from_value(json!([
            {"productId": 1, "saleDate": "2024-01-02", "revenue": "10", "quantitySold": 1}
        ]))
        .unwrap();
        let text = sales(&SalesSummary::compute(&records, Granularity::Year));
        assert!(text.contains("n/a"));
    }

    #[test]
    fn profile_prints_business_fields() {
        let p: Profile = serde_json::from_value(json!({
            "user": {"id": 1, "name": "Ram", "email": "ram@shop.np"},
            "business": {"name": "Ram Pasal", "city": "Pokhara"}
        }))
        .unwrap();
        let text = profile(&p);
        assert!(text.contains("Ram Pasal"));
        assert!(text.contains("Pokhara"));
        assert!(text.contains("ram@shop.np"));
    }
}
