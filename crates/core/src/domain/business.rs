use crate::domain::session::User;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// `/api/dashboard` payload. Missing counters render as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dashboard {
    pub revenue: Decimal,
    pub total_products: u64,
    pub total_customers: u64,
    pub total_orders: u64,
    pub total_paid_payments: Decimal,
    pub total_pending_payments: Decimal,
    pub active_campaigns: Vec<Campaign>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// `/api/settings/{userId}` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user: User,
    #[serde(default)]
    pub business: Option<Business>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dashboard_defaults_missing_fields() {
        let d: Dashboard = serde_json::from_value(json!({
            "revenue": "2500.75",
            "totalOrders": 12
        }))
        .unwrap();

        assert_eq!(d.revenue, Decimal::new(250075, 2));
        assert_eq!(d.total_orders, 12);
        assert_eq!(d.total_customers, 0);
        assert!(d.active_campaigns.is_empty());
    }

    #[test]
    fn campaigns_keep_unknown_fields() {
        let d: Dashboard = serde_json::from_value(json!({
            "activeCampaigns": [{"name": "Dashain", "discount": 10}]
        }))
        .unwrap();

        assert_eq!(d.active_campaigns.len(), 1);
        assert_eq!(d.active_campaigns[0].name.as_deref(), Some("Dashain"));
        assert_eq!(d.active_campaigns[0].extra.get("discount"), Some(&json!(10)));
    }

    #[test]
    fn profile_without_business() {
        let p: Profile = serde_json::from_value(json!({
            "user": {"id": 3, "name": "Hari"}
        }))
        .unwrap();
        assert_eq!(p.user.id, "3");
        assert!(p.business.is_none());
    }
}
