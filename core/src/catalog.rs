//! Entity catalog — the fixed business schema the generators populate.
//!
//! RULE: Two entity instances are the same entity iff their natural keys
//! match. Equality and hashing go through `Entity::key()`, never through
//! field-by-field comparison or a formatted string.

use crate::types::{EntityId, Timestamp, TAG_DATETIME_FORMAT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A persisted business entity with a natural primary key.
pub trait Entity {
    type Key: Eq + Hash;

    /// Table the entity is persisted to.
    const TABLE: &'static str;

    fn key(&self) -> Self::Key;
}

/// Derive PartialEq, Eq and Hash from `Entity::key()`.
macro_rules! key_identity {
    ($($ty:ty),+ $(,)?) => {$(
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.key() == other.key()
            }
        }

        impl Eq for $ty {}

        impl Hash for $ty {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.key().hash(state);
            }
        }
    )+};
}

// ── Reference entities ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_id: EntityId,
    pub product_name: String,
    pub headline_rate_lb: f64,
    pub headline_rate_ub: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visitor {
    pub visitor_id: EntityId,
    pub customer_id: Option<EntityId>,
}

/// Exactly one of `card_member_ind` / `dpl_ind` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: EntityId,
    pub card_member_ind: bool,
    pub dpl_ind: bool,
}

impl Customer {
    pub fn new(customer_id: EntityId, card_member: bool) -> Self {
        Self {
            customer_id,
            card_member_ind: card_member,
            dpl_ind: !card_member,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub channel_id: EntityId,
    pub channel_name: String,
}

/// A campaign sells one product through one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub campaign_id: EntityId,
    pub campaign_name: String,
    pub channel_id: EntityId,
    pub product_id: EntityId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketingSpend {
    pub campaign_id: EntityId,
    pub start_dt: Timestamp,
    pub end_dt: Timestamp,
    pub channel_spend: f64,
    pub campaign_spend: f64,
}

// ── Eligibility ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetPopulation {
    pub campaign_id: EntityId,
    pub visitor_id: EntityId,
    /// None means no personalised offer.
    pub offer_id: Option<String>,
    pub resp_prob: f64,
    pub conv_prob: f64,
    pub cus_value: f64,
    pub eligibility_flag: bool,
    pub expected_approval_rate: f64,
    pub valid_from: Option<Timestamp>,
    pub valid_to: Option<Timestamp>,
}

// ── Funnel ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub activity_id: EntityId,
    pub visitor_id: EntityId,
    pub clicked_dt: Timestamp,
    pub clicked_campaign: EntityId,
    pub clicked_channel: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    Applied,
    Approved,
    Rejected,
    Offered,
    Accepted,
    HardPull,
    Converted,
    Cancelled,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 8] = [
        Self::Applied,
        Self::Approved,
        Self::Rejected,
        Self::Offered,
        Self::Accepted,
        Self::HardPull,
        Self::Converted,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Offered => "offered",
            Self::Accepted => "accepted",
            Self::HardPull => "hard-pull",
            Self::Converted => "converted",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// A story stops after a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Converted | Self::Cancelled)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status row of an application story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub application_id: EntityId,
    pub status_dt: Timestamp,
    pub status: ApplicationStatus,
    /// Shared by every row of one story.
    pub story_id: EntityId,
    pub visitor_id: EntityId,
    pub campaign_id: EntityId,
    pub channel_id: EntityId,
    pub conversion_flag: bool,
}

// ── Identity ───────────────────────────────────────────────────────

impl Entity for Product {
    type Key = EntityId;
    const TABLE: &'static str = "products";
    fn key(&self) -> EntityId {
        self.product_id.clone()
    }
}

impl Entity for Visitor {
    type Key = EntityId;
    const TABLE: &'static str = "visitors";
    fn key(&self) -> EntityId {
        self.visitor_id.clone()
    }
}

impl Entity for Customer {
    type Key = EntityId;
    const TABLE: &'static str = "customers";
    fn key(&self) -> EntityId {
        self.customer_id.clone()
    }
}

impl Entity for Channel {
    type Key = EntityId;
    const TABLE: &'static str = "channels";
    fn key(&self) -> EntityId {
        self.channel_id.clone()
    }
}

impl Entity for Campaign {
    type Key = EntityId;
    const TABLE: &'static str = "campaigns";
    fn key(&self) -> EntityId {
        self.campaign_id.clone()
    }
}

impl Entity for MarketingSpend {
    type Key = (EntityId, Timestamp, Timestamp);
    const TABLE: &'static str = "marketing_spend";
    fn key(&self) -> Self::Key {
        (self.campaign_id.clone(), self.start_dt, self.end_dt)
    }
}

impl Entity for TargetPopulation {
    type Key = (EntityId, EntityId);
    const TABLE: &'static str = "target_population";
    fn key(&self) -> Self::Key {
        (self.campaign_id.clone(), self.visitor_id.clone())
    }
}

impl Entity for Activity {
    type Key = EntityId;
    const TABLE: &'static str = "activities";
    fn key(&self) -> EntityId {
        self.activity_id.clone()
    }
}

impl Entity for Application {
    type Key = (EntityId, Timestamp);
    const TABLE: &'static str = "applications";
    fn key(&self) -> Self::Key {
        (self.application_id.clone(), self.status_dt)
    }
}

key_identity!(
    Product,
    Visitor,
    Customer,
    Channel,
    Campaign,
    MarketingSpend,
    TargetPopulation,
    Activity,
    Application,
);

// ── Log tags ───────────────────────────────────────────────────────

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p_{}", self.product_id)
    }
}

impl fmt::Display for Visitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v_{}", self.visitor_id)
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u_{}", self.customer_id)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h_{}", self.channel_id)
    }
}

impl fmt::Display for Campaign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c_{}", self.campaign_id)
    }
}

impl fmt::Display for MarketingSpend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ms_{}_{}_{}",
            self.campaign_id,
            self.start_dt.format(TAG_DATETIME_FORMAT),
            self.end_dt.format(TAG_DATETIME_FORMAT)
        )
    }
}

impl fmt::Display for TargetPopulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tp_{}_{}", self.visitor_id, self.campaign_id)
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ac_{}", self.activity_id)
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ap_{}_{}",
            self.application_id,
            self.status_dt.format(TAG_DATETIME_FORMAT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn ts(day: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn equality_follows_the_natural_key() {
        let a = Visitor {
            visitor_id: "V00000001".into(),
            customer_id: None,
        };
        let b = Visitor {
            visitor_id: "V00000001".into(),
            customer_id: Some("C00000000".into()),
        };
        assert_eq!(a, b, "same key, different attributes must be equal");

        let set: HashSet<Visitor> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn application_key_includes_status_dt() {
        let row = |day| Application {
            application_id: "AP00000000".into(),
            status_dt: ts(day),
            status: ApplicationStatus::Applied,
            story_id: "ST00000000".into(),
            visitor_id: "V00000000".into(),
            campaign_id: "CA00000".into(),
            channel_id: "CH000".into(),
            conversion_flag: false,
        };
        assert_ne!(row(2), row(3));
        assert_eq!(row(2).to_string(), "ap_AP00000000_20240102000000");
    }

    #[test]
    fn customer_flags_are_exclusive() {
        for card in [true, false] {
            let c = Customer::new("C00000000".into(), card);
            assert!(c.card_member_ind ^ c.dpl_ind);
        }
    }

    #[test]
    fn status_strings_round_trip() {
        for status in ApplicationStatus::ALL {
            assert_eq!(ApplicationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(
            serde_json::to_string(&ApplicationStatus::HardPull).unwrap(),
            "\"hard-pull\""
        );
    }
}
