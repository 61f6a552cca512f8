use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

pub const BASE_COST: f64 = 10_000.0;
pub const COST_PER_KG: f64 = 5_000.0;
pub const DELIVERY_DAYS: i64 = 3;

const TRACKING_PREFIX: &str = "URABA";
const TRACKING_SUFFIX_LEN: usize = 5;
const TRACKING_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Closed set of delivery states. Any state may move to any other.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PackageStatus {
    Registered,
    InTransit,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl PackageStatus {
    /// States only operators and admins may set
    pub fn is_staff_only(self) -> bool {
        matches!(self, PackageStatus::Registered | PackageStatus::Cancelled)
    }
}

/// Database model for the packages table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageModel {
    pub id: i32,
    pub tracking_code: String, // Immutable once issued
    pub sender_name: String,
    pub recipient_name: String,
    pub delivery_address: String,
    pub weight: Option<f64>, // Kilograms
    pub cost: f64,
    pub client_id: i32,
    pub assigned_messenger_id: Option<i32>,
    pub status: PackageStatus,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a package; the repository assigns id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewPackage {
    pub tracking_code: String,
    pub sender_name: String,
    pub recipient_name: String,
    pub delivery_address: String,
    pub weight: Option<f64>,
    pub cost: f64,
    pub client_id: i32,
}

impl NewPackage {
    pub fn into_model(self, id: i32, created_at: DateTime<Utc>) -> PackageModel {
        PackageModel {
            id,
            tracking_code: self.tracking_code,
            sender_name: self.sender_name,
            recipient_name: self.recipient_name,
            delivery_address: self.delivery_address,
            weight: self.weight,
            cost: self.cost,
            client_id: self.client_id,
            assigned_messenger_id: None,
            status: PackageStatus::Registered,
            created_at,
        }
    }
}

/// Shipping cost: flat base plus a per-kilogram charge
pub fn calculate_cost(weight: Option<f64>) -> f64 {
    match weight {
        Some(kg) => BASE_COST + kg * COST_PER_KG,
        None => BASE_COST,
    }
}

/// `URABA-<unix millis>-<5 uppercase alphanumerics>`
pub fn generate_tracking_code(now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..TRACKING_SUFFIX_LEN)
        .map(|_| TRACKING_ALPHABET[rng.random_range(0..TRACKING_ALPHABET.len())] as char)
        .collect();
    format!("{TRACKING_PREFIX}-{}-{suffix}", now.timestamp_millis())
}

/// Human-readable location for a raw status value
pub fn current_location(status: &str) -> &'static str {
    match status {
        "registered" => "Central warehouse",
        "in_transit" => "En route",
        "out_for_delivery" => "Local delivery",
        "delivered" => "Recipient location",
        "cancelled" => "Cancelled shipment",
        _ => "Unavailable",
    }
}

pub fn estimated_delivery(created_at: DateTime<Utc>) -> NaiveDate {
    (created_at + Duration::days(DELIVERY_DAYS)).date_naive()
}
