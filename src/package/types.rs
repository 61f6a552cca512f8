use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::models::{PackageModel, PackageStatus};

/// Request payload for POST /api/packages/register
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RegisterPackageRequest {
    pub sender_name: Option<String>,
    pub recipient_name: Option<String>,
    pub delivery_address: Option<String>,
    pub weight: Option<f64>,
    pub client_id: Option<i32>,
}

/// Request payload for PUT /api/packages/:id/status
#[derive(Debug, Default, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

/// Request payload for PUT /api/packages/:id/assign-messenger
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AssignMessengerRequest {
    pub messenger_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PackageCreatedResponse {
    pub message: String,
    pub package: PackageModel,
}

/// Package joined with the display names of the people involved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageView {
    #[serde(flatten)]
    pub package: PackageModel,
    pub client_name: Option<String>,
    pub messenger_name: Option<String>,
}

/// Public tracking view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingResponse {
    #[serde(flatten)]
    pub view: PackageView,
    pub current_location: String,
    pub estimated_delivery: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub id: i32,
    pub tracking_code: String,
    pub status: PackageStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusUpdatedResponse {
    pub message: String,
    pub package: StatusSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentSummary {
    pub id: i32,
    pub tracking_code: String,
    pub assigned_messenger_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessengerAssignedResponse {
    pub message: String,
    pub package: AssignmentSummary,
}

impl From<&PackageModel> for StatusSummary {
    fn from(package: &PackageModel) -> Self {
        Self {
            id: package.id,
            tracking_code: package.tracking_code.clone(),
            status: package.status,
        }
    }
}

impl From<&PackageModel> for AssignmentSummary {
    fn from(package: &PackageModel) -> Self {
        Self {
            id: package.id,
            tracking_code: package.tracking_code.clone(),
            assigned_messenger_id: package.assigned_messenger_id,
        }
    }
}
