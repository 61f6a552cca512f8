use chrono::Utc;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::{
        calculate_cost, current_location, estimated_delivery, generate_tracking_code, NewPackage,
        PackageModel, PackageStatus,
    },
    qr::{render_qr_png, QrPayload},
    repository::PackageRepository,
    types::{
        AssignMessengerRequest, PackageView, RegisterPackageRequest, TrackingResponse,
        UpdateStatusRequest,
    },
};
use crate::auth::AuthClaims;
use crate::shared::{required, AppError};
use crate::user::{Role, UserRepository};

const PACKAGE_NOT_FOUND: &str = "Package not found";

/// Service for the package lifecycle: registration, status changes,
/// messenger assignment and the derived tracking data
pub struct PackageService {
    packages: Arc<dyn PackageRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
    tracking_base_url: String,
}

impl PackageService {
    pub fn new(
        packages: Arc<dyn PackageRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
        tracking_base_url: String,
    ) -> Self {
        Self {
            packages,
            users,
            tracking_base_url,
        }
    }

    /// Registers a package for an existing client, pricing it by weight
    #[instrument(skip(self, request))]
    pub async fn register_package(
        &self,
        request: RegisterPackageRequest,
    ) -> Result<PackageModel, AppError> {
        let missing = || {
            AppError::Validation(
                "Missing required fields: sender_name, recipient_name, delivery_address, client_id"
                    .to_string(),
            )
        };
        let sender_name = required(request.sender_name).ok_or_else(missing)?;
        let recipient_name = required(request.recipient_name).ok_or_else(missing)?;
        let delivery_address = required(request.delivery_address).ok_or_else(missing)?;
        let client_id = request.client_id.ok_or_else(missing)?;

        if let Some(weight) = request.weight {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AppError::Validation(
                    "Weight must be a non-negative number".to_string(),
                ));
            }
        }

        if self.users.get_user(client_id).await?.is_none() {
            warn!(client_id, "Package registered for unknown client");
            return Err(AppError::Validation("Client does not exist".to_string()));
        }

        let new_package = NewPackage {
            tracking_code: generate_tracking_code(Utc::now()),
            sender_name,
            recipient_name,
            delivery_address,
            weight: request.weight,
            cost: calculate_cost(request.weight),
            client_id,
        };
        let package = self.packages.create_package(&new_package).await?;

        info!(
            package_id = package.id,
            tracking_code = %package.tracking_code,
            cost = package.cost,
            "Package registered"
        );
        Ok(package)
    }

    #[instrument(skip(self))]
    pub async fn list_packages(&self) -> Result<Vec<PackageView>, AppError> {
        let packages = self.packages.list_packages().await?;
        self.with_names(packages).await
    }

    /// Public lookup by tracking code
    #[instrument(skip(self))]
    pub async fn track(&self, tracking_code: &str) -> Result<TrackingResponse, AppError> {
        let package = self
            .packages
            .get_by_tracking_code(tracking_code)
            .await?
            .ok_or_else(|| AppError::NotFound(PACKAGE_NOT_FOUND.to_string()))?;

        let location = current_location(package.status.as_ref()).to_string();
        let estimate = estimated_delivery(package.created_at);
        let view = self
            .with_names(vec![package])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("Tracking view lost its package".to_string()))?;

        Ok(TrackingResponse {
            view,
            current_location: location,
            estimated_delivery: estimate,
        })
    }

    /// Applies a status change on behalf of an authenticated caller.
    ///
    /// Checks run in a fixed order: presence of the status, existence of the
    /// package, messenger ownership, the staff-only states, and finally
    /// membership in the status set. No transition graph is enforced.
    #[instrument(skip(self, request, caller), fields(user_id = caller.user_id, role = %caller.role))]
    pub async fn update_status(
        &self,
        package_id: i32,
        request: UpdateStatusRequest,
        caller: &AuthClaims,
    ) -> Result<PackageModel, AppError> {
        let requested = required(request.status)
            .ok_or_else(|| AppError::Validation("Missing required field: status".to_string()))?;

        let package = self
            .packages
            .get_package(package_id)
            .await?
            .ok_or_else(|| AppError::NotFound(PACKAGE_NOT_FOUND.to_string()))?;

        if caller.role == Role::Messenger && package.assigned_messenger_id != Some(caller.user_id) {
            warn!(
                assigned_messenger_id = ?package.assigned_messenger_id,
                "Messenger updating a package assigned to someone else"
            );
            return Err(AppError::Forbidden(
                "You are not allowed to modify this package".to_string(),
            ));
        }

        let parsed = PackageStatus::from_str(&requested);
        if matches!(parsed, Ok(status) if status.is_staff_only()) && !caller.role.is_staff() {
            warn!(status = %requested, "Non-staff caller requesting a staff-only status");
            return Err(AppError::Forbidden(
                "You are not allowed to set this status".to_string(),
            ));
        }

        let status = parsed.map_err(|_| {
            debug!(status = %requested, "Rejected unknown status");
            AppError::InvalidStatus(requested.clone())
        })?;

        let updated = self
            .packages
            .update_status(package_id, status)
            .await?
            .ok_or_else(|| AppError::NotFound(PACKAGE_NOT_FOUND.to_string()))?;

        info!(
            from = %package.status,
            to = %updated.status,
            "Package status updated"
        );
        Ok(updated)
    }

    /// Assigns (or reassigns) a messenger; the target must have the messenger role
    #[instrument(skip(self, request))]
    pub async fn assign_messenger(
        &self,
        package_id: i32,
        request: AssignMessengerRequest,
    ) -> Result<PackageModel, AppError> {
        let messenger_id = request.messenger_id.ok_or_else(|| {
            AppError::Validation("Missing required field: messenger_id".to_string())
        })?;

        let is_messenger = self
            .users
            .get_user(messenger_id)
            .await?
            .is_some_and(|user| user.role == Role::Messenger);
        if !is_messenger {
            warn!(messenger_id, "Assignment target is not a messenger");
            return Err(AppError::Validation(
                "User does not exist or is not a messenger".to_string(),
            ));
        }

        let package = self
            .packages
            .assign_messenger(package_id, messenger_id)
            .await?
            .ok_or_else(|| AppError::NotFound(PACKAGE_NOT_FOUND.to_string()))?;

        info!(messenger_id, tracking_code = %package.tracking_code, "Messenger assigned");
        Ok(package)
    }

    /// Packages assigned to the calling messenger
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn my_deliveries(&self, caller: &AuthClaims) -> Result<Vec<PackageView>, AppError> {
        let packages = self.packages.list_by_messenger(caller.user_id).await?;
        self.with_names(packages).await
    }

    /// Packages owned by the calling client
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn my_packages(&self, caller: &AuthClaims) -> Result<Vec<PackageModel>, AppError> {
        self.packages.list_by_client(caller.user_id).await
    }

    /// PNG QR label for a package
    #[instrument(skip(self))]
    pub async fn qr_code(&self, package_id: i32) -> Result<Vec<u8>, AppError> {
        let package = self
            .packages
            .get_package(package_id)
            .await?
            .ok_or_else(|| AppError::NotFound(PACKAGE_NOT_FOUND.to_string()))?;

        let payload = QrPayload::for_package(&package, &self.tracking_base_url);
        let data = serde_json::to_string(&payload)
            .map_err(|e| AppError::Internal(format!("QR payload serialization failed: {e}")))?;
        render_qr_png(&data)
    }

    async fn with_names(&self, packages: Vec<PackageModel>) -> Result<Vec<PackageView>, AppError> {
        let mut ids: Vec<i32> = packages
            .iter()
            .flat_map(|p| std::iter::once(p.client_id).chain(p.assigned_messenger_id))
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let names: HashMap<i32, String> = self.users.display_names(&ids).await?;

        Ok(packages
            .into_iter()
            .map(|package| PackageView {
                client_name: names.get(&package.client_id).cloned(),
                messenger_name: package
                    .assigned_messenger_id
                    .and_then(|id| names.get(&id).cloned()),
                package,
            })
            .collect())
    }
}
