use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{NewPackage, PackageModel, PackageStatus};
use crate::database::map_db_error;
use crate::shared::AppError;

const DUPLICATE_TRACKING_CODE: &str = "Tracking code already exists";

/// Trait for package repository operations.
/// Listings are ordered newest first.
#[async_trait]
pub trait PackageRepository {
    /// Inserts a package in `registered` state; `Conflict` on a tracking-code collision
    async fn create_package(&self, package: &NewPackage) -> Result<PackageModel, AppError>;
    async fn get_package(&self, package_id: i32) -> Result<Option<PackageModel>, AppError>;
    async fn get_by_tracking_code(
        &self,
        tracking_code: &str,
    ) -> Result<Option<PackageModel>, AppError>;

    /// Returns `None` when the package does not exist
    async fn update_status(
        &self,
        package_id: i32,
        status: PackageStatus,
    ) -> Result<Option<PackageModel>, AppError>;

    /// Returns `None` when the package does not exist
    async fn assign_messenger(
        &self,
        package_id: i32,
        messenger_id: i32,
    ) -> Result<Option<PackageModel>, AppError>;

    async fn list_packages(&self) -> Result<Vec<PackageModel>, AppError>;
    async fn list_by_client(&self, client_id: i32) -> Result<Vec<PackageModel>, AppError>;
    async fn list_by_messenger(&self, messenger_id: i32) -> Result<Vec<PackageModel>, AppError>;
}

struct PackageTable {
    next_id: i32,
    packages: HashMap<i32, PackageModel>,
}

impl PackageTable {
    fn newest_first<F>(&self, filter: F) -> Vec<PackageModel>
    where
        F: Fn(&PackageModel) -> bool,
    {
        let mut packages: Vec<PackageModel> = self
            .packages
            .values()
            .filter(|p| filter(p))
            .cloned()
            .collect();
        packages.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        packages
    }
}

/// In-memory implementation of PackageRepository for development and testing
pub struct InMemoryPackageRepository {
    table: Mutex<PackageTable>,
}

impl Default for InMemoryPackageRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPackageRepository {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(PackageTable {
                next_id: 1,
                packages: HashMap::new(),
            }),
        }
    }

    /// Creates an in-memory repository with pre-populated packages
    pub fn with_packages(packages: Vec<PackageModel>) -> Self {
        let next_id = packages.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let packages = packages.into_iter().map(|p| (p.id, p)).collect();

        Self {
            table: Mutex::new(PackageTable { next_id, packages }),
        }
    }

    pub fn package_count(&self) -> usize {
        self.table.lock().unwrap().packages.len()
    }
}

#[async_trait]
impl PackageRepository for InMemoryPackageRepository {
    #[instrument(skip(self, package), fields(tracking_code = %package.tracking_code))]
    async fn create_package(&self, package: &NewPackage) -> Result<PackageModel, AppError> {
        let mut table = self.table.lock().unwrap();

        if table
            .packages
            .values()
            .any(|p| p.tracking_code == package.tracking_code)
        {
            warn!("Tracking code collision in memory");
            return Err(AppError::Conflict(DUPLICATE_TRACKING_CODE.to_string()));
        }

        let id = table.next_id;
        table.next_id += 1;
        let model = package.clone().into_model(id, Utc::now());
        table.packages.insert(id, model.clone());

        debug!(package_id = id, "Package created in memory");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn get_package(&self, package_id: i32) -> Result<Option<PackageModel>, AppError> {
        let table = self.table.lock().unwrap();
        Ok(table.packages.get(&package_id).cloned())
    }

    #[instrument(skip(self))]
    async fn get_by_tracking_code(
        &self,
        tracking_code: &str,
    ) -> Result<Option<PackageModel>, AppError> {
        let table = self.table.lock().unwrap();
        Ok(table
            .packages
            .values()
            .find(|p| p.tracking_code == tracking_code)
            .cloned())
    }

    #[instrument(skip(self))]
    async fn update_status(
        &self,
        package_id: i32,
        status: PackageStatus,
    ) -> Result<Option<PackageModel>, AppError> {
        let mut table = self.table.lock().unwrap();
        Ok(table.packages.get_mut(&package_id).map(|package| {
            package.status = status;
            package.clone()
        }))
    }

    #[instrument(skip(self))]
    async fn assign_messenger(
        &self,
        package_id: i32,
        messenger_id: i32,
    ) -> Result<Option<PackageModel>, AppError> {
        let mut table = self.table.lock().unwrap();
        Ok(table.packages.get_mut(&package_id).map(|package| {
            package.assigned_messenger_id = Some(messenger_id);
            package.clone()
        }))
    }

    #[instrument(skip(self))]
    async fn list_packages(&self) -> Result<Vec<PackageModel>, AppError> {
        Ok(self.table.lock().unwrap().newest_first(|_| true))
    }

    #[instrument(skip(self))]
    async fn list_by_client(&self, client_id: i32) -> Result<Vec<PackageModel>, AppError> {
        Ok(self
            .table
            .lock()
            .unwrap()
            .newest_first(|p| p.client_id == client_id))
    }

    #[instrument(skip(self))]
    async fn list_by_messenger(&self, messenger_id: i32) -> Result<Vec<PackageModel>, AppError> {
        Ok(self
            .table
            .lock()
            .unwrap()
            .newest_first(|p| p.assigned_messenger_id == Some(messenger_id)))
    }
}

/// PostgreSQL implementation of package repository
pub struct PostgresPackageRepository {
    pool: PgPool,
}

impl PostgresPackageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PACKAGE_COLUMNS: &str = "id, tracking_code, sender_name, recipient_name, delivery_address, \
     weight, cost, client_id, assigned_messenger_id, status, created_at";

fn package_from_row(row: &PgRow) -> Result<PackageModel, AppError> {
    let read = |e: sqlx::Error| AppError::DatabaseError(e.to_string());

    let status: String = row.try_get("status").map_err(read)?;
    let status = PackageStatus::from_str(&status).map_err(|_| {
        AppError::DatabaseError(format!("Unknown status in packages table: {status}"))
    })?;

    Ok(PackageModel {
        id: row.try_get("id").map_err(read)?,
        tracking_code: row.try_get("tracking_code").map_err(read)?,
        sender_name: row.try_get("sender_name").map_err(read)?,
        recipient_name: row.try_get("recipient_name").map_err(read)?,
        delivery_address: row.try_get("delivery_address").map_err(read)?,
        weight: row.try_get("weight").map_err(read)?,
        cost: row.try_get("cost").map_err(read)?,
        client_id: row.try_get("client_id").map_err(read)?,
        assigned_messenger_id: row.try_get("assigned_messenger_id").map_err(read)?,
        status,
        created_at: row.try_get("created_at").map_err(read)?,
    })
}

impl PostgresPackageRepository {
    async fn fetch_optional(
        &self,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> Result<Option<PackageModel>, AppError> {
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(e, DUPLICATE_TRACKING_CODE))?;
        row.as_ref().map(package_from_row).transpose()
    }

    async fn fetch_all(
        &self,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> Result<Vec<PackageModel>, AppError> {
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error(e, DUPLICATE_TRACKING_CODE))?;
        rows.iter().map(package_from_row).collect()
    }
}

#[async_trait]
impl PackageRepository for PostgresPackageRepository {
    #[instrument(skip(self, package), fields(tracking_code = %package.tracking_code))]
    async fn create_package(&self, package: &NewPackage) -> Result<PackageModel, AppError> {
        debug!("Creating package in database");

        let row = sqlx::query(&format!(
            "INSERT INTO packages (tracking_code, sender_name, recipient_name, delivery_address, \
             weight, cost, client_id, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {PACKAGE_COLUMNS}"
        ))
        .bind(&package.tracking_code)
        .bind(&package.sender_name)
        .bind(&package.recipient_name)
        .bind(&package.delivery_address)
        .bind(package.weight)
        .bind(package.cost)
        .bind(package.client_id)
        .bind(PackageStatus::Registered.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, DUPLICATE_TRACKING_CODE))?;

        package_from_row(&row)
    }

    #[instrument(skip(self))]
    async fn get_package(&self, package_id: i32) -> Result<Option<PackageModel>, AppError> {
        let sql = format!("SELECT {PACKAGE_COLUMNS} FROM packages WHERE id = $1");
        self.fetch_optional(sqlx::query(&sql).bind(package_id)).await
    }

    #[instrument(skip(self))]
    async fn get_by_tracking_code(
        &self,
        tracking_code: &str,
    ) -> Result<Option<PackageModel>, AppError> {
        let sql = format!("SELECT {PACKAGE_COLUMNS} FROM packages WHERE tracking_code = $1");
        self.fetch_optional(sqlx::query(&sql).bind(tracking_code))
            .await
    }

    #[instrument(skip(self))]
    async fn update_status(
        &self,
        package_id: i32,
        status: PackageStatus,
    ) -> Result<Option<PackageModel>, AppError> {
        let sql = format!("UPDATE packages SET status = $1 WHERE id = $2 RETURNING {PACKAGE_COLUMNS}");
        self.fetch_optional(sqlx::query(&sql).bind(status.as_ref()).bind(package_id))
            .await
    }

    #[instrument(skip(self))]
    async fn assign_messenger(
        &self,
        package_id: i32,
        messenger_id: i32,
    ) -> Result<Option<PackageModel>, AppError> {
        let sql = format!(
            "UPDATE packages SET assigned_messenger_id = $1 WHERE id = $2 RETURNING {PACKAGE_COLUMNS}"
        );
        self.fetch_optional(sqlx::query(&sql).bind(messenger_id).bind(package_id))
            .await
    }

    #[instrument(skip(self))]
    async fn list_packages(&self) -> Result<Vec<PackageModel>, AppError> {
        let sql = format!("SELECT {PACKAGE_COLUMNS} FROM packages ORDER BY created_at DESC, id DESC");
        self.fetch_all(sqlx::query(&sql)).await
    }

    #[instrument(skip(self))]
    async fn list_by_client(&self, client_id: i32) -> Result<Vec<PackageModel>, AppError> {
        let sql = format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages WHERE client_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        self.fetch_all(sqlx::query(&sql).bind(client_id)).await
    }

    #[instrument(skip(self))]
    async fn list_by_messenger(&self, messenger_id: i32) -> Result<Vec<PackageModel>, AppError> {
        let sql = format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages WHERE assigned_messenger_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        self.fetch_all(sqlx::query(&sql).bind(messenger_id)).await
    }
}
