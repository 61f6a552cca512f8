// Public API - what other modules can use
pub use handlers::{
    assign_messenger, list_packages, my_deliveries, my_packages, package_qr, register_package,
    track_package, update_status,
};
pub use models::{PackageModel, PackageStatus};
pub use repository::{InMemoryPackageRepository, PackageRepository, PostgresPackageRepository};

// Internal modules
mod handlers;
pub mod models;
pub mod qr;
pub mod repository;
pub mod service;
pub mod types;
