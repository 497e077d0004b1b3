pub mod feed_service;
pub mod fetch_service;
pub mod retention_service;
pub mod import_export_service;

pub use feed_service::FeedService;
pub use fetch_service::FetchService;
pub use retention_service::RetentionService;
pub use import_export_service::{ImportExportService, ImportResult};
