mod api;
mod health;
mod static_files;

pub use api::api_router;
pub use health::health_router;
pub use static_files::static_router;
