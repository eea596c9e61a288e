// lib.rs - Main library file that exports all modules
pub mod api_client;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod stores;

// Re-export commonly used types for convenience
pub use api_client::ApiClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use session::{AuthSession, UserProfile};
pub use stores::chat::ChatStore;
pub use stores::video::VideoStore;
