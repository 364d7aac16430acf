pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use api::CrmApi;
pub use client::HttpCrmClient;
pub use config::AppConfig;
pub use error::CrmError;
pub use types::{Conversation, DateWindow, Message};
