#![forbid(unsafe_code)]

pub mod config;
pub mod contract;
pub mod credential;
pub mod error;
pub mod http;
pub mod memory;
pub mod route;

pub use config::ApiConfig;
pub use contract::QuizApi;
pub use credential::SessionCredential;
pub use error::{ApiError, ConfigError};
pub use http::HttpQuizApi;
pub use memory::InMemoryQuizApi;
pub use route::Route;
