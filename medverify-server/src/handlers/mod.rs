//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod health;
pub mod process_image;
pub mod validate;
pub mod verify;

pub use crate::state::AppState;
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use process_image::process_image_handler;
pub use validate::validate_handler;
pub use verify::verify_handler;
