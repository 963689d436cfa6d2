//! Client library for the marketplace backend's Printful endpoints.
//!
//! Provides the REST wrapper ([`PrintfulApi`]), the trait seams the
//! pipeline depends on ([`backend`]), the composite uploader, and the
//! bounded, cancellable mockup-status poller.

pub mod api;
pub mod backend;
pub mod config;
pub mod poll;
pub mod upload;

pub use api::{ApiError, CreateTaskRequest, PrintfulApi, TaskFile};
pub use backend::{CatalogSource, FileUploader, MockupTaskService, TaskStatusSource};
pub use config::{ClientConfig, ConfigError};
pub use poll::{poll_mockup_status, spawn_poll, PollConfig, PollError, PollHandle};
pub use upload::upload_composite;
