//! # calendar-backend
//!
//! Google Calendar collaborator for the availability engine.
//!
//! Handles everything around the free-slot computation: OAuth for installed
//! applications, listing and creating events, and fetching busy intervals from the
//! free/busy endpoint, normalized to UTC before they reach
//! [`availability_engine::compute_free_slots`].
//!
//! ## Modules
//!
//! - [`auth`] — client secrets, cached tokens, refresh, loopback consent flow
//! - [`client`] — `CalendarBackend` trait and the REST implementation
//! - [`service`] — `CalendarService` facade with defaults
//! - [`models`] — API wire types
//! - [`summary`] — name/start/end event summaries
//! - [`config`] — file, environment and default settings
//! - [`error`] — Error types

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod summary;

pub use auth::{Authenticator, ClientSecrets, StaticToken, StoredToken, TokenSource, TokenStore};
pub use client::{CalendarBackend, GoogleCalendarClient};
pub use config::BackendConfig;
pub use error::BackendError;
pub use models::{Event, EventQuery, NewEvent};
pub use service::{CalendarService, CreateEventRequest, EventRequest};
pub use summary::EventSummary;
