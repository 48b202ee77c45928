//! Account management web service: login, logout, registration, profile
//! editing, password change and a dashboard for logged-in users.

pub mod cli;
pub mod config;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod helpers;
pub mod router;
pub mod schemas;
pub mod session;
pub mod templates;
