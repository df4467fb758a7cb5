//! Domain library for the Matrícula enrollment platform.
//!
//! The crate hosts the enrollment wizard (draft state, cascading selectors,
//! step validation, payment composition, submission orchestration), the
//! catalog of reference data, lead capture, and session-based auth. HTTP
//! wiring and storage implementations live in the `matricula-api` service.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod records;
pub mod telemetry;
pub mod workflows;
