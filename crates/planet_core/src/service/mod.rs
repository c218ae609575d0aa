//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep HTTP and bootstrap layers decoupled from storage details.

pub mod planet_service;
