//! # wagate-core
//!
//! Core types, the messaging client trait, configuration, and error handling
//! shared by every wagate crate.

pub mod config;
pub mod error;
pub mod formatter;
pub mod message;
pub mod traits;
