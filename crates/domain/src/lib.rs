//! Shared types for the wabot crates: configuration, errors, contact
//! categories, conversation turns and structured trace events.

pub mod config;
pub mod contact;
pub mod cron;
pub mod error;
pub mod trace;
pub mod turn;
