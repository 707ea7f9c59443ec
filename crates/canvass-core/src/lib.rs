//! Core types and trait definitions for the canvass survey engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; the persistent store and the language model
//! are reached only through the [`store::SurveyStore`] and
//! [`generate::TextGenerator`] traits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod company;
pub mod error;
pub mod generate;
pub mod progress;
pub mod question;
pub mod report;
pub mod response;
pub mod store;
pub mod survey;
pub mod theme;

pub use error::{Error, Result};
