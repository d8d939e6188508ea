//! Language model insights for filtered feedback.
//!
//! The client is optional: without an API key every call fails fast and the
//! boundary helpers substitute fixed placeholder text.

pub mod client;

pub use client::{
    answer_or_placeholder, insights_or_placeholder, InsightClient, InsightConfig,
};
