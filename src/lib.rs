//! Formsense - form field grouping and category inference
//!
//! This library decides how a flat list of data-capture fields should be
//! visually grouped when a mobile client renders a form section:
//! - Resolve server-declared category combos into definitive groups
//! - Infer multi-dimensional grids from naming-convention patterns
//! - Score un-patterned clusters for mutual exclusivity
//! - Fall back to similarity clustering, then flat lists
//!
//! The engine is a pure function of (fields, optional category metadata):
//! it never fetches, persists, or mutates its inputs, and every input
//! terminates in a complete partition of the fields.

pub mod assembler;
pub mod category;
pub mod conditional;
pub mod config;
pub mod dimensional;
pub mod error;
pub mod exclusivity;
pub mod models;
pub mod render;
pub mod semantic;
pub mod tokenizer;
pub mod validator;
