//! CLI module for Blueprint
//!
//! Each subcommand lives in its own module with an `*Args` struct and a
//! `run` function. Commands that talk to the persistence service are generic
//! over [`blueprint_schema::SchemaService`].

pub mod config;
pub mod edit;
pub mod error;
pub mod output;
pub mod plan;
pub mod show;
pub mod types;
