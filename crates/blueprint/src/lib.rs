//! Blueprint operator CLI
//!
//! Loads an event's baseline schema from the persistence service, stages the
//! changes described by a plan file, validates them, and commits them as one
//! request.

pub mod cli;
