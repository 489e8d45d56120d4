//! MCT: Meridian Change Toolkit
//!
//! A Unix-style toolkit for managing controlled documents, drawing
//! revisions, engineering change notes, and part comparisons as plain
//! text files.

pub mod cli;
pub mod core;
pub mod diff;
pub mod entities;
pub mod schema;
pub mod yaml;
