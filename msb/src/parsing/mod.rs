//! Loading of science-program documents.
//!
//! The core tree model never parses raw text itself; this module is the
//! boundary glue that turns a structured document (JSON here, standing in
//! for the observatory's XML layer) into a [`crate::program::ScienceProgram`]
//! with its reference-definition table populated.

pub mod json_parser;


pub use json_parser::{parse_program_json, parse_program_json_str};
