//! ParamScrub Filter List Compiler
//!
//! This crate compiles AdBlock-style `$removeparam` filter lists into the
//! rule model of `ps-core`.

pub mod parser;
pub mod optimizer;

pub use optimizer::{optimize_rules, OptimizeStats};
pub use parser::{compile_line, parse_filter_list, wildcard_to_regex, FilterCompiler};
