//! Parser for the graphstore REPL, split out from the binary so it's
//! exercisable from integration tests.

pub mod parser;
