//! Column extraction from the SELECT clause of a token tree.
pub mod extractor;
pub mod resolver;
pub mod scanner;
