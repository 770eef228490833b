//! Corpus library exports for testing

pub mod core;
pub mod rag;
pub mod tui;

#[cfg(test)]
pub mod test_support;
