pub mod config;
pub mod content;
pub mod domain;
pub mod filters;
pub mod srs;

#[cfg(test)]
pub(crate) mod testing;
