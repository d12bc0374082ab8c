//! Cross-crate scenarios run against a fully wired in-memory engine.

mod helpers;

mod cache_test;
mod folder_test;
mod member_test;
mod scenario_test;
