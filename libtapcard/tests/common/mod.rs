// Shared helpers for the integration test crates. Each aggregator pulls this
// in with `#[path]`, so not every crate uses every item.
#![allow(dead_code)]


pub use helpers::*;
