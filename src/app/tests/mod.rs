//! Controller tests against in-crate fakes.
//!
//! Async operations are driven with `pollster::block_on`.

mod bootstrap_tests;
mod template_tests;
