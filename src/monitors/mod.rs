//! Single-threaded evaluation of the reading stream
//!
//! - [`window::SampleWindow`]: readings of the last retention span, sorted by value
//! - [`evaluator::AlertEvaluator`]: median threshold with debounce
//!
//! Both are owned by the coordinator task and never shared.

pub mod evaluator;
pub mod window;
