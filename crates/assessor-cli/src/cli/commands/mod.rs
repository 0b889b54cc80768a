use super::args::*;

pub mod assess;
pub mod job;
pub mod prompt;
pub(crate) mod runner_builder;
pub mod tier;

mod dispatch;
pub use dispatch::dispatch;
