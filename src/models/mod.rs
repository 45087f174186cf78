pub mod calendar;
pub mod client;
pub mod day;
pub mod profile;
pub mod project;
pub mod tag;

pub use calendar::*;
pub use client::*;
pub use day::*;
pub use profile::*;
pub use project::*;
pub use tag::*;
