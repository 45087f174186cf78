pub mod client;
pub mod day;
pub mod profile;
pub mod profile_tag;
pub mod project;
pub mod tag;

pub mod prelude;

pub use prelude::*;
