mod app;
mod factory;

#[allow(unused_imports)]
pub use app::{test_config, TestApp};
#[allow(unused_imports)]
pub use factory::{Factory, TestAuth, PASSWORD};
