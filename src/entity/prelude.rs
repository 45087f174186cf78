pub use super::client::Entity as Client;
pub use super::day::Entity as Day;
pub use super::profile::Entity as Profile;
pub use super::profile_tag::Entity as ProfileTag;
pub use super::project::Entity as Project;
pub use super::tag::Entity as Tag;
