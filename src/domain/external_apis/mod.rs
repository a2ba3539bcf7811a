pub mod github;
pub mod identity;
