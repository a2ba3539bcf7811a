pub mod external_apis;
pub mod identity;
pub mod sessions;
