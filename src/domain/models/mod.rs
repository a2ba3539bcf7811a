pub mod credential;
pub mod item;
pub mod search;
pub mod summary;
