pub mod health;
pub mod summary;
pub mod view;
pub mod weather;
