pub mod forecast;
pub mod geolocation;
pub mod llm;
pub mod openweather;
pub mod retry;
pub mod summary;
pub mod summary_client;
pub mod view;
