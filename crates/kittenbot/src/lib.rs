pub mod completion;
pub mod errors;
pub mod handler;
pub mod models;
pub mod providers;
pub mod secrets;
pub mod slack;
