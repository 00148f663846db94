pub mod config;
pub mod content;
pub mod exercise;
pub mod handlers;
pub mod progress;
pub mod state;
