pub mod config;
pub mod content_views;
pub mod counter_api;
pub mod database_validator;
pub mod visitor_counter;
pub mod visitor_tracker;
