pub mod analytics;
pub mod auth;
pub mod config;
pub mod entities;
pub mod error;
pub mod task;
pub mod user;
pub mod web;
