//! Xplore API — AI-generated career roadmaps, saved per user.

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod llm_client;
pub mod models;
pub mod roadmap;
pub mod routes;
pub mod state;
pub mod store;
