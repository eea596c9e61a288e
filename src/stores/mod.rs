// src/stores/mod.rs
pub mod chat;
pub mod video;
