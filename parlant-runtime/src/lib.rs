pub mod backend;
pub mod config_store;
pub mod microphone;
pub mod runtime_controller;
pub mod speech;
