pub mod client;
pub mod common;
pub mod config;
pub mod custom_questions;
pub mod escape_room;
pub mod health;
pub mod mw;

#[cfg(test)]
mod tests;
