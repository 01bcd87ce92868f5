pub mod config;
pub mod updater;
