#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod scene_dump;
pub mod schema;
pub mod state;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
