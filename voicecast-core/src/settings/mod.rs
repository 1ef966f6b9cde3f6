pub mod config;
pub mod loader;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use loader::default_settings_path;
