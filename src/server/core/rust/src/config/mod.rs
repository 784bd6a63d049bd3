/* src/server/core/rust/src/config/mod.rs */

mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use loader::{CONFIG_FILE, find_trellis_config, load_trellis_config};
pub use types::{AppSection, DevSection, RoutesConfig, TrellisConfig};
