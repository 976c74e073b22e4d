pub mod config;
pub mod context;

pub use config::ApplicationConfig;
pub use context::{Application, TypeMap, TypeMapExt};
