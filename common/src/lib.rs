pub mod config;
pub mod lifecycle;
pub mod logger;

pub use config::Config;
pub use lifecycle::{JobGuard, LifecycleState};
