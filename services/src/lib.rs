pub mod capabilities;
pub mod cooldown;
pub mod error;
pub mod messages;
pub mod notify;
pub mod ops;
pub mod pipeline;
pub mod query;
pub mod sender;
pub mod tasks;
pub mod testing;

pub use error::{CommandError, CommandResult};
pub use pipeline::{CommandPipeline, PipelineConfig};
pub use sender::CommandSender;
