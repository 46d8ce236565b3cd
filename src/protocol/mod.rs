// Command protocol
//
// Request/response dispatch between agents that produce commands and the
// rendering command servers that execute them.

pub mod command;
pub mod errors;
pub mod registry;

pub use command::{parse_batch, Command, CommandOutcome};
pub use errors::{CommandError, CommandResult};
pub use registry::{CommandEndpoint, CommandRegistry, SurfaceId};
