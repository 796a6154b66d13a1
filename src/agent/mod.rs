//! Agent session: drives assistant runs and serves their tool calls.

mod error;
mod poller;
mod session;

pub use error::SessionError;
pub use poller::{PollPolicy, RunPoller};
pub use session::AgentSession;
