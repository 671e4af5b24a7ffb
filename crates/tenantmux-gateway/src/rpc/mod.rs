//! Greeter RPC surface: wire types, service, reply builder, stream session.

pub mod greeter;
pub mod proto;
pub mod reply;
pub mod session;

pub use greeter::GreeterService;
pub use proto::greeter_server::GreeterServer;
pub use reply::{GreetingBuilder, ReplyBuilder};
pub use session::{run_session, SessionEnd, SessionSummary};
