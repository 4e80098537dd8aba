//! Shared fixtures for integration tests

pub mod configs;
pub mod simulator;
pub mod test_server;
pub mod transports;

#[allow(unused_imports)]
pub use configs::MockConfigs;
#[allow(unused_imports)]
pub use simulator::StaticSimulator;
#[allow(unused_imports)]
pub use test_server::{ScriptedReply, TestServer};
#[allow(unused_imports)]
pub use transports::ScriptedTransport;
