pub mod connection;
mod session;

pub use connection::ConnectionStatus;
pub use session::SessionPhase;
