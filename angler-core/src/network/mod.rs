pub mod connection;

pub use connection::{CommandSender, ConnectionInfo, GameConnection};
