pub mod http;
pub mod protocol;

pub use http::{spawn_client, NetClient};
pub use protocol::{FetchError, Incoming, IncomingKind, Request};
