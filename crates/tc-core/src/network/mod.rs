pub mod protocol;
pub mod session_state;

pub use protocol::{Hello, Message, PROTOCOL_VERSION};
pub use session_state::SessionState;
