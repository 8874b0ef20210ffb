mod id_macro;
mod node_id;
mod session_id;

pub use node_id::NodeId;
pub use session_id::SessionId;
