mod state;
mod status;

pub use state::{PeerAck, SyncState};
pub use status::{PeerStatus, SyncStatus};
