mod peers;
pub use peers::{PeerInfo, PeerTable, ReputationConfig, normalize_peer_url};

mod sync;
pub use sync::{SyncClient, SyncOutcome, verify_wire_fact};
