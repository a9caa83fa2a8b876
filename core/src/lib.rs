pub mod error;
pub mod gsi;
pub mod presence;
pub mod server;
pub mod settings;
pub mod tracker;
pub mod watcher;

// Re-exports for convenience
pub use error::BridgeError;
pub use gsi::{NormalizedSnapshot, Snapshot, parse_snapshot};
pub use presence::{DiscordPresence, PresenceClient, PresencePayload, PresenceSync};
pub use server::IngestServer;
pub use tracker::{MatchSignal, MatchState};
pub use watcher::ProcessWatcher;
