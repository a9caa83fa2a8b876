mod client;
mod payload;
mod sync;


pub use client::{ConnectionState, DiscordPresence, PresenceClient};
#[cfg(test)]
pub(crate) use client::testing;
pub use payload::{PresencePayload, build_payload, map_image_key, menu_payload};
pub use sync::PresenceSync;
