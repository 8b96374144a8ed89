//! Wire protocol between the matrix host and its participants.
//!
//! Frames are `u32 LE` length, `u32 LE` message type, payload.

pub mod address;
pub mod client_host_msg;
pub mod color;
pub mod dequeue;
pub mod discover_host;
pub mod host_client_msg;
pub mod host_connection_process;
mod wire;

pub use address::Address;
pub use client_host_msg::ClientHostMsg;
pub use color::Color;
pub use dequeue::{dequeue_msg, MAX_FRAME_LEN};
pub use host_client_msg::HostClientMsg;
pub use host_connection_process::{spawn_host_connection_process, HostConnectionEvent, HostTarget};
