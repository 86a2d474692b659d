//! case-relay: a request/response case conversion service over TCP.
//!
//! A client sends `<mode>|<message>` on a fresh connection; the server
//! converts the message to upper case, lower case, or leaves it alone,
//! writes it back, and closes the connection.
//!
//! - `net`: literal address resolution and socket construction
//! - `protocol`: request framing, single-read request, full write
//! - `transform`: in-place ASCII case conversion
//! - `server`: accept loop with one task per connection
//! - `client`: single-shot exchange
//! - `config`: CLI + TOML configuration shared by both binaries

pub mod client;
pub mod config;
pub mod net;
pub mod protocol;
pub mod server;
pub mod transform;
