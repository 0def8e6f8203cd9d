//! Minimal async SMTP client for relay delivery.
//!
//! Supports exactly what the workflow engine needs: connect (plain TCP or
//! implicit TLS), EHLO, MAIL FROM / RCPT TO / DATA, and QUIT. There is no
//! STARTTLS upgrade and no authentication; halyard talks to an internal
//! relay that accepts mail from it by address.

mod error;
mod message;
mod relay;
mod response;
mod session;

pub use error::{Result, TransportError};
pub use relay::SmtpRelay;
pub use response::Response;
