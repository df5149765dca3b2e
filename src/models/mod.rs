pub mod rsvp;
pub mod session;

pub use rsvp::*;
pub use session::*;
