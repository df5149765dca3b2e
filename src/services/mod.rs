pub mod cashfree;
pub mod split;
