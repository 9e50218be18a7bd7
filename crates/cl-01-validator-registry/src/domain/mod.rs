//! Domain layer for the Validator Registry subsystem
//!
//! - validator: validator records and status
//! - geography: country → state → city membership tree

mod geography;
mod validator;

pub use geography::*;
pub use validator::*;
