//! Toys: small demonstration scenarios driven by the sandbox host.
//!
//! # Invariants
//! - The host drives every toy through create, any number of resets, then destroy.
//! - A reset discards the previous scene contents before repopulating.

mod host;
mod tmx_map_toy;
mod toy;

pub use host::ToyHost;
pub use tmx_map_toy::{TmxMapToy, TmxMapToyConfig};
pub use toy::{Toy, ToyContext, ToyError};

pub fn crate_info() -> &'static str {
    "sandbox-toys v0.1.0"
}
