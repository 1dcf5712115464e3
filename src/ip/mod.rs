//! IPv4 address helpers.
//!
//! Validation and subnet arithmetic over the dotted-quad strings that
//! interfaces carry. None of these functions fail: malformed input maps to
//! "invalid", "not in the same subnet" or the zero network.

pub mod address;
pub mod subnet;

// Re-export commonly used functions
pub use address::{is_valid_ipv4, parse_octets, suggest_gateway, DEFAULT_SUBNET_MASK};
pub use subnet::{are_in_same_subnet, get_subnet, prefix_length};
