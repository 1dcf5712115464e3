//! Dotted-quad address parsing.
//!
//! Learners type addresses by hand, so every helper here is tolerant: a
//! half-typed address is simply "not valid" rather than an error.

use std::sync::LazyLock;

use regex::Regex;

/// Four groups of ASCII digits separated by dots. Range checks happen after the match.
static DOTTED_QUAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").expect("dotted-quad pattern is valid")
});

/// Mask assumed for interfaces that carry an IP but no explicit mask.
pub const DEFAULT_SUBNET_MASK: &str = "255.255.255.0";

/// Parse a strict dotted-quad IPv4 address into its four octets.
///
/// Returns `None` unless the input is exactly four dot-separated integers in
/// the range 0-255.
///
/// # Examples
/// ```
/// use netlab::ip::parse_octets;
///
/// assert_eq!(parse_octets("192.168.1.10"), Some([192, 168, 1, 10]));
/// assert_eq!(parse_octets("192.168.1"), None);
/// assert_eq!(parse_octets("192.168.1.256"), None);
/// ```
pub fn parse_octets(ip: &str) -> Option<[u8; 4]> {
    let captures = DOTTED_QUAD.captures(ip)?;
    let mut octets = [0u8; 4];
    for (slot, group) in octets.iter_mut().zip(captures.iter().skip(1)) {
        *slot = group?.as_str().parse::<u8>().ok()?;
    }
    Some(octets)
}

/// Check if a string is four dot-separated integers in the range 0-255
pub fn is_valid_ipv4(ip: &str) -> bool {
    parse_octets(ip).is_some()
}

/// Split an address into four numeric segments, reading anything non-numeric as 0.
///
/// Returns `None` only when the segment count is wrong. This mirrors how the
/// subnet helpers treat partial input: "192.168.x.5" still has a network part.
pub(crate) fn lenient_segments(ip: &str) -> Option<[u32; 4]> {
    let parts: Vec<&str> = ip.split('.').collect();
    if parts.len() != 4 {
        return None;
    }
    let mut segments = [0u32; 4];
    for (slot, part) in segments.iter_mut().zip(parts) {
        *slot = part.parse::<u32>().unwrap_or(0);
    }
    Some(segments)
}

/// Suggest a default gateway for a host address: the `.1` address of its /24.
///
/// Routers conventionally own the first host address of each lesson subnet.
///
/// # Examples
/// ```
/// use netlab::ip::suggest_gateway;
///
/// assert_eq!(suggest_gateway("192.168.10.25").as_deref(), Some("192.168.10.1"));
/// assert_eq!(suggest_gateway("not-an-ip"), None);
/// ```
pub fn suggest_gateway(ip: &str) -> Option<String> {
    let [a, b, c, _] = parse_octets(ip)?;
    Some(format!("{}.{}.{}.1", a, b, c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        for ip in ["0.0.0.0", "10.0.0.1", "192.168.1.10", "255.255.255.255"] {
            assert!(is_valid_ipv4(ip), "{} should be valid", ip);
        }
    }

    #[test]
    fn test_invalid_addresses() {
        for ip in [
            "",
            "192.168.1",
            "192.168.1.1.1",
            "256.1.1.1",
            "192.168.a.1",
            "+1.2.3.4",
            "1..2.3",
            "10.0.0.5 ",
            " 10.0.0.5",
            "10.0. 0.5",
        ] {
            assert!(!is_valid_ipv4(ip), "{} should be invalid", ip);
        }
    }

    #[test]
    fn test_lenient_segments() {
        assert_eq!(lenient_segments("192.168.x.5"), Some([192, 168, 0, 5]));
        assert_eq!(lenient_segments("192.168.1"), None);
        assert_eq!(lenient_segments("192.168.1. 5"), Some([192, 168, 1, 0]));
    }
}
