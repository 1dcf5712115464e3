//! Octet-wise subnet arithmetic.

use super::address::lenient_segments;

/// Check whether two addresses fall in the same network under `mask`.
///
/// The mask is applied octet by octet. Any argument with the wrong number of
/// segments makes the answer `false`.
///
/// # Examples
/// ```
/// use netlab::ip::are_in_same_subnet;
///
/// assert!(are_in_same_subnet("192.168.1.10", "192.168.1.20", "255.255.255.0"));
/// assert!(!are_in_same_subnet("192.168.1.10", "192.168.2.10", "255.255.255.0"));
/// ```
pub fn are_in_same_subnet(ip1: &str, ip2: &str, mask: &str) -> bool {
    let (Some(a), Some(b), Some(m)) = (lenient_segments(ip1), lenient_segments(ip2), lenient_segments(mask)) else {
        return false;
    };
    (0..4).all(|i| a[i] & m[i] == b[i] & m[i])
}

/// Network address of `ip` under `mask`, as a dotted quad.
///
/// Malformed input yields the zero network `0.0.0.0`.
///
/// # Examples
/// ```
/// use netlab::ip::get_subnet;
///
/// assert_eq!(get_subnet("192.168.1.100", "255.255.255.0"), "192.168.1.0");
/// assert_eq!(get_subnet("10.1.2.3", "255.0.0.0"), "10.0.0.0");
/// assert_eq!(get_subnet("10.1.2", "255.0.0.0"), "0.0.0.0");
/// ```
pub fn get_subnet(ip: &str, mask: &str) -> String {
    match (lenient_segments(ip), lenient_segments(mask)) {
        (Some(a), Some(m)) => format!("{}.{}.{}.{}", a[0] & m[0], a[1] & m[1], a[2] & m[2], a[3] & m[3]),
        _ => "0.0.0.0".to_string(),
    }
}

/// Number of leading one bits in a mask, or `None` if the mask is not contiguous.
///
/// # Examples
/// ```
/// use netlab::ip::prefix_length;
///
/// assert_eq!(prefix_length("255.255.255.0"), Some(24));
/// assert_eq!(prefix_length("255.0.255.0"), None);
/// ```
pub fn prefix_length(mask: &str) -> Option<u32> {
    let octets = super::address::parse_octets(mask)?;
    let bits = u32::from_be_bytes(octets);
    let ones = bits.leading_ones();
    if ones == 32 || bits << ones == 0 {
        Some(ones)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_subnet_masks() {
        assert_eq!(get_subnet("192.168.1.100", "255.255.255.0"), "192.168.1.0");
        assert_eq!(get_subnet("172.16.45.7", "255.255.0.0"), "172.16.0.0");
        assert_eq!(get_subnet("192.168.1.130", "255.255.255.128"), "192.168.1.128");
    }

    #[test]
    fn test_malformed_input_is_tolerated() {
        assert_eq!(get_subnet("192.168.1", "255.255.255.0"), "0.0.0.0");
        assert_eq!(get_subnet("192.168.1.1", "255.255"), "0.0.0.0");
        assert!(!are_in_same_subnet("192.168.1", "192.168.1", "255.255.255.0"));
        assert!(!are_in_same_subnet("192.168.1.1", "192.168.1.2", ""));
    }

    #[test]
    fn test_same_subnet_with_wider_mask() {
        assert!(are_in_same_subnet("10.0.1.5", "10.0.200.9", "255.255.0.0"));
        assert!(!are_in_same_subnet("10.0.1.5", "10.1.1.5", "255.255.0.0"));
    }

    #[test]
    fn test_prefix_length() {
        assert_eq!(prefix_length("255.255.255.255"), Some(32));
        assert_eq!(prefix_length("0.0.0.0"), Some(0));
        assert_eq!(prefix_length("255.255.240.0"), Some(20));
        assert_eq!(prefix_length("bogus"), None);
    }
}
