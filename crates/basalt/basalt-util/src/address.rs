//! Splitting of `host:port` endpoint strings.
//!
//! IPv6 hosts are bracketed (`[::1]:4040`) and may carry a scope id
//! (`[fe80::1%eth0]`), which is dropped from the returned host. The port
//! is optional and returned as written; IPv4 and bare hostnames are
//! indistinguishable here, so the result only carries a version *hint*.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub host: String,
    /// Port text after the last `:`; empty when the address has none.
    pub port: String,
    /// 6 for bracketed hosts, 4 otherwise.
    pub ip_version_hint: u8,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("no address value")]
    Empty,

    #[error("host address invalid: {0}")]
    InvalidHost(String),

    #[error("port invalid: {0}")]
    InvalidPort(String),
}

/// Splits an endpoint string into host, port and an IP version hint.
///
/// # Example
/// ```
/// use basalt_util::address::split_address;
/// let addr = split_address("[fe80::1%eth0]:4040").unwrap();
/// assert_eq!(addr.host, "fe80::1");
/// assert_eq!(addr.port, "4040");
/// assert_eq!(addr.ip_version_hint, 6);
/// ```
pub fn split_address(address: &str) -> Result<ParsedAddress, AddressError> {
    if address.is_empty() {
        return Err(AddressError::Empty);
    }

    // Last occurrence of each marker decides the split.
    let mut colon = None;
    let mut l_brace = None;
    let mut r_brace = None;
    let mut percent = None;
    for (i, b) in address.bytes().enumerate() {
        match b {
            b':' => colon = Some(i),
            b'[' => l_brace = Some(i),
            b']' => r_brace = Some(i),
            b'%' => percent = Some(i),
            _ => {}
        }
    }

    let ip_version_hint = if l_brace.is_some() || r_brace.is_some() {
        match (l_brace, r_brace) {
            (Some(l), Some(r)) if l < r => 6,
            _ => return Err(AddressError::InvalidHost(address.to_string())),
        }
    } else {
        4
    };

    // A colon past the closing bracket (or any colon, for unbracketed
    // hosts) introduces the port.
    let port_colon = colon.filter(|&c| r_brace.map_or(true, |r| c > r));
    let port = match port_colon {
        Some(c) => {
            let text = &address[c + 1..];
            if text.is_empty() {
                return Err(AddressError::InvalidPort(address.to_string()));
            }
            text.to_string()
        }
        None => String::new(),
    };

    let host = if ip_version_hint == 6 {
        let start = l_brace.unwrap() + 1;
        // A scope id inside the brackets is not part of the host.
        let end = match percent {
            Some(p) if start <= p && p < r_brace.unwrap() => p,
            _ => r_brace.unwrap(),
        };
        &address[start..end]
    } else {
        &address[..port_colon.unwrap_or(address.len())]
    };

    Ok(ParsedAddress {
        host: host.to_string(),
        port,
        ip_version_hint,
    })
}
