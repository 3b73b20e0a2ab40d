//! `basalt-util`: small parsing and reporting helpers shared across the
//! basalt binaries.
//!
//! - [`parse`]: human-readable size ("64k") and duration ("5ms") values,
//!   boolean coercion
//! - [`address`]: `host:port` splitting with IPv6 bracket support
//! - [`time`]: wall-clock nanosecond timestamps
//! - [`version`]: build version reporting

pub mod address;
pub mod parse;
pub mod time;
pub mod version;
