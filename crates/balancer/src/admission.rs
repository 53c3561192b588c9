//! # Source-address admission
//!
//! Every request is classified before it may reach a worker. Requests whose
//! source falls inside the blocked `/16` prefix are dismissed and logged; all
//! other well-formed addresses are admitted.
//!
//! ## Invariants
//! - A blocked request never reaches a worker.
//! - Classification is pure: it depends only on the request's source and the
//!   configured prefix.

use crate::{Error, Request, Result};
use core::{fmt, str::FromStr};
use std::net::Ipv4Addr;

/// Outcome of classifying a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// The request may be dispatched to a worker.
    Admitted,
    /// The request's source lies in the blocked range and is dismissed.
    Blocked,
}

/// The first two octets of a blocked network range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockedPrefix([u8; 2]);

impl BlockedPrefix {
    pub const fn new(first: u8, second: u8) -> Self {
        Self([first, second])
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let [a, b, _, _] = addr.octets();
        [a, b] == self.0
    }
}

impl Default for BlockedPrefix {
    /// `200.145.x.x`
    fn default() -> Self {
        Self::new(200, 145)
    }
}

impl fmt::Display for BlockedPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0[0], self.0[1])
    }
}

/// Error returned when a prefix is not of the form `a.b`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("expected a two-octet prefix like `200.145`, got `{0}`")]
pub struct ParsePrefixError(String);

impl FromStr for BlockedPrefix {
    type Err = ParsePrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParsePrefixError(s.to_owned());
        let (first, second) = s.trim().split_once('.').ok_or_else(err)?;
        let first = first.parse::<u8>().map_err(|_| err())?;
        let second = second.parse::<u8>().map_err(|_| err())?;
        Ok(Self::new(first, second))
    }
}

/// Classifies requests against a [`BlockedPrefix`].
#[derive(Clone, Copy, Debug, Default)]
pub struct AdmissionFilter {
    blocked: BlockedPrefix,
}

impl AdmissionFilter {
    pub const fn new(blocked: BlockedPrefix) -> Self {
        Self { blocked }
    }

    pub const fn blocked(&self) -> BlockedPrefix {
        self.blocked
    }

    /// Parses the request's source address and decides whether it is admitted.
    ///
    /// # Example
    /// ```
    /// use balancer::{Admission, AdmissionFilter, Request};
    ///
    /// let filter = AdmissionFilter::default();
    /// let blocked = Request::new("200.145.3.4", 10);
    /// let allowed = Request::new("200.146.3.4", 10);
    ///
    /// assert_eq!(filter.classify(&blocked).unwrap(), Admission::Blocked);
    /// assert_eq!(filter.classify(&allowed).unwrap(), Admission::Admitted);
    /// assert!(filter.classify(&Request::new("200.145.x.4", 10)).is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the source is not four
    /// dot-separated decimal octets, each in `0..=255`. Leading zeros are
    /// accepted, so `200.145.007.1` is `200.145.7.1`.
    pub fn classify(&self, request: &Request) -> Result<Admission> {
        let addr = parse_octets(request.source()).ok_or_else(|| Error::InvalidAddress {
            address: request.source().to_owned(),
        })?;

        if self.blocked.contains(addr) {
            Ok(Admission::Blocked)
        } else {
            Ok(Admission::Admitted)
        }
    }
}

fn parse_octets(source: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut parts = source.split('.');
    for octet in &mut octets {
        let part = parts.next()?;
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = part.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(Ipv4Addr::from(octets))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(source: &str) -> Result<Admission> {
        AdmissionFilter::default().classify(&Request::new(source, 1))
    }

    #[test]
    fn blocks_whole_prefix() {
        for source in [
            "200.145.0.0",
            "200.145.17.99",
            "200.145.255.255",
            "200.145.007.1",
            "200.145.1.01",
        ] {
            assert_eq!(classify(source).unwrap(), Admission::Blocked, "{source}");
        }
    }

    #[test]
    fn admits_neighbouring_ranges() {
        for source in [
            "200.144.1.1",
            "200.146.1.1",
            "201.145.1.1",
            "145.200.1.1",
            "010.0.0.1",
        ] {
            assert_eq!(classify(source).unwrap(), Admission::Admitted, "{source}");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for source in [
            "",
            "200.145",
            "200.145.1",
            "1.2.3.4.5",
            "a.b.c.d",
            "256.1.1.1",
            "200.145..1",
            "200.145.+1.1",
            "200.145.1.1 ",
            "200.145.0256.1",
        ] {
            match classify(source) {
                Err(Error::InvalidAddress { address, .. }) => assert_eq!(address, source),
                other => panic!("expected InvalidAddress for {source:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn custom_prefix() {
        let filter = AdmissionFilter::new("10.0".parse().unwrap());
        assert_eq!(
            filter.classify(&Request::new("10.0.3.3", 1)).unwrap(),
            Admission::Blocked
        );
        assert_eq!(
            filter.classify(&Request::new("200.145.3.3", 1)).unwrap(),
            Admission::Admitted
        );
    }

    #[test]
    fn prefix_parsing() {
        assert_eq!("200.145".parse(), Ok(BlockedPrefix::default()));
        assert_eq!(BlockedPrefix::default().to_string(), "200.145");
        assert_eq!(
            "200".parse::<BlockedPrefix>().unwrap_err().to_string(),
            "expected a two-octet prefix like `200.145`, got `200`"
        );
        assert!("200.300".parse::<BlockedPrefix>().is_err());
        assert!("200.145.1".parse::<BlockedPrefix>().is_err());
    }
}
