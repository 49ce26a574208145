//! Addresses of application entities on a network.
//!
//! An application entity address couples a network address
//! with the AE title expected at that address.
//! The textual syntax is `{ae_title}@{host}:{port}`.
//! [`AeAddr`] makes the AE title optional,
//! whereas [`FullAeAddr`] requires it.
use std::{
    net::{SocketAddr, ToSocketAddrs},
    str::FromStr,
};

use snafu::{ensure, AsErrorSource, ResultExt, Snafu};

/// An address to an application entity with a mandatory AE title.
///
/// # Example
///
/// ```
/// # use dcmnet_ul::FullAeAddr;
/// # use std::net::SocketAddr;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let addr: FullAeAddr<SocketAddr> = "STORE-SCP@127.0.0.1:11112".parse()?;
/// assert_eq!(addr.ae_title(), "STORE-SCP");
/// assert_eq!(addr.socket_addr(), &SocketAddr::from(([127, 0, 0, 1], 11112)));
/// assert_eq!(addr.to_string(), "STORE-SCP@127.0.0.1:11112");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FullAeAddr<T> {
    ae_title: String,
    socket_addr: T,
}

impl<T> FullAeAddr<T> {
    /// Create an address from an AE title and a network address.
    pub fn new(ae_title: impl Into<String>, socket_addr: T) -> Self {
        FullAeAddr {
            ae_title: ae_title.into(),
            socket_addr,
        }
    }

    pub fn ae_title(&self) -> &str {
        &self.ae_title
    }

    pub fn socket_addr(&self) -> &T {
        &self.socket_addr
    }

    pub fn into_parts(self) -> (String, T) {
        (self.ae_title, self.socket_addr)
    }
}

/// An error which occurred when parsing an address
/// with a mandatory AE title.
#[derive(Debug, Clone, Eq, PartialEq, Snafu)]
pub enum ParseAeAddressError<E>
where
    E: std::fmt::Debug + AsErrorSource,
{
    /// AE title is missing from the address
    MissingAeTitle,

    /// Could not parse the network address
    ParseSocketAddress { source: E },
}

impl<T> FromStr for FullAeAddr<T>
where
    T: FromStr,
    T::Err: std::fmt::Debug + AsErrorSource,
{
    type Err = ParseAeAddressError<T::Err>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ae_title, address) = s.split_once('@').ok_or(ParseAeAddressError::MissingAeTitle)?;
        ensure!(!ae_title.is_empty(), MissingAeTitleSnafu);
        Ok(FullAeAddr {
            ae_title: ae_title.to_string(),
            socket_addr: address.parse().context(ParseSocketAddressSnafu)?,
        })
    }
}

impl<T> ToSocketAddrs for FullAeAddr<T>
where
    T: ToSocketAddrs,
{
    type Iter = T::Iter;

    fn to_socket_addrs(&self) -> std::io::Result<Self::Iter> {
        self.socket_addr.to_socket_addrs()
    }
}

impl<T> std::fmt::Display for FullAeAddr<T>
where
    T: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.ae_title, self.socket_addr)
    }
}

/// An address to an application entity
/// in which the AE title may be absent.
///
/// An empty AE title before the `@` is the same as no AE title.
///
/// # Example
///
/// ```
/// # use dcmnet_ul::AeAddr;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let addr: AeAddr<String> = "PACS@pacs.example.com:104".parse()?;
/// assert_eq!(addr.ae_title(), Some("PACS"));
/// assert_eq!(addr.socket_addr(), "pacs.example.com:104");
///
/// let addr: AeAddr<String> = "10.0.0.5:104".parse()?;
/// assert_eq!(addr.ae_title(), None);
/// let addr = addr.with_default_ae_title("ANY-SCP");
/// assert_eq!(addr.to_string(), "ANY-SCP@10.0.0.5:104");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AeAddr<T> {
    ae_title: Option<String>,
    socket_addr: T,
}

impl<T> AeAddr<T> {
    /// Create an address with an AE title.
    pub fn new(ae_title: impl Into<String>, socket_addr: T) -> Self {
        AeAddr {
            ae_title: Some(ae_title.into()),
            socket_addr,
        }
    }

    /// Create an address without an AE title.
    pub fn new_socket_addr(socket_addr: T) -> Self {
        AeAddr {
            ae_title: None,
            socket_addr,
        }
    }

    pub fn ae_title(&self) -> Option<&str> {
        self.ae_title.as_deref()
    }

    pub fn socket_addr(&self) -> &T {
        &self.socket_addr
    }

    /// Turn this into a full address,
    /// using the given AE title only if none is present.
    pub fn with_default_ae_title(self, ae_title: impl Into<String>) -> FullAeAddr<T> {
        FullAeAddr {
            ae_title: self.ae_title.unwrap_or_else(|| ae_title.into()),
            socket_addr: self.socket_addr,
        }
    }

    pub fn into_parts(self) -> (Option<String>, T) {
        (self.ae_title, self.socket_addr)
    }
}

impl From<SocketAddr> for AeAddr<SocketAddr> {
    fn from(socket_addr: SocketAddr) -> Self {
        AeAddr::new_socket_addr(socket_addr)
    }
}

impl<T> From<FullAeAddr<T>> for AeAddr<T> {
    fn from(full: FullAeAddr<T>) -> Self {
        AeAddr {
            ae_title: Some(full.ae_title),
            socket_addr: full.socket_addr,
        }
    }
}

impl<T> FromStr for AeAddr<T>
where
    T: FromStr,
{
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('@') {
            Some((ae_title, address)) => Ok(AeAddr {
                ae_title: Some(ae_title)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
                socket_addr: address.parse()?,
            }),
            None => Ok(AeAddr::new_socket_addr(s.parse()?)),
        }
    }
}

impl<T> ToSocketAddrs for AeAddr<T>
where
    T: ToSocketAddrs,
{
    type Iter = T::Iter;

    fn to_socket_addrs(&self) -> std::io::Result<Self::Iter> {
        self.socket_addr.to_socket_addrs()
    }
}

impl<T> std::fmt::Display for AeAddr<T>
where
    T: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.ae_title {
            Some(ae_title) => write!(f, "{}@{}", ae_title, self.socket_addr),
            None => std::fmt::Display::fmt(&self.socket_addr, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddrV4;

    #[test]
    fn parse_full_address() {
        let addr: FullAeAddr<SocketAddrV4> = "MODALITY1@10.0.0.11:104".parse().unwrap();
        assert_eq!(addr.ae_title(), "MODALITY1");
        assert_eq!(
            addr.socket_addr(),
            &SocketAddrV4::new([10, 0, 0, 11].into(), 104)
        );

        let res = FullAeAddr::<String>::from_str("pacs.example.com:104");
        assert!(matches!(res, Err(ParseAeAddressError::MissingAeTitle)));
        let res = FullAeAddr::<String>::from_str("@pacs.example.com:104");
        assert!(matches!(res, Err(ParseAeAddressError::MissingAeTitle)));
        let res = FullAeAddr::<SocketAddr>::from_str("SCP@not an address");
        assert!(matches!(
            res,
            Err(ParseAeAddressError::ParseSocketAddress { .. })
        ));
    }

    #[test]
    fn parse_optional_ae_title() {
        let addr: AeAddr<String> = "@pacs.example.com:104".parse().unwrap();
        assert_eq!(addr.ae_title(), None);
        assert_eq!(addr.socket_addr(), "pacs.example.com:104");

        // only the first `@` separates the AE title
        let addr: AeAddr<String> = "A@B@pacs.example.com:104".parse().unwrap();
        assert_eq!(addr.ae_title(), Some("A"));
        assert_eq!(addr.socket_addr(), "B@pacs.example.com:104");
    }

    #[test]
    fn default_ae_title_does_not_override() {
        let addr: AeAddr<String> = "STORE@localhost:11112".parse().unwrap();
        let full = addr.with_default_ae_title("ANY-SCP");
        assert_eq!(full.ae_title(), "STORE");
        assert_eq!(full.into_parts(), ("STORE".to_string(), "localhost:11112".to_string()));
    }
}
