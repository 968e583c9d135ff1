// src/transport/endpoint.rs

use crate::error::MockError;
use std::path::PathBuf;

/// A syntactically checked endpoint address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
  /// Host (name, address or `*`) and port.
  Tcp(String, u16),
  Ipc(PathBuf),
  Inproc(String),
}

impl Endpoint {
  pub fn scheme(&self) -> &'static str {
    match self {
      Endpoint::Tcp(..) => "tcp",
      Endpoint::Ipc(_) => "ipc",
      Endpoint::Inproc(_) => "inproc",
    }
  }
}

/// Parses an endpoint string into a structured Endpoint enum.
///
/// Only the shape is checked here; whether the address can actually be
/// bound or reached is left to the messaging library.
pub fn parse_endpoint(endpoint_str: &str) -> Result<Endpoint, MockError> {
  let invalid_endpoint_err = || MockError::InvalidEndpoint(endpoint_str.to_string());

  let (scheme, address_part) = endpoint_str.split_once("://").ok_or_else(invalid_endpoint_err)?;

  match scheme {
    "tcp" => {
      let (host, port) = address_part.rsplit_once(':').ok_or_else(invalid_endpoint_err)?;
      let host = host.trim_start_matches('[').trim_end_matches(']');
      if host.is_empty() {
        return Err(invalid_endpoint_err());
      }
      let port = port.parse::<u16>().map_err(|_| {
        tracing::debug!("Failed to parse TCP port: {}", port);
        invalid_endpoint_err()
      })?;
      Ok(Endpoint::Tcp(host.to_string(), port))
    }
    "ipc" | "inproc" if address_part.is_empty() || address_part.contains('\0') => Err(invalid_endpoint_err()),
    "ipc" => Ok(Endpoint::Ipc(PathBuf::from(address_part))),
    "inproc" => Ok(Endpoint::Inproc(address_part.to_string())),
    _ => Err(invalid_endpoint_err()),
  }
}
