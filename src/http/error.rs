//! Error types for the HTTP server

/// Errors reported by output operations, registration and the connection loop.
///
/// Parsing never fails with an `Error`: malformed or truncated input is reported
/// through `Option`, `bool` and flag return values so that a handler can always
/// do its best with partial data.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The connection was already closed, usually after a read timeout.
    ConnectionClosed,
    /// The transport rejected a write.
    WriteError,
    /// The listener failed while checking for a pending connection.
    AcceptError,
    /// The listener could not start listening.
    ListenError,
    /// The command table is full.
    CommandTableFull,
    /// A value could not be serialized into the JSON buffer.
    SerializeError,
    /// A request body could not be deserialized.
    DeserializeError,
    /// The request body does not fit the supplied buffer.
    BodyTooLarge,
}

impl From<crate::network::error::Error> for Error {
    fn from(err: crate::network::error::Error) -> Self {
        match err {
            crate::network::error::Error::NotOpen
            | crate::network::error::Error::ConnectionClosed => Error::ConnectionClosed,
            _ => Error::WriteError,
        }
    }
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Error::WriteError
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::ConnectionClosed => defmt::write!(f, "ConnectionClosed"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::AcceptError => defmt::write!(f, "AcceptError"),
            Error::ListenError => defmt::write!(f, "ListenError"),
            Error::CommandTableFull => defmt::write!(f, "CommandTableFull"),
            Error::SerializeError => defmt::write!(f, "SerializeError"),
            Error::DeserializeError => defmt::write!(f, "DeserializeError"),
            Error::BodyTooLarge => defmt::write!(f, "BodyTooLarge"),
        }
    }
}
