//! Socket failure categories and close reasons.

use std::{fmt, io};

use thiserror::Error;

/// Terminal socket outcome for one connection.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum SocketError {
    /// The remote side closed or reset the connection.
    #[error("remote host closed the connection")]
    HostClosed,
    /// The remote side refused the connection attempt.
    #[error("connection refused")]
    ConnectionRefused,
    /// The network or host could not be reached.
    #[error("network unreachable")]
    NetworkUnreachable,
    /// The socket timed out.
    #[error("socket operation timed out")]
    Timeout,
    /// Any other socket failure.
    #[error("unidentified socket error")]
    Unidentified,
}

impl SocketError {
    /// Classify an I/O error kind.
    ///
    /// ```
    /// use std::io::ErrorKind;
    ///
    /// use scorewire::connection::SocketError;
    ///
    /// assert_eq!(SocketError::from_kind(ErrorKind::ConnectionReset), SocketError::HostClosed);
    /// assert_eq!(SocketError::from_kind(ErrorKind::TimedOut), SocketError::Timeout);
    /// ```
    #[must_use]
    pub fn from_kind(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::HostClosed,
            io::ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            io::ErrorKind::NetworkUnreachable | io::ErrorKind::HostUnreachable => {
                Self::NetworkUnreachable
            }
            io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::Unidentified,
        }
    }
}

impl From<&io::Error> for SocketError {
    fn from(value: &io::Error) -> Self { Self::from_kind(value.kind()) }
}

impl From<io::Error> for SocketError {
    fn from(value: io::Error) -> Self { Self::from_kind(value.kind()) }
}

/// Why a connection left the `Active` state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    /// Graceful shutdown requested by the pool or server.
    Local,
    /// The socket failed or the peer went away.
    Socket(SocketError),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local shutdown"),
            Self::Socket(err) => err.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(io::ErrorKind::UnexpectedEof, SocketError::HostClosed)]
    #[case(io::ErrorKind::BrokenPipe, SocketError::HostClosed)]
    #[case(io::ErrorKind::ConnectionAborted, SocketError::HostClosed)]
    #[case(io::ErrorKind::ConnectionRefused, SocketError::ConnectionRefused)]
    #[case(io::ErrorKind::NetworkUnreachable, SocketError::NetworkUnreachable)]
    #[case(io::ErrorKind::HostUnreachable, SocketError::NetworkUnreachable)]
    #[case(io::ErrorKind::TimedOut, SocketError::Timeout)]
    #[case(io::ErrorKind::PermissionDenied, SocketError::Unidentified)]
    fn classifies_io_errors(#[case] kind: io::ErrorKind, #[case] expected: SocketError) {
        assert_eq!(SocketError::from(io::Error::from(kind)), expected);
    }

    #[test]
    fn close_reason_displays_socket_error() {
        assert_eq!(CloseReason::Local.to_string(), "local shutdown");
        assert_eq!(
            CloseReason::Socket(SocketError::Timeout).to_string(),
            "socket operation timed out"
        );
    }
}
