use std::fmt;
use std::io;

/// Errors reported by [`EspClient`](crate::EspClient) operations.
#[derive(Debug)]
pub enum ClientError {
    /// Every slot in the registry is assigned.
    NoSocketAvailable,
    /// `connect` was called on a client that already holds a handle.
    AlreadyAttached,
    /// The operation needs a handle and the client has none.
    NotAttached,
    /// The transport driver failed.
    Transport(io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSocketAvailable => write!(f, "no socket available"),
            Self::AlreadyAttached => write!(f, "client already holds a socket"),
            Self::NotAttached => write!(f, "client holds no socket"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ClientError {
    fn from(e: io::Error) -> Self {
        Self::Transport(e)
    }
}

impl From<ClientError> for io::Error {
    fn from(e: ClientError) -> Self {
        let kind = match e {
            ClientError::Transport(inner) => return inner,
            ClientError::NoSocketAvailable => io::ErrorKind::AddrNotAvailable,
            ClientError::AlreadyAttached => io::ErrorKind::AlreadyExists,
            ClientError::NotAttached => io::ErrorKind::NotConnected,
        };
        io::Error::new(kind, e)
    }
}
