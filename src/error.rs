use std::io;
use std::path::PathBuf;

/// Failure opening a database. Every other query operation is infallible by
/// design (see the crate docs) and resolves to a sentinel or `None` instead.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cannot open geoip database at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to lock geoip database at {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed geoip database header at {path}")]
    InvalidHeader { path: PathBuf },

    #[error("unrecognized geoip edition byte {raw} in database header")]
    UnknownEdition { raw: u8 },

    #[error("address family does not match this database edition")]
    UnsupportedAddress,
}
