use core::result;
use nix::errno::Errno;
use thiserror::Error;

/// A helper type for wrapping a [result::Result] such that we can reduce noise in our signatures.
pub type Result<T> = result::Result<T, Error>;

/// An error representing a failure managing an AIO context or a process context table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("out of resources: {0}")]
    ResourceExhausted(&'static str),
    #[error("invalid AIO context handle: {0}")]
    InvalidHandle(u32),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("no free completion event slots ({capacity} in use)")]
    EventsExhausted { capacity: u32 },
}

impl Error {
    /// The errno a syscall dispatcher should hand back to user space for this error.
    pub fn errno(&self) -> Errno {
        match self {
            Error::ResourceExhausted(..) => Errno::ENOMEM,
            Error::InvalidHandle(..) | Error::InvalidArgument(..) => Errno::EINVAL,
            Error::EventsExhausted { .. } => Errno::EAGAIN,
        }
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::ResourceExhausted("allocation failed")
    }
}

impl From<Error> for Errno {
    fn from(value: Error) -> Self {
        value.errno()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(Error::ResourceExhausted("x").errno(), Errno::ENOMEM);
        assert_eq!(Error::InvalidHandle(7).errno(), Errno::EINVAL);
        assert_eq!(Error::InvalidArgument("x").errno(), Errno::EINVAL);
        assert_eq!(
            Errno::from(Error::EventsExhausted { capacity: 4 }),
            Errno::EAGAIN
        );
    }

    #[test]
    fn test_allocation_failure() {
        let mut storage: Vec<u64> = vec![1, 2];
        let err = storage.try_reserve_exact(usize::MAX).unwrap_err();

        assert_eq!(
            Error::from(err),
            Error::ResourceExhausted("allocation failed")
        );
        assert_eq!(storage, vec![1, 2]);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Error::InvalidHandle(3).to_string(),
            "invalid AIO context handle: 3"
        );
    }
}
