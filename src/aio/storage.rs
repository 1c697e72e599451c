use std::mem;

use super::{Error, Result};

/// The largest backing allocation, in bytes, that a context or a context table may request. This
/// also keeps every context ID representable as a positive signed 32 bit value.
pub(crate) const MAX_STORAGE_BYTES: usize = i32::MAX as usize;

/// The maximum number of `T` elements that fit inside [MAX_STORAGE_BYTES].
pub(crate) fn max_count<T>() -> usize {
    match mem::size_of::<T>() {
        0 => MAX_STORAGE_BYTES,
        size => MAX_STORAGE_BYTES / size,
    }
}

/// Compute the byte size of `count` elements of `T`, failing if it can't be represented.
pub(crate) fn checked_size<T>(count: usize) -> Result<usize> {
    match count.checked_mul(mem::size_of::<T>()) {
        Some(bytes) if bytes <= MAX_STORAGE_BYTES => Ok(bytes),
        _ => Err(Error::ResourceExhausted("storage size overflows")),
    }
}

/// Grow `storage` to hold exactly `len` default initialized elements. Nothing is touched unless
/// both the size check and the allocation succeed.
pub(crate) fn try_grow<T: Default>(storage: &mut Vec<T>, len: usize) -> Result<()> {
    if storage.len() >= len {
        return Ok(());
    }

    checked_size::<T>(len)?;
    storage.try_reserve_exact(len - storage.len())?;
    storage.resize_with(len, T::default);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_size() {
        assert_eq!(checked_size::<u64>(4).unwrap(), 32);
        assert_eq!(checked_size::<u64>(0).unwrap(), 0);
        assert!(checked_size::<u64>(max_count::<u64>()).is_ok());
        assert!(matches!(
            checked_size::<u64>(max_count::<u64>() + 1),
            Err(Error::ResourceExhausted(..))
        ));
        assert!(matches!(
            checked_size::<u64>(usize::MAX),
            Err(Error::ResourceExhausted(..))
        ));
    }

    #[test]
    fn test_try_grow_never_shrinks() {
        let mut storage = vec![1u32, 2, 3];
        try_grow(&mut storage, 5).unwrap();
        assert_eq!(storage, vec![1, 2, 3, 0, 0]);

        try_grow(&mut storage, 2).unwrap();
        assert_eq!(storage, vec![1, 2, 3, 0, 0]);
    }

    #[test]
    fn test_try_grow_failure_leaves_storage_untouched() {
        // Fails the size check, the allocation failure conversion is covered in error.rs.
        let mut storage = vec![7u64; 2];
        assert!(try_grow(&mut storage, usize::MAX).is_err());
        assert_eq!(storage, vec![7, 7]);
    }
}
