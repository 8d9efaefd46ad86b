//! Free-capacity estimate for the authenticated account.

use drive::Client;

use crate::error::{Error, Result};
use crate::types::Budget;

/// `total - Σ sizes`, never clamped at zero.
///
/// Saturates at the `i64` range instead of overflowing.
pub fn remaining_capacity(total: u64, sizes: impl IntoIterator<Item = u64>) -> i64 {
    let used: i128 = sizes.into_iter().map(i128::from).sum();
    let remaining = i128::from(total) - used;
    i64::try_from(remaining).unwrap_or(if remaining < 0 { i64::MIN } else { i64::MAX })
}

/// List every file the principal owns and subtract their sizes from `total`.
///
/// The listing follows every page; a partial listing would understate usage.
pub fn estimate_capacity(client: &Client, total: u64) -> Result<Budget> {
    let owned = client
        .owned_files()
        .map_err(|e| Error::listing("owned files", e))?;

    let remaining = remaining_capacity(total, owned.iter().map(|f| f.size));
    log::info!(
        "{} owned files, {} of {} bytes free",
        owned.len(),
        remaining,
        total
    );
    Ok(Budget::new(remaining))
}

#[cfg(test)]
mod tests {
    use super::*;
    use drive::DriveFile;
    use drive::backend::memory::{Fault, MemoryBackend, Operation};
    use std::sync::Arc;

    #[test]
    fn test_remaining_capacity() {
        assert_eq!(remaining_capacity(100, Vec::new()), 100);
        assert_eq!(remaining_capacity(100, [10, 20, 30]), 40);
        assert_eq!(remaining_capacity(100, [60, 60]), -20);
        assert_eq!(remaining_capacity(u64::MAX, Vec::new()), i64::MAX);
        assert_eq!(remaining_capacity(0, [u64::MAX, u64::MAX]), i64::MIN);
    }

    #[test]
    fn test_estimate_reads_every_page() {
        let files = (0..25).map(|i| DriveFile::new(format!("f{i}"), format!("n{i:02}"), 4));
        let client = Client::with_backend(Box::new(MemoryBackend::with_files(files)))
            .with_page_size(10);

        let budget = estimate_capacity(&client, 1_000).unwrap();
        assert_eq!(budget.remaining(), 1_000 - 25 * 4);
    }

    #[test]
    fn test_estimate_can_be_negative() {
        let client = Client::with_backend(Box::new(MemoryBackend::with_files([
            DriveFile::new("a", "a", 70),
            DriveFile::new("b", "b", 70),
        ])));

        let budget = estimate_capacity(&client, 100).unwrap();
        assert_eq!(budget.remaining(), -40);
        assert!(!budget.fits(1));
    }

    #[test]
    fn test_listing_failure_is_fatal() {
        let store = Arc::new(MemoryBackend::new());
        store.fail(Operation::List, "'me' in owners", Fault::Network, 1);
        let client = Client::with_backend(Box::new(store));

        let err = estimate_capacity(&client, 100).unwrap_err();
        assert!(matches!(err, Error::Listing { .. }));
        assert!(err.to_string().contains("owned files"));
    }
}
