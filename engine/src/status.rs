//! Reading-status rules.
//!
//! These are the domain invariants the remote store does not enforce:
//!
//! 1. At most [`MAX_READING`] entries are `reading` at once.
//! 2. `wishlist` implies not owned.
//! 3. Only `finished` entries carry a rating.
//! 4. `finished` implies `finished_at` is set.
//! 5. Entering `reading` stamps `started_at` if it is missing.
//! 6. Toggling ownership moves `wishlist <-> owned`.
//!
//! Each rule is a pure function producing an [`EntryPatch`]; the engine
//! applies and persists the patch as one unit. Dates are never cleared when an
//! entry leaves `reading` or `finished`.

use crate::{error::Violation, EntryPatch, LibraryEntry, ReadingStatus};
use chrono::NaiveDate;

/// Maximum number of entries that may be `reading` simultaneously.
pub const MAX_READING: usize = 2;

/// Check invariant 1 for moving `entry_id` (or a new entry, if `None`) into
/// `new_status`.
pub fn check_reading_capacity<'a>(
    entries: impl IntoIterator<Item = &'a LibraryEntry>,
    entry_id: Option<&str>,
    new_status: ReadingStatus,
) -> Result<(), Violation> {
    if new_status != ReadingStatus::Reading {
        return Ok(());
    }

    let others_reading = entries
        .into_iter()
        .filter(|e| e.is_reading() && Some(e.id.as_str()) != entry_id)
        .count();

    if others_reading >= MAX_READING {
        Err(Violation::TooManyReading { limit: MAX_READING })
    } else {
        Ok(())
    }
}

/// The patch for moving `entry` to `new_status` on `today`.
///
/// Capacity (invariant 1) is checked separately because it depends on the
/// other entries.
pub fn status_change(entry: &LibraryEntry, new_status: ReadingStatus, today: NaiveDate) -> EntryPatch {
    let mut patch = EntryPatch {
        status: Some(new_status),
        ..EntryPatch::default()
    };

    if new_status == ReadingStatus::Wishlist {
        patch.owned = Some(false);
    }

    if new_status == ReadingStatus::Finished && entry.finished_at.is_none() {
        patch.finished_at = Some(Some(today));
    }

    if new_status == ReadingStatus::Reading
        && entry.status != ReadingStatus::Reading
        && entry.started_at.is_none()
    {
        patch.started_at = Some(Some(today));
    }

    if new_status != ReadingStatus::Finished && entry.rating.is_some() {
        patch.rating = Some(None);
    }

    patch
}

/// The patch flipping `owned`, with the status follow-up of invariant 6.
///
/// Both fields are always present so they are committed together.
pub fn ownership_toggle(entry: &LibraryEntry) -> EntryPatch {
    let owned = !entry.owned;
    let status = match (owned, entry.status) {
        (true, ReadingStatus::Wishlist) => ReadingStatus::Owned,
        (false, ReadingStatus::Owned) => ReadingStatus::Wishlist,
        (_, other) => other,
    };

    EntryPatch {
        status: Some(status),
        owned: Some(owned),
        ..EntryPatch::default()
    }
}

/// Date stamps for a create or form edit landing on `new_status`.
///
/// Returns `(started_at, finished_at)` patch values. `existing` is `None` for
/// a new entry. Existing dates are kept; nothing is ever cleared.
#[allow(clippy::type_complexity)]
pub fn edit_stamps(
    existing: Option<&LibraryEntry>,
    new_status: ReadingStatus,
    today: NaiveDate,
) -> (Option<Option<NaiveDate>>, Option<Option<NaiveDate>>) {
    let started_missing = existing.map_or(true, |e| e.started_at.is_none());
    let finished_missing = existing.map_or(true, |e| e.finished_at.is_none());

    let started_at = (new_status == ReadingStatus::Reading && started_missing).then_some(Some(today));
    let finished_at =
        (new_status == ReadingStatus::Finished && finished_missing).then_some(Some(today));

    (started_at, finished_at)
}

/// Check that `entry` satisfies the per-entry invariants (2 to 4).
pub fn entry_is_consistent(entry: &LibraryEntry) -> bool {
    let wishlist_ok = entry.status != ReadingStatus::Wishlist || !entry.owned;
    let rating_ok = entry.rating.is_none() || entry.status == ReadingStatus::Finished;
    let finished_ok = entry.status != ReadingStatus::Finished || entry.finished_at.is_some();
    wishlist_ok && rating_ok && finished_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rating;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn entry(id: &str, status: ReadingStatus) -> LibraryEntry {
        LibraryEntry::new(id, format!("book-{id}"), status)
    }

    #[test]
    fn third_reader_is_rejected() {
        let entries = vec![
            entry("a", ReadingStatus::Reading),
            entry("b", ReadingStatus::Reading),
            entry("c", ReadingStatus::Owned),
        ];

        assert_eq!(
            check_reading_capacity(&entries, Some("c"), ReadingStatus::Reading),
            Err(Violation::TooManyReading { limit: 2 })
        );
        assert_eq!(
            check_reading_capacity(&entries, None, ReadingStatus::Reading),
            Err(Violation::TooManyReading { limit: 2 })
        );
        // An entry already reading does not count against itself.
        assert!(check_reading_capacity(&entries, Some("a"), ReadingStatus::Reading).is_ok());
        assert!(check_reading_capacity(&entries, Some("c"), ReadingStatus::Paused).is_ok());
    }

    #[test]
    fn wishlist_clears_owned() {
        let mut e = entry("a", ReadingStatus::Owned);
        e.owned = true;
        let patch = status_change(&e, ReadingStatus::Wishlist, today());
        assert_eq!(patch.owned, Some(false));
    }

    #[test]
    fn finishing_stamps_once() {
        let e = entry("a", ReadingStatus::Reading);
        let patch = status_change(&e, ReadingStatus::Finished, today());
        assert_eq!(patch.finished_at, Some(Some(today())));

        let mut done = e.clone();
        done.finished_at = NaiveDate::from_ymd_opt(2024, 12, 31);
        let patch = status_change(&done, ReadingStatus::Finished, today());
        assert_eq!(patch.finished_at, None);
    }

    #[test]
    fn entering_reading_stamps_start() {
        let e = entry("a", ReadingStatus::Owned);
        let patch = status_change(&e, ReadingStatus::Reading, today());
        assert_eq!(patch.started_at, Some(Some(today())));

        // Re-selecting the current status is not "newly entered".
        let already = entry("b", ReadingStatus::Reading);
        let patch = status_change(&already, ReadingStatus::Reading, today());
        assert_eq!(patch.started_at, None);
    }

    #[test]
    fn leaving_finished_drops_rating_keeps_dates() {
        let mut e = entry("a", ReadingStatus::Finished);
        e.rating = Some(Rating::try_from(5_i64).unwrap());
        e.finished_at = Some(today());

        let patch = status_change(&e, ReadingStatus::Paused, today());
        assert_eq!(patch.rating, Some(None));
        assert_eq!(patch.finished_at, None);
    }

    #[test]
    fn toggle_follows_ownership() {
        let wish = entry("a", ReadingStatus::Wishlist);
        let patch = ownership_toggle(&wish);
        assert_eq!(patch.owned, Some(true));
        assert_eq!(patch.status, Some(ReadingStatus::Owned));

        let mut owned = entry("b", ReadingStatus::Owned);
        owned.owned = true;
        let patch = ownership_toggle(&owned);
        assert_eq!(patch.owned, Some(false));
        assert_eq!(patch.status, Some(ReadingStatus::Wishlist));

        let mut reading = entry("c", ReadingStatus::Reading);
        reading.owned = true;
        let patch = ownership_toggle(&reading);
        assert_eq!(patch.owned, Some(false));
        assert_eq!(patch.status, Some(ReadingStatus::Reading));
    }

    #[test]
    fn edit_stamps_never_clear() {
        assert_eq!(
            edit_stamps(None, ReadingStatus::Reading, today()),
            (Some(Some(today())), None)
        );
        assert_eq!(
            edit_stamps(None, ReadingStatus::Finished, today()),
            (None, Some(Some(today())))
        );

        let mut e = entry("a", ReadingStatus::Reading);
        e.started_at = NaiveDate::from_ymd_opt(2025, 1, 1);
        assert_eq!(edit_stamps(Some(&e), ReadingStatus::Reading, today()), (None, None));
        assert_eq!(edit_stamps(Some(&e), ReadingStatus::Abandoned, today()), (None, None));
    }

    #[test]
    fn consistency_check() {
        let mut e = entry("a", ReadingStatus::Wishlist);
        assert!(entry_is_consistent(&e));
        e.owned = true;
        assert!(!entry_is_consistent(&e));

        let mut f = entry("b", ReadingStatus::Finished);
        assert!(!entry_is_consistent(&f));
        f.finished_at = Some(today());
        assert!(entry_is_consistent(&f));
    }
}
