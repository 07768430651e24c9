use deeplibby_model::{AvailabilityRow, UpstreamAvailabilityItem};

/// Fold live upstream counts into a row, returning the updated copy. The
/// wait follows [`UpstreamAvailabilityItem::normalized_wait_days`].
pub fn reconcile_row(
    row: &AvailabilityRow,
    fresh: &UpstreamAvailabilityItem,
) -> AvailabilityRow {
    AvailabilityRow {
        owned_count: fresh.owned_copies,
        available_count: fresh.available_copies,
        holds_count: fresh.holds_count,
        estimated_wait_days: fresh.normalized_wait_days(),
        fresh: true,
        ..row.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{library, upstream_item};

    fn stale_row(available: u32, wait: i32) -> AvailabilityRow {
        let mut row = AvailabilityRow::new(library("lapl", 12, "LAPL"))
            .with_counts(5, available, 2, wait);
        row.favorite = true;
        row.formats = vec!["ebook-overdrive".to_string()];
        row
    }

    #[test]
    fn available_copies_force_zero_wait() {
        let row = stale_row(3, 14);
        let updated = reconcile_row(&row, &upstream_item(1, 5, 3, 0, Some(14)));

        assert_eq!(updated.available_count, 3);
        assert_eq!(updated.estimated_wait_days, 0);
        assert!(updated.fresh);
        // Copy-on-write: the input row is untouched.
        assert!(!row.fresh);
        assert_eq!(row.estimated_wait_days, 14);
    }

    #[test]
    fn missing_wait_defaults_to_zero() {
        let updated =
            reconcile_row(&stale_row(0, 30), &upstream_item(1, 5, 0, 12, None));
        assert_eq!(updated.estimated_wait_days, 0);
        assert_eq!(updated.holds_count, 12);
    }

    #[test]
    fn wait_is_kept_when_nothing_is_available() {
        let updated = reconcile_row(
            &stale_row(2, 0),
            &upstream_item(1, 5, 0, 40, Some(56)),
        );
        assert_eq!(updated.available_count, 0);
        assert_eq!(updated.estimated_wait_days, 56);
    }

    #[test]
    fn annotations_and_identity_survive() {
        let row = stale_row(0, 7);
        let updated = reconcile_row(&row, &upstream_item(1, 9, 1, 0, Some(0)));
        assert!(updated.favorite);
        assert_eq!(updated.library, row.library);
        assert_eq!(updated.formats, row.formats);
        assert_eq!(updated.owned_count, 9);
    }
}
