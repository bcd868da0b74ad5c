//! Batch sizing for parameter-limited backends.
//!
//! A statement binding more parameters than the backend allows is rejected
//! outright, so bulk writes are split into batches that always fit.

/// SQLite's default `SQLITE_MAX_VARIABLE_NUMBER` before 3.32.
pub const SQLITE_VARIABLE_LIMIT: usize = 999;

/// Number of records that fit in one statement when each record binds
/// `fields` parameters, keeping one parameter per record in reserve.
///
/// With no known `parameter_limit` everything goes in one batch. A result of
/// zero means not even a single record fits.
///
/// ```
/// use kodak_catalog::calc_batch_size;
/// assert_eq!(calc_batch_size(Some(999), 7, 10_000), 124);
/// assert_eq!(calc_batch_size(None, 7, 10_000), 10_000);
/// ```
pub fn calc_batch_size(parameter_limit: Option<usize>, fields: usize, records: usize) -> usize {
    match parameter_limit {
        Some(limit) => limit / (fields + 1),
        None => records.max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some(999), 1, 499)]
    #[case(Some(999), 2, 333)]
    #[case(Some(999), 6, 142)]
    #[case(Some(999), 7, 124)]
    #[case(Some(16), 7, 2)]
    #[case(Some(7), 7, 0)]
    #[case(None, 7, 50)]
    fn test_calc_batch_size(#[case] limit: Option<usize>, #[case] fields: usize, #[case] expected: usize) {
        assert_eq!(calc_batch_size(limit, fields, 50), expected);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(7)]
    #[case(12)]
    fn test_batches_fit_the_limit(#[case] fields: usize) {
        let batch = calc_batch_size(Some(SQLITE_VARIABLE_LIMIT), fields, 100_000);
        assert!(batch * (fields + 1) <= SQLITE_VARIABLE_LIMIT);
        assert!((batch + 1) * (fields + 1) > SQLITE_VARIABLE_LIMIT);
    }

    #[test]
    fn test_no_limit_with_no_records() {
        assert_eq!(calc_batch_size(None, 7, 0), 1);
    }
}
