//! Shared fixtures for engine tests.

use crate::session::Session;

pub const SAMPLE_CSV: &str = "\
Name,Age,City
Alice,30,Paris
Bob,25,London
Carol,22,Paris
Dave,41,Berlin
Eve,35,Paris
";

/// A five-row session over Name/Age/City, the fixture most session tests
/// share.
pub fn sample_session() -> Session {
    let (session, report) = Session::from_csv(SAMPLE_CSV).expect("sample CSV parses");
    assert_eq!(report.rows_skipped, 0);
    session
}
