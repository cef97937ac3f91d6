//! Status scripts

use crate::error::{Result, SimError};
use provflow_cloud::StatusVocabulary;
use provflow_cloud::status::normalize_status;

/// Parse status names into a script for vocabulary `St`.
///
/// Unlike [`StatusVocabulary::parse`], names the vocabulary does not declare
/// are an error here: a script naming `"redy"` is a typo, not a remote
/// surprise. `"unknown"` itself is accepted.
pub fn parse_script<St, I, S>(kind: &'static str, names: I) -> Result<Vec<St>>
where
    St: StatusVocabulary,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| {
            let name = name.as_ref();
            let status = St::parse(name);
            if status == St::UNKNOWN && normalize_status(name) != St::UNKNOWN.as_str() {
                return Err(SimError::UnknownStatus {
                    kind,
                    status: name.to_string(),
                    expected: St::ALL
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
            Ok(status)
        })
        .collect()
}
