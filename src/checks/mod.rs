//! Eurocode unity checks run against solved design forces.
//!
//! These never mutate the model or a solver result; a check failure marks
//! that element's `status` as `Fail` rather than aborting the whole suite.

pub mod concrete;
pub mod steel;

/// Overall pass/fail verdict for a single element's governing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CheckStatus {
    Ok,
    Fail,
}

impl CheckStatus {
    pub fn from_unity(uc: f64) -> Self {
        if uc <= 1.0 {
            CheckStatus::Ok
        } else {
            CheckStatus::Fail
        }
    }
}
