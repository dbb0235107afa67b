use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Selection criteria for packaging draft transactions into a claim.
/// All fields optional; an empty filter means "include every draft
/// transaction for the organization".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClaimFilters {
    /// Restrict to a single resident.
    pub resident_id: Option<i32>,
    /// Include transactions that occurred on or after this date.
    pub date_from: Option<NaiveDate>,
    /// Include transactions that occurred on or before this date.
    pub date_to: Option<NaiveDate>,
}

impl ClaimFilters {
    /// True when no criterion is set, i.e. the "include all" selection.
    pub fn is_unfiltered(&self) -> bool {
        self.resident_id.is_none() && self.date_from.is_none() && self.date_to.is_none()
    }
}
