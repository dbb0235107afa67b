use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Organization-level automation settings, supplied explicitly to the run
/// scheduler on every invocation. Never read from ambient process state so
/// tests can pin arbitrary configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Timezone in which run dates and the run-time gate are evaluated.
    pub timezone: Tz,
    /// Wall-clock time of day (in `timezone`) at which the daily cycle fires.
    pub run_time: NaiveTime,
    /// Recipients for run completion and failure reports.
    pub notify_emails: Vec<String>,
}

impl AutomationConfig {
    /// The calendar date at `instant` as seen in the configured timezone.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    /// The wall-clock time at `instant` in the configured timezone.
    pub fn local_time(&self, instant: DateTime<Utc>) -> NaiveTime {
        instant.with_timezone(&self.timezone).time()
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Australia::Sydney,
            run_time: NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
            notify_emails: Vec::new(),
        }
    }
}
