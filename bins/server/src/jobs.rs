//! Scheduled activity report emails.
//!
//! The weekly report covers the previous Monday-to-Sunday week and goes out
//! on Monday morning; the monthly report covers the previous calendar month
//! and goes out on the 1st. Every run is recorded in `report_runs`.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use classplan_core::reports::{ReportFilter, ReportPeriod, ReportService};
use classplan_db::ReportRepository;
use classplan_db::repositories::RunStatus;
use classplan_shared::EmailService;

/// UTC hour at which scheduled reports are sent.
const RUN_HOUR: u32 = 6;

/// Which report a job sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Previous week, every Monday.
    Weekly,
    /// Previous month, every 1st.
    Monthly,
}

impl Schedule {
    /// First run strictly after `now`.
    pub fn next_run(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let at = |day: NaiveDate| {
            NaiveTime::from_hms_opt(RUN_HOUR, 0, 0).map(|time| day.and_time(time).and_utc())
        };
        let today = now.date_naive();

        let first = match self {
            Self::Weekly => {
                let ahead = (7 - today.weekday().num_days_from_monday()) % 7;
                today.checked_add_days(Days::new(u64::from(ahead)))?
            }
            Self::Monthly => today.with_day(1)?,
        };
        let candidate = at(first)?;
        if candidate > now {
            return Some(candidate);
        }

        let following = match self {
            Self::Weekly => first.checked_add_days(Days::new(7))?,
            Self::Monthly => first.checked_add_months(Months::new(1))?,
        };
        at(following)
    }

    /// Period reported on by a run happening on `today`.
    pub fn period(self, today: NaiveDate) -> Option<ReportPeriod> {
        match self {
            Self::Weekly => ReportPeriod::previous_week(today).ok(),
            Self::Monthly => ReportPeriod::previous_month(today).ok(),
        }
    }
}

/// Sends scheduled reports by email.
#[derive(Debug, Clone)]
pub struct ReportJobs {
    repo: ReportRepository,
    email: Arc<EmailService>,
    recipients: Vec<String>,
    default_rate: Decimal,
}

impl ReportJobs {
    /// Creates the job runner.
    pub const fn new(
        repo: ReportRepository,
        email: Arc<EmailService>,
        recipients: Vec<String>,
        default_rate: Decimal,
    ) -> Self {
        Self {
            repo,
            email,
            recipients,
            default_rate,
        }
    }

    /// Runs `schedule` forever in the background.
    pub fn spawn(self: Arc<Self>, schedule: Schedule) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let now = Utc::now();
                let Some(next) = schedule.next_run(now) else {
                    warn!(?schedule, "No next report run could be computed, stopping job");
                    return;
                };
                info!(?schedule, next_run = %next, "Report job scheduled");
                tokio::time::sleep((next - now).to_std().unwrap_or_default()).await;

                match self.run_once(schedule, Utc::now().date_naive()).await {
                    Ok(status) => {
                        info!(?schedule, status = status.as_str(), "Report job finished");
                    }
                    Err(e) => error!(?schedule, error = %e, "Report job failed"),
                }
            }
        })
    }

    /// Builds, sends and records one report.
    pub async fn run_once(
        &self,
        schedule: Schedule,
        today: NaiveDate,
    ) -> anyhow::Result<RunStatus> {
        let period = schedule
            .period(today)
            .ok_or_else(|| anyhow::anyhow!("no report period before {today}"))?;

        if self.recipients.is_empty() {
            self.repo
                .record_run(&period, 0, RunStatus::Skipped, None)
                .await?;
            return Ok(RunStatus::Skipped);
        }

        let filter = ReportFilter::default();
        let facts = self.repo.load_facts(&period, &filter).await?;
        let report = ReportService::summarize(period, filter, &facts, self.default_rate);
        let subject = format!("Classplan activity report: {period}");

        let (status, failure) = match self
            .email
            .send_email(&self.recipients, &subject, &ReportService::render_text(&report))
            .await
        {
            Ok(()) => (RunStatus::Sent, None),
            Err(e) => {
                warn!(period = %period, error = %e, "Report email delivery failed");
                (RunStatus::Failed, Some(e.to_string()))
            }
        };

        self.repo
            .record_run(&period, self.recipients.len(), status, failure)
            .await?;

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    // 2030-03-04 is a Monday.
    #[rstest]
    #[case(utc(2030, 3, 4, 5), utc(2030, 3, 4, 6))]
    #[case(utc(2030, 3, 4, 6), utc(2030, 3, 11, 6))]
    #[case(utc(2030, 3, 6, 12), utc(2030, 3, 11, 6))]
    #[case(utc(2030, 3, 10, 23), utc(2030, 3, 11, 6))]
    fn test_weekly_next_run(#[case] now: DateTime<Utc>, #[case] expected: DateTime<Utc>) {
        assert_eq!(Schedule::Weekly.next_run(now), Some(expected));
    }

    #[rstest]
    #[case(utc(2030, 3, 1, 5), utc(2030, 3, 1, 6))]
    #[case(utc(2030, 3, 1, 7), utc(2030, 4, 1, 6))]
    #[case(utc(2030, 12, 15, 0), utc(2031, 1, 1, 6))]
    fn test_monthly_next_run(#[case] now: DateTime<Utc>, #[case] expected: DateTime<Utc>) {
        assert_eq!(Schedule::Monthly.next_run(now), Some(expected));
    }

    #[test]
    fn test_periods_cover_the_previous_window() {
        let monday = NaiveDate::from_ymd_opt(2030, 3, 4).unwrap();
        let week = Schedule::Weekly.period(monday).unwrap();
        assert_eq!(week.start, NaiveDate::from_ymd_opt(2030, 2, 25).unwrap());
        assert_eq!(week.end, NaiveDate::from_ymd_opt(2030, 3, 3).unwrap());

        let first = NaiveDate::from_ymd_opt(2030, 3, 1).unwrap();
        let month = Schedule::Monthly.period(first).unwrap();
        assert_eq!(month.start, NaiveDate::from_ymd_opt(2030, 2, 1).unwrap());
        assert_eq!(month.end, NaiveDate::from_ymd_opt(2030, 2, 28).unwrap());
    }
}
