use chrono::{Local, NaiveDate};
use log::{info, warn};
use std::sync::{Mutex, MutexGuard};

use crate::errors::UsageLimitReached;
use crate::models::{UsageKind, UsageStatus};

/// Daily caps; zero disables the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageLimits {
    pub daily_searches: u32,
    pub daily_transcripts: u32,
}

struct UsageDay {
    date: NaiveDate,
    searches: u32,
    transcripts: u32,
}

impl UsageDay {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            searches: 0,
            transcripts: 0,
        }
    }

    fn count(&self, kind: UsageKind) -> u32 {
        match kind {
            UsageKind::Search => self.searches,
            UsageKind::Transcript => self.transcripts,
        }
    }

    fn bump(&mut self, kind: UsageKind) {
        match kind {
            UsageKind::Search => self.searches += 1,
            UsageKind::Transcript => self.transcripts += 1,
        }
    }
}

/// Counts provider searches and transcript fetches per local calendar day.
/// Counters start over on the first use after the date changes.
pub struct UsageTracker {
    limits: UsageLimits,
    day: Mutex<UsageDay>,
}

impl UsageTracker {
    pub fn new(limits: UsageLimits) -> Self {
        Self {
            limits,
            day: Mutex::new(UsageDay::new(today())),
        }
    }

    fn limit(&self, kind: UsageKind) -> u32 {
        match kind {
            UsageKind::Search => self.limits.daily_searches,
            UsageKind::Transcript => self.limits.daily_transcripts,
        }
    }

    fn day_on(&self, date: NaiveDate) -> MutexGuard<'_, UsageDay> {
        let mut day = self.day.lock().unwrap_or_else(|e| e.into_inner());
        if day.date != date {
            info!(
                "Resetting usage counters for {date} ({} searches, {} transcripts on {})",
                day.searches, day.transcripts, day.date
            );
            *day = UsageDay::new(date);
        }
        day
    }

    fn allowed(&self, day: &UsageDay, kind: UsageKind) -> Result<(), UsageLimitReached> {
        let limit = self.limit(kind);
        if limit > 0 && day.count(kind) >= limit {
            warn!("Daily {kind} limit of {limit} reached");
            return Err(UsageLimitReached { kind, limit });
        }
        Ok(())
    }

    /// Checks the allowance without using it.
    pub fn check(&self, kind: UsageKind) -> Result<(), UsageLimitReached> {
        self.check_on(kind, today())
    }

    pub fn record(&self, kind: UsageKind) {
        self.record_on(kind, today());
    }

    /// Checks and uses one unit of the allowance in a single step.
    pub fn try_consume(&self, kind: UsageKind) -> Result<(), UsageLimitReached> {
        self.try_consume_on(kind, today())
    }

    pub fn status(&self) -> UsageStatus {
        self.status_on(today())
    }

    fn check_on(&self, kind: UsageKind, date: NaiveDate) -> Result<(), UsageLimitReached> {
        let day = self.day_on(date);
        self.allowed(&day, kind)
    }

    fn record_on(&self, kind: UsageKind, date: NaiveDate) {
        self.day_on(date).bump(kind);
    }

    fn try_consume_on(&self, kind: UsageKind, date: NaiveDate) -> Result<(), UsageLimitReached> {
        let mut day = self.day_on(date);
        self.allowed(&day, kind)?;
        day.bump(kind);
        Ok(())
    }

    fn status_on(&self, date: NaiveDate) -> UsageStatus {
        let day = self.day_on(date);
        UsageStatus {
            date: day.date,
            searches_used: day.searches,
            search_limit: self.limits.daily_searches,
            transcripts_used: day.transcripts,
            transcript_limit: self.limits.daily_transcripts,
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn tracker(searches: u32, transcripts: u32) -> UsageTracker {
        UsageTracker::new(UsageLimits {
            daily_searches: searches,
            daily_transcripts: transcripts,
        })
    }

    #[test]
    fn searches_stop_at_the_daily_limit() {
        let usage = tracker(2, 5);

        assert!(usage.try_consume_on(UsageKind::Search, date(1)).is_ok());
        assert!(usage.try_consume_on(UsageKind::Search, date(1)).is_ok());
        assert_eq!(
            usage.try_consume_on(UsageKind::Search, date(1)),
            Err(UsageLimitReached {
                kind: UsageKind::Search,
                limit: 2
            })
        );
        // a refused attempt is not counted
        assert_eq!(usage.status_on(date(1)).searches_used, 2);
        assert!(usage.check_on(UsageKind::Transcript, date(1)).is_ok());
    }

    #[test]
    fn check_does_not_count_until_recorded() {
        let usage = tracker(10, 1);

        assert!(usage.check_on(UsageKind::Transcript, date(1)).is_ok());
        assert!(usage.check_on(UsageKind::Transcript, date(1)).is_ok());
        usage.record_on(UsageKind::Transcript, date(1));
        assert!(usage.check_on(UsageKind::Transcript, date(1)).is_err());
    }

    #[test]
    fn counters_reset_when_the_date_changes() {
        let usage = tracker(1, 1);
        usage.try_consume_on(UsageKind::Search, date(1)).unwrap();
        usage.record_on(UsageKind::Transcript, date(1));
        assert!(usage.try_consume_on(UsageKind::Search, date(1)).is_err());

        assert!(usage.try_consume_on(UsageKind::Search, date(2)).is_ok());
        let status = usage.status_on(date(2));
        assert_eq!(status.date, date(2));
        assert_eq!(status.searches_used, 1);
        assert_eq!(status.transcripts_used, 0);
    }

    #[test]
    fn zero_limit_is_unlimited() {
        let usage = tracker(0, 0);
        for _ in 0..100 {
            assert!(usage.try_consume_on(UsageKind::Search, date(1)).is_ok());
        }
        assert_eq!(usage.status_on(date(1)).searches_used, 100);
    }
}
