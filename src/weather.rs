use crate::config::OperatingHours;
use crate::MINUTES_PER_DAY;
use rand::Rng;
use serde::{Deserialize, Serialize};

const DAY: u32 = MINUTES_PER_DAY as u32;

/// Why the runway is refusing arrivals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClosureReason {
    /// Outside the scheduled operating hours.
    ScheduledHours,
    /// Inside today's storm window.
    Storm,
}

/// Schedules at most one storm per simulated day and resolves why the
/// runway is closed at any given minute.
#[derive(Clone, Debug)]
pub struct WeatherScheduler {
    hours: OperatingHours,
    storm_enabled: bool,
    daily_probability: f64,
    duration_minutes: u32,
    /// Start of today's storm window in minutes after midnight, if one was drawn.
    storm_start: Option<u32>,
}

impl WeatherScheduler {
    /// Creates a scheduler with no storm drawn yet.
    pub(crate) fn new(
        hours: OperatingHours,
        storm_enabled: bool,
        daily_probability: f64,
        duration_minutes: u32,
    ) -> Self {
        Self {
            hours,
            storm_enabled,
            daily_probability,
            duration_minutes,
            storm_start: None,
        }
    }

    /// Rolls the storm window for a new day, discarding the old one.
    /// The window may wrap past midnight.
    pub(crate) fn reschedule(&mut self, rng: &mut impl Rng) {
        self.storm_start = None;
        if self.storm_enabled && rng.gen_bool(self.daily_probability) {
            let latest = DAY - self.duration_minutes;
            self.storm_start = Some(rng.gen_range(0..=latest));
        }
    }

    /// Today's storm window as (start, duration) in minutes, if one was drawn.
    pub fn storm_window(&self) -> Option<(u32, u32)> {
        self.storm_start.map(|start| (start, self.duration_minutes))
    }

    /// Resolves why the runway is closed at this minute of the day, if it is.
    /// Scheduled hours take precedence over a concurrent storm.
    pub fn closure_reason(&self, minute_of_day: u32) -> Option<ClosureReason> {
        if !self.hours.is_open(minute_of_day) {
            Some(ClosureReason::ScheduledHours)
        } else if self.in_storm(minute_of_day) {
            Some(ClosureReason::Storm)
        } else {
            None
        }
    }

    /// Minutes from this minute until the runway reopens; zero while open.
    pub fn minutes_until_reopen(&self, minute_of_day: u32) -> u32 {
        match self.closure_reason(minute_of_day) {
            Some(ClosureReason::ScheduledHours) => (self.hours.open + DAY - minute_of_day) % DAY,
            Some(ClosureReason::Storm) => match self.storm_start {
                Some(start) => {
                    let m = if minute_of_day >= start {
                        minute_of_day
                    } else {
                        minute_of_day + DAY
                    };
                    start + self.duration_minutes - m
                }
                None => 0,
            },
            None => 0,
        }
    }

    fn in_storm(&self, minute_of_day: u32) -> bool {
        self.storm_start.map_or(false, |start| {
            let end = start + self.duration_minutes;
            if end <= DAY {
                minute_of_day >= start && minute_of_day < end
            } else {
                minute_of_day >= start || minute_of_day < end - DAY
            }
        })
    }

    #[cfg(test)]
    pub(crate) fn schedule_storm_at(&mut self, start: u32) {
        self.storm_start = Some(start);
    }
}
