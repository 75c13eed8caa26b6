// src/scheduling/calendar.rs

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};

use super::ScheduleError;

/// Fuso horário do negócio. "Hoje", "amanhã" e "mesmo dia" são sempre
/// calculados aqui, nunca em UTC cru.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    offset: FixedOffset,
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self { offset: Utc.fix() }
    }
}

impl BusinessCalendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Aceita "+05:30", "-03:00", "+00:00" ou "Z".
    pub fn parse_offset(raw: &str) -> Result<Self, ScheduleError> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("z") {
            return Ok(Self::default());
        }
        raw.parse::<FixedOffset>()
            .map(Self::new)
            .map_err(|_| ScheduleError::InvalidOffset(raw.to_string()))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.day_of(now)
    }

    /// Meia-noite local do dia, convertida para UTC. `None` só nos
    /// extremos representáveis pelo chrono.
    pub fn start_of_day(&self, day: NaiveDate) -> Option<DateTime<Utc>> {
        self.local_to_utc(day.and_time(NaiveTime::MIN))
    }

    fn local_to_utc(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        local
            .checked_sub_signed(Duration::seconds(i64::from(self.offset.local_minus_utc())))
            .map(|utc| utc.and_utc())
    }

    /// RFC 3339, data-hora local sem fuso, ou só a data (meia-noite local).
    pub fn parse_instant(&self, raw: &str) -> Result<DateTime<Utc>, ScheduleError> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        let unparseable = || ScheduleError::UnparseableDate(raw.to_string());
        if let Ok(local) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return self.local_to_utc(local).ok_or_else(unparseable);
        }
        if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return self.start_of_day(day).ok_or_else(unparseable);
        }
        Err(unparseable())
    }
}
