// No index by employee or date, statistics scan every stored tip

use crate::api::{TipStats, TipSubmission};
use crate::errors::{Error, Result};
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    /// Since UTC midnight
    Today,
    /// The previous UTC day
    Yesterday,
    /// Last 7 days
    #[default]
    Week,
    /// Last 30 days
    Month,
}

impl Period {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "today" => Ok(Period::Today),
            "yesterday" => Ok(Period::Yesterday),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            other => Err(Error::Validation(format!("Неизвестный период: {}", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Yesterday => "yesterday",
            Period::Week => "week",
            Period::Month => "month",
        }
    }

    /// Half-open interval `[start, end)` covered by the period at time `now`
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let midnight = Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN));
        // `now` itself is included
        let end = now + Duration::nanoseconds(1);
        match self {
            Period::Today => (midnight, end),
            Period::Yesterday => (midnight - Duration::days(1), midnight),
            Period::Week => (now - Duration::days(7), end),
            Period::Month => (now - Duration::days(30), end),
        }
    }
}

fn clamp(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Aggregate the tips of one employee over a period, optionally for a single restaurant
pub fn employee_stats(
    tips: &[TipSubmission],
    employee_id: &str,
    period: Period,
    restaurant: Option<&str>,
    now: DateTime<Utc>,
) -> TipStats {
    let (start, end) = period.window(now);
    let selected: Vec<TipSubmission> = tips
        .iter()
        .filter(|tip| tip.waiter_id.as_deref() == Some(employee_id))
        .filter(|tip| tip.created_at >= start && tip.created_at < end)
        .filter(|tip| restaurant.map_or(true, |r| tip.restaurant_name.as_deref() == Some(r)))
        .cloned()
        .collect();

    // Rows stored before the amount cap can still sum past i64
    let total: i128 = selected.iter().map(|tip| tip.amount as i128).sum();
    let count = selected.len();
    let average = if count == 0 {
        0
    } else {
        (2 * total + count as i128) / (2 * count as i128)
    };

    TipStats {
        employee_id: employee_id.to_string(),
        period: period.as_str().to_string(),
        count,
        total: clamp(total),
        average: clamp(average),
        tips: selected,
    }
}
