//! The back-office reporting screens: revenue, user growth, order volume and the sales ranking,
//! all over an inclusive range of calendar days.
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use log::*;

use crate::{
    db_types::OrderStatus,
    report_objects::{
        DailyOrderCount,
        DailyTurnover,
        DailyUserCount,
        ItemSales,
        OrderReport,
        TurnoverReport,
        UserReport,
    },
    traits::{ReportError, SalesReporting},
};

/// How many rows the sales ranking returns.
pub const TOP_SALES_LIMIT: i64 = 10;
/// The widest range a single report may cover, in days.
pub const MAX_REPORT_DAYS: usize = 366;

pub struct ReportApi<B> {
    db: B,
}

impl<B> ReportApi<B>
where B: SalesReporting
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Revenue per day over `[from, to]`. Only completed orders count.
    pub async fn turnover_report(&self, from: NaiveDate, to: NaiveDate) -> Result<TurnoverReport, ReportError> {
        let mut days = Vec::new();
        for date in report_days(from, to)? {
            let (start, end) = day_bounds(date);
            let turnover = self.db.turnover_between(start, end).await?;
            days.push(DailyTurnover { date, turnover });
        }
        debug!("📊️ Turnover report built for {from}..={to}");
        Ok(TurnoverReport { days })
    }

    /// Running user totals and daily sign-ups over `[from, to]`.
    pub async fn user_report(&self, from: NaiveDate, to: NaiveDate) -> Result<UserReport, ReportError> {
        let mut days = Vec::new();
        for date in report_days(from, to)? {
            let (start, end) = day_bounds(date);
            let total_users = self.db.count_users_between(None, end).await?;
            let new_users = self.db.count_users_between(Some(start), end).await?;
            days.push(DailyUserCount { date, total_users, new_users });
        }
        debug!("📊️ User report built for {from}..={to}");
        Ok(UserReport { days })
    }

    /// Order volume per day over `[from, to]`, plus range totals and the completion rate.
    pub async fn order_report(&self, from: NaiveDate, to: NaiveDate) -> Result<OrderReport, ReportError> {
        let mut days = Vec::new();
        let (mut total_orders, mut completed_orders) = (0, 0);
        for date in report_days(from, to)? {
            let (start, end) = day_bounds(date);
            let orders = self.db.count_orders_between(start, end, None).await?;
            let completed = self.db.count_orders_between(start, end, Some(OrderStatus::Completed)).await?;
            total_orders += orders;
            completed_orders += completed;
            days.push(DailyOrderCount { date, orders, completed });
        }
        let completion_rate =
            if total_orders == 0 { 0.0 } else { completed_orders as f64 / total_orders as f64 };
        debug!("📊️ Order report built for {from}..={to}: {completed_orders}/{total_orders} completed");
        Ok(OrderReport { days, total_orders, completed_orders, completion_rate })
    }

    /// The ten best-selling items across completed orders in `[from, to]`.
    pub async fn top_sales(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ItemSales>, ReportError> {
        let _ = report_days(from, to)?;
        let (start, _) = day_bounds(from);
        let (_, end) = day_bounds(to);
        self.db.top_selling_items(start, end, TOP_SALES_LIMIT).await
    }
}

/// The calendar days of the inclusive range, oldest first. Rejects inverted and oversized ranges.
fn report_days(from: NaiveDate, to: NaiveDate) -> Result<Vec<NaiveDate>, ReportError> {
    if from > to {
        return Err(ReportError::InvalidDateRange(format!("{from} is after {to}")));
    }
    let days: Vec<NaiveDate> = from.iter_days().take_while(|d| *d <= to).take(MAX_REPORT_DAYS + 1).collect();
    if days.len() > MAX_REPORT_DAYS {
        return Err(ReportError::InvalidDateRange(format!(
            "{from}..={to} spans more than {MAX_REPORT_DAYS} days"
        )));
    }
    Ok(days)
}

/// The UTC half-open interval `[00:00 of `date`, 00:00 of the next day)`.
fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    (start, start + chrono::Duration::days(1))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn day_bounds_are_half_open() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let (start, end) = day_bounds(date);
        assert_eq!(start.to_rfc3339(), "2024-06-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-06-02T00:00:00+00:00");
    }

    #[test]
    fn report_days_validation() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
        assert_eq!(report_days(d(1), d(3)).unwrap(), vec![d(1), d(2), d(3)]);
        assert_eq!(report_days(d(5), d(5)).unwrap().len(), 1);
        assert!(matches!(report_days(d(5), d(1)), Err(ReportError::InvalidDateRange(_))));
        let far = NaiveDate::from_ymd_opt(2034, 6, 1).unwrap();
        assert!(matches!(report_days(d(1), far), Err(ReportError::InvalidDateRange(_))));
    }
}
