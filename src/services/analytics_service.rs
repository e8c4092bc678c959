// src/services/analytics_service.rs

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::common::{error::AppError, time};
use crate::db::AnalyticsRepository;
use crate::models::analytics::{
    CardTotals, DayBucket, HourBucket, Kpis, MonthBucket, RangeQuery, SalesBuckets, SalesQuery, SoldLine,
    TimeseriesPoint, TimeseriesQuery,
};

pub const DEFAULT_DAYS: i64 = 30;
pub const MAX_DAYS: usize = 400;
pub const DEFAULT_MONTHS: i32 = 12;
pub const MAX_MONTHS: usize = 120;
// 31 dias de horas
pub const MAX_HOUR_BUCKETS: usize = 744;

#[derive(Clone)]
pub struct AnalyticsService {
    repo: AnalyticsRepository,
}

impl AnalyticsService {
    pub fn new(repo: AnalyticsRepository) -> Self {
        Self { repo }
    }

    pub async fn kpis(&self, company_id: Uuid, query: RangeQuery) -> Result<Kpis, AppError> {
        let (from, to) = time::parse_range(query.from.as_deref(), query.to.as_deref())?;
        let row = self.repo.kpis(company_id, from, to).await?;

        Ok(Kpis {
            from,
            to,
            revenue: row.revenue,
            items_sold: row.items_sold,
            active_staff: row.active_staff,
        })
    }

    pub async fn sales_by_hour(&self, company_id: Uuid, query: RangeQuery) -> Result<Vec<HourBucket>, AppError> {
        let (from, to) = time::parse_range(query.from.as_deref(), query.to.as_deref())?;
        let offset = time::parse_tz_offset(query.tz_offset_minutes.as_deref())?;

        let lines = self.repo.sold_lines(company_id, from, to).await?;
        Ok(bucket_by_hour(&lines, offset))
    }

    pub async fn sales_by_day(&self, company_id: Uuid, query: RangeQuery) -> Result<Vec<DayBucket>, AppError> {
        let (from, to) = time::parse_range(query.from.as_deref(), query.to.as_deref())?;
        let offset = time::parse_tz_offset(query.tz_offset_minutes.as_deref())?;

        let days = day_keys(from, to, offset, Utc::now());
        let (Some(first), Some(last)) = (days.first(), days.last()) else {
            return Ok(Vec::new());
        };

        let window_start = time::local_day_start(*first, offset);
        let window_end = time::local_day_start(*last + Duration::days(1), offset);
        let lines = self
            .repo
            .sold_lines(company_id, Some(window_start), Some(time::last_instant_before(window_end)))
            .await?;

        Ok(bucket_by_day(&lines, &days, offset))
    }

    pub async fn sales_by_month(&self, company_id: Uuid, query: RangeQuery) -> Result<Vec<MonthBucket>, AppError> {
        let (from, to) = time::parse_range(query.from.as_deref(), query.to.as_deref())?;
        let offset = time::parse_tz_offset(query.tz_offset_minutes.as_deref())?;

        let months = month_keys(from, to, offset, Utc::now());
        let (Some(first), Some(last)) = (months.first(), months.last()) else {
            return Ok(Vec::new());
        };

        let window_start = month_start(*first, offset)?;
        let window_end = month_start(*last + 1, offset)?;
        let lines = self
            .repo
            .sold_lines(company_id, Some(window_start), Some(time::last_instant_before(window_end)))
            .await?;

        Ok(bucket_by_month(&lines, &months, offset))
    }

    /// `bucket=hour|day|month` (padrão: day).
    pub async fn sales(&self, company_id: Uuid, query: SalesQuery) -> Result<SalesBuckets, AppError> {
        let range = RangeQuery {
            from: query.from,
            to: query.to,
            tz_offset_minutes: query.tz_offset_minutes,
        };

        match query.bucket.as_deref().map(str::trim).unwrap_or("day") {
            "hour" => Ok(SalesBuckets::Hour(self.sales_by_hour(company_id, range).await?)),
            "day" => Ok(SalesBuckets::Day(self.sales_by_day(company_id, range).await?)),
            "month" => Ok(SalesBuckets::Month(self.sales_by_month(company_id, range).await?)),
            other => Err(AppError::bad_request(format!(
                "bucket inválido: {other}. Use hour, day ou month."
            ))),
        }
    }

    /// Série por hora com rateio de cada turno pela fração da sua duração em cada intervalo.
    pub async fn sales_timeseries(
        &self,
        company_id: Uuid,
        query: TimeseriesQuery,
    ) -> Result<Vec<TimeseriesPoint>, AppError> {
        match query.interval.as_deref().map(str::trim) {
            None | Some("") | Some("hour") => {}
            Some(other) => {
                return Err(AppError::bad_request(format!(
                    "interval inválido: {other}. Apenas hour é suportado."
                )));
            }
        }

        let (from, to) = time::parse_range(query.from.as_deref(), query.to.as_deref())?;
        let offset = time::parse_tz_offset(query.tz_offset_minutes.as_deref())?;

        let to = to.unwrap_or_else(Utc::now);
        let from = from.unwrap_or(to - Duration::hours(24));
        if from >= to {
            return Ok(Vec::new());
        }

        let starts = hour_bucket_starts(from, to, offset);
        let cards = self.repo.card_totals_overlapping(company_id, from, to).await?;

        Ok(apportion_hourly(&cards, &starts, from, to, offset))
    }
}

// ---
// Agrupamentos (puros)
// ---

/// 24 posições (hora local), todas presentes mesmo sem vendas.
pub fn bucket_by_hour(lines: &[SoldLine], offset_minutes: i32) -> Vec<HourBucket> {
    let mut buckets: Vec<HourBucket> = (0..24)
        .map(|hour| HourBucket { hour, revenue: Decimal::ZERO, items_sold: 0 })
        .collect();

    for line in lines {
        let hour = time::to_local(line.anchor_at, offset_minutes).hour() as usize;
        let bucket = &mut buckets[hour];
        bucket.revenue += line.total.unwrap_or(Decimal::ZERO);
        bucket.items_sold += line.quantity_sold as i64;
    }

    buckets
}

/// Dias locais cobertos por `[from, to]`; padrão: últimos 30 dias. Mantém os últimos `MAX_DAYS`.
pub fn day_keys(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    offset_minutes: i32,
    now: DateTime<Utc>,
) -> Vec<NaiveDate> {
    let last = time::to_local(to.unwrap_or(now), offset_minutes).date();
    let first = match from {
        Some(f) => time::to_local(f, offset_minutes).date(),
        None => last - Duration::days(DEFAULT_DAYS - 1),
    };

    let span = (last - first).num_days();
    if span < 0 {
        return Vec::new();
    }

    let first = if span as usize >= MAX_DAYS {
        last - Duration::days(MAX_DAYS as i64 - 1)
    } else {
        first
    };

    first.iter_days().take_while(|d| *d <= last).collect()
}

pub fn bucket_by_day(lines: &[SoldLine], days: &[NaiveDate], offset_minutes: i32) -> Vec<DayBucket> {
    let index: HashMap<NaiveDate, usize> = days.iter().enumerate().map(|(i, d)| (*d, i)).collect();
    let mut buckets: Vec<DayBucket> = days
        .iter()
        .map(|d| DayBucket {
            day: d.format("%Y-%m-%d").to_string(),
            revenue: Decimal::ZERO,
            items_sold: 0,
        })
        .collect();

    for line in lines {
        let day = time::to_local(line.anchor_at, offset_minutes).date();
        if let Some(&i) = index.get(&day) {
            buckets[i].revenue += line.total.unwrap_or(Decimal::ZERO);
            buckets[i].items_sold += line.quantity_sold as i64;
        }
    }

    buckets
}

// Mês como índice absoluto (ano * 12 + mês - 1)
fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

fn month_label(index: i32) -> String {
    format!("{:04}-{:02}", index.div_euclid(12), index.rem_euclid(12) + 1)
}

fn month_start(index: i32, offset_minutes: i32) -> Result<DateTime<Utc>, AppError> {
    let date = NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
        .ok_or_else(|| AppError::bad_request("Intervalo de meses inválido."))?;
    Ok(time::local_day_start(date, offset_minutes))
}

/// Meses locais cobertos por `[from, to]`; padrão: últimos 12. Mantém os últimos `MAX_MONTHS`.
pub fn month_keys(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    offset_minutes: i32,
    now: DateTime<Utc>,
) -> Vec<i32> {
    let last = month_index(time::to_local(to.unwrap_or(now), offset_minutes).date());
    let first = match from {
        Some(f) => month_index(time::to_local(f, offset_minutes).date()),
        None => last - (DEFAULT_MONTHS - 1),
    };

    if first > last {
        return Vec::new();
    }
    let first = first.max(last - (MAX_MONTHS as i32 - 1));

    (first..=last).collect()
}

pub fn bucket_by_month(lines: &[SoldLine], months: &[i32], offset_minutes: i32) -> Vec<MonthBucket> {
    let Some(&first) = months.first() else {
        return Vec::new();
    };

    let mut buckets: Vec<MonthBucket> = months
        .iter()
        .map(|m| MonthBucket {
            month: month_label(*m),
            revenue: Decimal::ZERO,
            items_sold: 0,
        })
        .collect();

    for line in lines {
        let month = month_index(time::to_local(line.anchor_at, offset_minutes).date());
        let Ok(i) = usize::try_from(month - first) else {
            continue;
        };
        if let Some(bucket) = buckets.get_mut(i) {
            bucket.revenue += line.total.unwrap_or(Decimal::ZERO);
            bucket.items_sold += line.quantity_sold as i64;
        }
    }

    buckets
}

// ---
// Série temporal por hora
// ---

/// Inícios (UTC) das horas locais que tocam `[from, to)`, limitados a `MAX_HOUR_BUCKETS`.
pub fn hour_bucket_starts(from: DateTime<Utc>, to: DateTime<Utc>, offset_minutes: i32) -> Vec<DateTime<Utc>> {
    let local = time::to_local(from, offset_minutes);
    let floored = local.date().and_hms_opt(local.hour(), 0, 0).unwrap_or(local);
    let first = time::from_local(floored, offset_minutes);

    let mut starts = Vec::new();
    let mut cursor = first;
    while cursor < to && starts.len() < MAX_HOUR_BUCKETS {
        starts.push(cursor);
        cursor += Duration::hours(1);
    }
    starts
}

fn overlap_ms(a_start: DateTime<Utc>, a_end: DateTime<Utc>, b_start: DateTime<Utc>, b_end: DateTime<Utc>) -> i64 {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    (end - start).num_milliseconds().max(0)
}

/// Rateia receita/itens de cada turno entre as horas, proporcional ao tempo do turno em cada uma.
/// Partes fora de `[from, to)` são descartadas; turnos de duração zero vão inteiros para a hora do início.
pub fn apportion_hourly(
    cards: &[CardTotals],
    starts: &[DateTime<Utc>],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    offset_minutes: i32,
) -> Vec<TimeseriesPoint> {
    let mut points: Vec<TimeseriesPoint> = starts
        .iter()
        .map(|start| TimeseriesPoint {
            start: *start,
            label: time::to_local(*start, offset_minutes).format("%Y-%m-%d %H:00").to_string(),
            revenue: 0.0,
            items_sold: 0.0,
        })
        .collect();

    for card in cards {
        let revenue = card.revenue.to_f64().unwrap_or(0.0);
        let items = card.items_sold as f64;
        let end_at = card.end_at.unwrap_or(card.start_at).max(card.start_at);
        let duration = (end_at - card.start_at).num_milliseconds();

        for point in points.iter_mut() {
            let bucket_start = point.start.max(from);
            let bucket_end = (point.start + Duration::hours(1)).min(to);
            if bucket_start >= bucket_end {
                continue;
            }

            if duration == 0 {
                if card.start_at >= bucket_start && card.start_at < bucket_end {
                    point.revenue += revenue;
                    point.items_sold += items;
                }
                continue;
            }

            let shared = overlap_ms(card.start_at, end_at, bucket_start, bucket_end);
            if shared > 0 {
                let fraction = shared as f64 / duration as f64;
                point.revenue += revenue * fraction;
                point.items_sold += items * fraction;
            }
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn sold(anchor_at: DateTime<Utc>, quantity: i32, total: Option<&str>) -> SoldLine {
        SoldLine {
            anchor_at,
            quantity_sold: quantity,
            total: total.map(dec),
            cost_price: None,
        }
    }

    fn card(start: DateTime<Utc>, end: Option<DateTime<Utc>>, revenue: &str, items: i64) -> CardTotals {
        CardTotals { start_at: start, end_at: end, revenue: dec(revenue), items_sold: items }
    }

    #[test]
    fn test_hour_buckets_are_zero_filled_and_shifted() {
        // 02:30 UTC com UTC-3 cai às 23h locais
        let lines = vec![sold(at(2024, 5, 2, 2, 30), 3, Some("9.00")), sold(at(2024, 5, 2, 2, 45), 1, None)];
        let buckets = bucket_by_hour(&lines, -180);

        assert_eq!(buckets.len(), 24);
        assert_eq!(buckets[23].revenue, dec("9.00"));
        assert_eq!(buckets[23].items_sold, 4);
        assert_eq!(buckets[2].items_sold, 0);
    }

    #[test]
    fn test_day_keys_default_and_clamp() {
        let now = at(2024, 5, 31, 12, 0);
        let days = day_keys(None, None, 0, now);
        assert_eq!(days.len(), 30);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(*days.last().unwrap(), NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());

        let long = day_keys(Some(at(2020, 1, 1, 0, 0)), Some(now), 0, now);
        assert_eq!(long.len(), MAX_DAYS);
        assert_eq!(*long.last().unwrap(), NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
    }

    #[test]
    fn test_day_buckets_use_local_dates() {
        let days = day_keys(Some(at(2024, 5, 1, 12, 0)), Some(at(2024, 5, 2, 12, 0)), -180, at(2024, 5, 2, 12, 0));
        let lines = vec![sold(at(2024, 5, 2, 1, 0), 2, Some("6.00"))];
        let buckets = bucket_by_day(&lines, &days, -180);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].day, "2024-05-01");
        assert_eq!(buckets[0].revenue, dec("6.00"));
        assert_eq!(buckets[1].revenue, Decimal::ZERO);
    }

    #[test]
    fn test_month_keys_and_labels() {
        let now = at(2024, 3, 15, 0, 0);
        let months = month_keys(None, None, 0, now);
        assert_eq!(months.len(), 12);
        assert_eq!(month_label(months[0]), "2023-04");
        assert_eq!(month_label(*months.last().unwrap()), "2024-03");

        let long = month_keys(Some(at(2000, 1, 1, 0, 0)), Some(now), 0, now);
        assert_eq!(long.len(), MAX_MONTHS);

        let lines = vec![sold(at(2024, 2, 10, 0, 0), 1, Some("3.00"))];
        let buckets = bucket_by_month(&lines, &months, 0);
        assert_eq!(buckets[10].month, "2024-02");
        assert_eq!(buckets[10].revenue, dec("3.00"));
    }

    #[test]
    fn test_hour_starts_align_to_local_hours() {
        // UTC+5:30: 10:10 UTC = 15:40 local -> primeira hora começa 15:00 local = 09:30 UTC
        let starts = hour_bucket_starts(at(2024, 5, 1, 10, 10), at(2024, 5, 1, 12, 0), 330);
        assert_eq!(starts[0], at(2024, 5, 1, 9, 30));
        assert_eq!(starts.len(), 3);

        let capped = hour_bucket_starts(at(2024, 1, 1, 0, 0), at(2024, 3, 1, 0, 0), 0);
        assert_eq!(capped.len(), MAX_HOUR_BUCKETS);
    }

    #[test]
    fn test_two_hour_shift_splits_evenly() {
        let t = at(2024, 5, 1, 10, 0);
        let end = t + Duration::hours(2);
        let starts = hour_bucket_starts(t, end, 0);
        let points = apportion_hourly(&[card(t, Some(end), "12.00", 4)], &starts, t, end, 0);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].revenue, 6.0);
        assert_eq!(points[1].revenue, 6.0);
        assert_eq!(points[0].items_sold, 2.0);
        assert_eq!(points[1].items_sold, 2.0);
        assert_eq!(points[0].label, "2024-05-01 10:00");
    }

    #[test]
    fn test_apportion_conserves_totals_inside_window() {
        let from = at(2024, 5, 1, 8, 0);
        let to = at(2024, 5, 1, 14, 0);
        let cards = vec![
            card(at(2024, 5, 1, 9, 15), Some(at(2024, 5, 1, 11, 45)), "30.00", 10),
            card(at(2024, 5, 1, 12, 0), Some(at(2024, 5, 1, 12, 0)), "5.00", 1),
        ];
        let starts = hour_bucket_starts(from, to, 0);
        let points = apportion_hourly(&cards, &starts, from, to, 0);

        let revenue: f64 = points.iter().map(|p| p.revenue).sum();
        let items: f64 = points.iter().map(|p| p.items_sold).sum();
        assert!((revenue - 35.0).abs() < 1e-9);
        assert!((items - 11.0).abs() < 1e-9);
        // turno instantâneo vai inteiro para a hora do início
        assert_eq!(points[4].revenue, 5.0);
    }

    #[test]
    fn test_apportion_drops_portions_outside_window() {
        let from = at(2024, 5, 1, 10, 0);
        let to = at(2024, 5, 1, 11, 0);
        let cards = vec![card(at(2024, 5, 1, 9, 0), Some(at(2024, 5, 1, 11, 0)), "10.00", 2)];
        let starts = hour_bucket_starts(from, to, 0);
        let points = apportion_hourly(&cards, &starts, from, to, 0);

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].revenue, 5.0);
        assert_eq!(points[0].items_sold, 1.0);
    }
}
