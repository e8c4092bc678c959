// src/services/annual_service.rs

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::common::{error::AppError, time};
use crate::db::AnalyticsRepository;
use crate::models::analytics::{AnnualEntry, AnnualEntryPayload, AnnualQuery, AnnualRow, AnnualSource, SoldLine};
use crate::models::bank::{BankMovement, BankMovementType};

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;

#[derive(Clone)]
pub struct AnnualService {
    repo: AnalyticsRepository,
}

impl AnnualService {
    pub fn new(repo: AnalyticsRepository) -> Self {
        Self { repo }
    }

    pub async fn list(&self, company_id: Uuid, query: AnnualQuery) -> Result<Vec<AnnualRow>, AppError> {
        let offset = time::parse_tz_offset(query.tz_offset_minutes.as_deref())?;
        let year = parse_year(query.year.as_deref(), time::to_local(Utc::now(), offset).year())?;

        let (first_day, last_day) = year_bounds(year)?;
        let year_start = time::local_day_start(first_day, offset);
        let year_end = time::local_day_start(last_day + chrono::Duration::days(1), offset);

        let (balance, since_start) = self.repo.balance_and_movements_since(company_id, year_start).await?;
        let movements = self.repo.movements_between(company_id, year_start, year_end).await?;
        let lines = self
            .repo
            .sold_lines(company_id, Some(year_start), Some(time::last_instant_before(year_end)))
            .await?;
        let entries = self.repo.list_annual_entries(company_id, first_day, last_day).await?;

        Ok(build_annual_rows(balance - since_start, &movements, &lines, entries, offset))
    }

    /// Cria ou substitui o lançamento manual da data.
    pub async fn upsert_entry(&self, company_id: Uuid, payload: AnnualEntryPayload) -> Result<AnnualEntry, AppError> {
        let entry = self.repo.upsert_annual_entry(company_id, &payload).await?;
        tracing::info!(%company_id, date = %entry.date, "📒 Lançamento anual salvo");
        Ok(entry)
    }

    pub async fn delete_entry(&self, company_id: Uuid, entry_id: Uuid) -> Result<(), AppError> {
        if self.repo.delete_annual_entry(company_id, entry_id).await? == 0 {
            return Err(AppError::not_found("Lançamento não encontrado."));
        }
        Ok(())
    }
}

pub fn parse_year(raw: Option<&str>, current: i32) -> Result<i32, AppError> {
    let year = match raw.map(str::trim) {
        None | Some("") => current,
        Some(value) => value
            .parse::<i32>()
            .map_err(|_| AppError::bad_request("Ano inválido."))?,
    };

    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(AppError::bad_request(format!(
            "O ano deve estar entre {MIN_YEAR} e {MAX_YEAR}."
        )));
    }
    Ok(year)
}

fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), AppError> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1);
    let last = NaiveDate::from_ymd_opt(year, 12, 31);
    first
        .zip(last)
        .ok_or_else(|| AppError::bad_request("Ano inválido."))
}

#[derive(Debug, Default, Clone)]
struct DayTotals {
    net: Decimal,
    revenue: Decimal,
    expenses: Decimal,
    items_sold: i64,
    cogs: Decimal,
}

/// Junta lançamentos manuais e linhas automáticas, dia a dia, com saldo corrente.
///
/// Datas com lançamento manual usam o manual; as demais aparecem somente se houver
/// movimento bancário ou venda naquele dia. O saldo corrente avança por todas as datas.
pub fn build_annual_rows(
    opening_balance: Decimal,
    movements: &[BankMovement],
    lines: &[SoldLine],
    entries: Vec<AnnualEntry>,
    offset_minutes: i32,
) -> Vec<AnnualRow> {
    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();

    for m in movements {
        let day = days.entry(time::to_local(m.created_at, offset_minutes).date()).or_default();
        day.net += m.amount;
        match m.movement_type {
            BankMovementType::SalesCard => day.revenue += m.amount,
            BankMovementType::Restock => day.expenses += m.amount.abs(),
            BankMovementType::OpeningBalance | BankMovementType::Adjustment => {}
        }
    }

    for line in lines {
        let day = days.entry(time::to_local(line.anchor_at, offset_minutes).date()).or_default();
        day.items_sold += line.quantity_sold as i64;
        if let Some(cost) = line.cost_price {
            day.cogs += cost * Decimal::from(line.quantity_sold);
        }
    }

    let mut manual: HashMap<NaiveDate, AnnualEntry> = HashMap::new();
    for entry in entries {
        days.entry(entry.date).or_default();
        manual.insert(entry.date, entry);
    }

    let mut running = opening_balance;
    let mut rows = Vec::with_capacity(days.len());

    for (date, totals) in days {
        let starting = running;
        running += totals.net;

        let row = match manual.remove(&date) {
            Some(entry) => AnnualRow {
                id: Some(entry.id),
                date,
                revenue: entry.revenue,
                expenses: entry.expenses,
                starting_capital: entry.starting_capital,
                total: entry.total,
                items_sold: entry.items_sold.map(i64::from),
                profit: entry.profit,
                note: entry.note,
                source: AnnualSource::Manual,
            },
            None => AnnualRow {
                id: None,
                date,
                revenue: Some(totals.revenue),
                expenses: Some(totals.expenses),
                starting_capital: Some(starting),
                total: Some(starting + totals.revenue - totals.expenses),
                items_sold: Some(totals.items_sold),
                profit: Some(totals.revenue - totals.cogs),
                note: None,
                source: AnnualSource::Auto,
            },
        };
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn at(m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, m, d, h, 0, 0).unwrap()
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn movement(kind: BankMovementType, amount: &str, created_at: DateTime<Utc>) -> BankMovement {
        BankMovement {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            movement_type: kind,
            amount: dec(amount),
            restock_id: None,
            sales_card_id: None,
            note: None,
            created_at,
        }
    }

    fn manual(day: NaiveDate, revenue: &str) -> AnnualEntry {
        AnnualEntry {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            date: day,
            revenue: Some(dec(revenue)),
            expenses: None,
            starting_capital: None,
            total: None,
            items_sold: Some(7),
            profit: None,
            note: Some("ajustado".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_parse_year_bounds() {
        assert_eq!(parse_year(None, 2024).unwrap(), 2024);
        assert_eq!(parse_year(Some("2030"), 2024).unwrap(), 2030);
        assert!(parse_year(Some("1999"), 2024).is_err());
        assert!(parse_year(Some("2101"), 2024).is_err());
        assert!(parse_year(Some("abc"), 2024).is_err());
    }

    #[test]
    fn test_auto_rows_track_running_balance() {
        let movements = vec![
            movement(BankMovementType::Restock, "-10.00", at(5, 1, 9)),
            movement(BankMovementType::SalesCard, "12.00", at(5, 1, 20)),
            movement(BankMovementType::SalesCard, "6.00", at(5, 3, 20)),
        ];
        let lines = vec![SoldLine {
            anchor_at: at(5, 1, 20),
            quantity_sold: 4,
            total: Some(dec("12.00")),
            cost_price: Some(dec("1.00")),
        }];

        let rows = build_annual_rows(dec("100.00"), &movements, &lines, Vec::new(), 0);
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(first.source, AnnualSource::Auto);
        assert_eq!(first.date, date(5, 1));
        assert_eq!(first.revenue, Some(dec("12.00")));
        assert_eq!(first.expenses, Some(dec("10.00")));
        assert_eq!(first.starting_capital, Some(dec("100.00")));
        assert_eq!(first.total, Some(dec("102.00")));
        assert_eq!(first.items_sold, Some(4));
        assert_eq!(first.profit, Some(dec("8.00")));

        assert_eq!(rows[1].starting_capital, Some(dec("102.00")));
    }

    #[test]
    fn test_manual_rows_take_precedence_but_balance_still_advances() {
        let movements = vec![
            movement(BankMovementType::SalesCard, "50.00", at(6, 1, 12)),
            movement(BankMovementType::SalesCard, "5.00", at(6, 2, 12)),
        ];
        let entry = manual(date(6, 1), "999.00");
        let entry_id = entry.id;

        let rows = build_annual_rows(Decimal::ZERO, &movements, &[], vec![entry, manual(date(6, 10), "1.00")], 0);
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].source, AnnualSource::Manual);
        assert_eq!(rows[0].id, Some(entry_id));
        assert_eq!(rows[0].revenue, Some(dec("999.00")));
        assert_eq!(rows[0].items_sold, Some(7));

        assert_eq!(rows[1].source, AnnualSource::Auto);
        assert_eq!(rows[1].starting_capital, Some(dec("50.00")));

        assert_eq!(rows[2].date, date(6, 10));
        assert_eq!(rows[2].source, AnnualSource::Manual);
    }

    #[test]
    fn test_days_follow_local_offset() {
        // 01:00 UTC em UTC-3 ainda é o dia anterior
        let movements = vec![movement(BankMovementType::Adjustment, "5.00", at(7, 2, 1))];
        let rows = build_annual_rows(Decimal::ZERO, &movements, &[], Vec::new(), -180);
        assert_eq!(rows[0].date, date(7, 1));
        assert_eq!(rows[0].revenue, Some(Decimal::ZERO));
    }
}
