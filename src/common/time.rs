// src/common/time.rs

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::common::error::AppError;

/// Deslocamento máximo aceito (UTC-14 .. UTC+14), em minutos.
pub const MAX_TZ_OFFSET_MINUTES: i32 = 14 * 60;

/// Aceita RFC 3339 (`2024-05-01T12:00:00Z`) ou data pura (`2024-05-01`, meia-noite UTC).
pub fn parse_instant(field: &str, raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }
    Err(AppError::bad_request(format!("Data inválida em `{field}`: {raw}")))
}

/// Versão opcional: ausente ou vazio vira `None`.
pub fn parse_optional_instant(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_instant(field, value).map(Some),
    }
}

/// Lê `from`/`to` e garante `from <= to` quando ambos vierem.
pub fn parse_range(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), AppError> {
    let from = parse_optional_instant("from", from)?;
    let to = parse_optional_instant("to", to)?;

    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            return Err(AppError::bad_request("`from` não pode ser depois de `to`."));
        }
    }
    Ok((from, to))
}

/// `tzOffsetMinutes`: inteiro (como string de query) dentro de ±840. Ausente = 0.
pub fn parse_tz_offset(raw: Option<&str>) -> Result<i32, AppError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(0),
        Some(value) => value,
    };

    let offset: i32 = raw
        .parse()
        .map_err(|_| AppError::bad_request("tzOffsetMinutes deve ser um número inteiro."))?;

    if offset.abs() > MAX_TZ_OFFSET_MINUTES {
        return Err(AppError::bad_request(format!(
            "tzOffsetMinutes deve estar entre -{MAX_TZ_OFFSET_MINUTES} e {MAX_TZ_OFFSET_MINUTES}."
        )));
    }
    Ok(offset)
}

/// Instante UTC visto no "relógio local" do deslocamento.
pub fn to_local(at: DateTime<Utc>, offset_minutes: i32) -> NaiveDateTime {
    (at + Duration::minutes(offset_minutes as i64)).naive_utc()
}

/// Inverso de `to_local`.
pub fn from_local(local: NaiveDateTime, offset_minutes: i32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&(local - Duration::minutes(offset_minutes as i64)))
}

/// Primeiro instante (UTC) do dia local informado.
pub fn local_day_start(date: NaiveDate, offset_minutes: i32) -> DateTime<Utc> {
    from_local(date.and_time(NaiveTime::MIN), offset_minutes)
}

/// Último instante antes de `exclusive_end` (o Postgres guarda microssegundos).
pub fn last_instant_before(exclusive_end: DateTime<Utc>) -> DateTime<Utc> {
    exclusive_end - Duration::microseconds(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_instant_accepts_rfc3339_and_plain_dates() {
        let a = parse_instant("from", "2024-05-01T12:30:00-03:00").unwrap();
        assert_eq!(a, Utc.with_ymd_and_hms(2024, 5, 1, 15, 30, 0).unwrap());

        let b = parse_instant("from", "2024-05-01").unwrap();
        assert_eq!(b, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_instant_rejects_garbage() {
        let err = parse_instant("to", "ontem").unwrap_err();
        assert_eq!(err.kind(), "BAD_REQUEST");
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        assert!(parse_range(Some("2024-05-02"), Some("2024-05-01")).is_err());
        let (from, to) = parse_range(None, Some("2024-05-01")).unwrap();
        assert!(from.is_none());
        assert!(to.is_some());
    }

    #[test]
    fn test_tz_offset_bounds() {
        assert_eq!(parse_tz_offset(None).unwrap(), 0);
        assert_eq!(parse_tz_offset(Some("-180")).unwrap(), -180);
        assert_eq!(parse_tz_offset(Some("840")).unwrap(), 840);
        assert!(parse_tz_offset(Some("841")).is_err());
        assert!(parse_tz_offset(Some("1.5")).is_err());
        assert!(parse_tz_offset(Some("abc")).is_err());
    }

    #[test]
    fn test_local_shift_round_trips() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
        let local = to_local(at, -180);
        // 02:00 UTC é 23:00 do dia anterior em UTC-3
        assert_eq!(local.day(), 31);
        assert_eq!(local.hour(), 23);
        assert_eq!(from_local(local, -180), at);
    }

    #[test]
    fn test_local_day_start() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(
            local_day_start(date, 60),
            Utc.with_ymd_and_hms(2024, 3, 9, 23, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_last_instant_before_closes_half_open_windows() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let last = last_instant_before(midnight);
        assert!(last < midnight);
        assert_eq!(last.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(last.nanosecond(), 999_999_000);
    }
}
