//! Загрузка таблицы дневного проката из CSV.

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use itertools::Itertools;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{DashboardError, Result};
use crate::filter::DateRange;

const REQUIRED_COLUMNS: [&str; 7] = [
    "dteday",
    "weathersit",
    "holiday",
    "workingday",
    "casual",
    "registered",
    "cnt",
];

const DATE_FORMAT_ISO: &str = "%Y-%m-%d";
const DATE_FORMAT_ISO_DATETIME: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT_US: &str = "%m/%d/%Y";
const FIRST_DATA_LINE: u64 = 2;

#[derive(Clone, Copy, Debug)]
enum DateFormatHint {
    Iso,
    IsoDateTime,
    UsSlashed,
}

impl DateFormatHint {
    const ALL: [Self; 3] = [Self::Iso, Self::IsoDateTime, Self::UsSlashed];

    fn parse(self, raw: &str) -> Option<NaiveDate> {
        match self {
            Self::Iso => NaiveDate::parse_from_str(raw, DATE_FORMAT_ISO).ok(),
            Self::IsoDateTime => NaiveDateTime::parse_from_str(raw, DATE_FORMAT_ISO_DATETIME)
                .ok()
                .map(|datetime| datetime.date()),
            Self::UsSlashed => NaiveDate::parse_from_str(raw, DATE_FORMAT_US).ok(),
        }
    }
}

/// Один день проката.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RentalRecord {
    pub date: NaiveDate,
    /// Исходный код `weathersit`; метка ставится позже при агрегации.
    pub weather_code: i64,
    pub holiday: bool,
    pub working_day: bool,
    pub casual_count: u32,
    pub registered_count: u32,
    /// `cnt` как в файле; не пересчитывается.
    pub total_count: u32,
}

impl RentalRecord {
    pub fn is_consistent(&self) -> bool {
        u64::from(self.casual_count) + u64::from(self.registered_count)
            == u64::from(self.total_count)
    }
}

/// Строка CSV; остальные колонки набора данных игнорируются.
#[derive(Debug, Deserialize)]
struct CsvRow {
    dteday: String,
    weathersit: String,
    holiday: String,
    workingday: String,
    casual: String,
    registered: String,
    cnt: String,
}

impl CsvRow {
    fn into_record(self, line: u64, hint: &mut Option<DateFormatHint>) -> Result<RentalRecord> {
        let date = parse_date_with_hint(&self.dteday, hint).ok_or_else(|| DashboardError::Parse {
            line,
            field: "dteday",
            value: self.dteday.clone(),
        })?;
        Ok(RentalRecord {
            date,
            weather_code: parse_number(&self.weathersit, line, "weathersit")?,
            holiday: parse_flag(&self.holiday, line, "holiday")?,
            working_day: parse_flag(&self.workingday, line, "workingday")?,
            casual_count: parse_number(&self.casual, line, "casual")?,
            registered_count: parse_number(&self.registered, line, "registered")?,
            total_count: parse_number(&self.cnt, line, "cnt")?,
        })
    }
}

/// Читает весь CSV в память и сортирует по дате.
pub(crate) fn load_rentals(csv_path: &Path) -> Result<Vec<RentalRecord>> {
    let file = File::open(csv_path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => DashboardError::NotFound {
            path: csv_path.to_path_buf(),
        },
        _ => DashboardError::Io(err),
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    if let Some(column) = REQUIRED_COLUMNS
        .into_iter()
        .find(|column| !headers.iter().any(|header| header == *column))
    {
        return Err(DashboardError::Schema {
            path: csv_path.to_path_buf(),
            column,
        });
    }

    let mut hint = None;
    let mut records = reader
        .deserialize::<CsvRow>()
        .zip(FIRST_DATA_LINE..)
        .map(|(row, line)| row?.into_record(line, &mut hint))
        .collect::<Result<Vec<_>>>()?;
    records.sort_by_key(|record| record.date);

    if let Some((duplicate, _)) = records
        .iter()
        .tuple_windows()
        .find(|(prev, next)| prev.date == next.date)
    {
        return Err(DashboardError::DuplicateDate {
            date: duplicate.date,
        });
    }

    let inconsistent = records
        .iter()
        .filter(|record| !record.is_consistent())
        .count();
    if inconsistent > 0 {
        warn!(
            rows = inconsistent,
            "cnt differs from casual + registered, keeping the stored value"
        );
    }
    debug!(rows = records.len(), path = %csv_path.display(), "Loaded rental table");

    Ok(records)
}

/// Фактический диапазон дат таблицы, `None` для пустой таблицы.
pub(crate) fn date_bounds(records: &[RentalRecord]) -> Option<DateRange> {
    records
        .iter()
        .map(|record| record.date)
        .minmax()
        .into_option()
        .map(|(start, end)| DateRange::new(start, end))
}

fn parse_date_with_hint(raw: &str, hint: &mut Option<DateFormatHint>) -> Option<NaiveDate> {
    if let Some(known) = *hint
        && let Some(date) = known.parse(raw)
    {
        return Some(date);
    }

    DateFormatHint::ALL.into_iter().find_map(|candidate| {
        let date = candidate.parse(raw)?;
        *hint = Some(candidate);
        Some(date)
    })
}

fn parse_number<T: std::str::FromStr>(raw: &str, line: u64, field: &'static str) -> Result<T> {
    raw.parse().map_err(|_| DashboardError::Parse {
        line,
        field,
        value: raw.to_string(),
    })
}

fn parse_flag(raw: &str, line: u64, field: &'static str) -> Result<bool> {
    match raw {
        "1" | "true" | "True" => Ok(true),
        "0" | "false" | "False" => Ok(false),
        _ => Err(DashboardError::Parse {
            line,
            field,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    pub(crate) const HEADER: &str =
        "instant,dteday,season,yr,mnth,holiday,weekday,workingday,weathersit,temp,casual,registered,cnt";

    pub(crate) fn write_csv(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        for line in lines {
            writeln!(file, "{line}").expect("write fixture line");
        }
        file
    }

    pub(crate) fn record(
        date: (i32, u32, u32),
        weather_code: i64,
        holiday: bool,
        working_day: bool,
        casual: u32,
        registered: u32,
    ) -> RentalRecord {
        RentalRecord {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            weather_code,
            holiday,
            working_day,
            casual_count: casual,
            registered_count: registered,
            total_count: casual + registered,
        }
    }

    #[test]
    fn test_load_rentals_ignores_extra_columns() {
        let file = write_csv(&[
            HEADER,
            "1,2011-01-01,1,0,1,0,6,0,2,0.34,331,654,985",
            "2,2011-01-02,1,0,1,0,0,0,2,0.36,131,670,801",
        ]);

        let records = load_rentals(file.path()).unwrap();

        assert_eq!(
            records,
            vec![
                record((2011, 1, 1), 2, false, false, 331, 654),
                record((2011, 1, 2), 2, false, false, 131, 670),
            ]
        );
    }

    #[test]
    fn test_load_rentals_sorts_by_date() {
        let file = write_csv(&[
            HEADER,
            "2,2011-02-01,1,0,2,0,2,1,1,0.3,10,20,30",
            "1,2011-01-31,1,0,1,0,1,1,1,0.3,1,2,3",
        ]);

        let records = load_rentals(file.path()).unwrap();

        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2011, 1, 31).unwrap());
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2011, 2, 1).unwrap());
    }

    #[test]
    fn test_load_rentals_keeps_inconsistent_total() {
        let file = write_csv(&[HEADER, "1,2011-01-01,1,0,1,0,6,0,1,0.34,10,20,999"]);

        let records = load_rentals(file.path()).unwrap();

        assert_eq!(records[0].total_count, 999);
        assert!(!records[0].is_consistent());
    }

    #[test]
    fn test_load_rentals_accepts_other_date_formats() {
        let file = write_csv(&[
            "dteday,weathersit,holiday,workingday,casual,registered,cnt",
            "01/05/2012,1,false,true,5,6,11",
            "01/06/2012,1,0,1,7,8,15",
        ]);

        let records = load_rentals(file.path()).unwrap();

        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2012, 1, 5).unwrap());
        assert!(records[0].working_day);
        assert_eq!(records[1].total_count, 15);
    }

    #[test]
    fn test_load_rentals_missing_file() {
        let err = load_rentals(Path::new("definitely/not/here/day.csv")).unwrap_err();
        assert!(matches!(err, DashboardError::NotFound { .. }));
    }

    #[test]
    fn test_load_rentals_missing_column() {
        let file = write_csv(&[
            "dteday,weathersit,holiday,workingday,casual,registered",
            "2011-01-01,1,0,1,5,6",
        ]);

        let err = load_rentals(file.path()).unwrap_err();

        assert!(matches!(err, DashboardError::Schema { column: "cnt", .. }));
    }

    #[test]
    fn test_load_rentals_non_numeric_count() {
        let file = write_csv(&[
            HEADER,
            "1,2011-01-01,1,0,1,0,6,0,1,0.34,10,20,30",
            "2,2011-01-02,1,0,1,0,0,0,1,0.36,many,20,30",
        ]);

        let err = load_rentals(file.path()).unwrap_err();

        match err {
            DashboardError::Parse { line, field, value } => {
                assert_eq!(line, 3);
                assert_eq!(field, "casual");
                assert_eq!(value, "many");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_rentals_bad_date() {
        let file = write_csv(&[HEADER, "1,yesterday,1,0,1,0,6,0,1,0.34,10,20,30"]);

        let err = load_rentals(file.path()).unwrap_err();

        assert!(matches!(err, DashboardError::Parse { field: "dteday", .. }));
    }

    #[test]
    fn test_load_rentals_duplicate_date() {
        let file = write_csv(&[
            HEADER,
            "1,2011-01-01,1,0,1,0,6,0,1,0.34,10,20,30",
            "2,2011-01-01,1,0,1,0,6,0,1,0.34,10,20,30",
        ]);

        let err = load_rentals(file.path()).unwrap_err();

        assert!(matches!(err, DashboardError::DuplicateDate { .. }));
    }

    #[test]
    fn test_unknown_weather_code_loads() {
        let file = write_csv(&[HEADER, "1,2011-01-01,1,0,1,0,6,0,7,0.34,10,20,30"]);

        let records = load_rentals(file.path()).unwrap();

        assert_eq!(records[0].weather_code, 7);
    }

    #[test]
    fn test_wide_weather_codes_load() {
        let file = write_csv(&[
            HEADER,
            "1,2011-01-01,1,0,1,0,6,0,300,0.34,10,20,30",
            "2,2011-01-02,1,0,1,0,0,0,-1,0.34,10,20,30",
        ]);

        let records = load_rentals(file.path()).unwrap();

        assert_eq!(records[0].weather_code, 300);
        assert_eq!(records[1].weather_code, -1);
    }

    #[test]
    fn test_date_bounds() {
        let records = vec![
            record((2011, 3, 1), 1, false, true, 1, 1),
            record((2011, 1, 1), 1, false, true, 1, 1),
            record((2011, 2, 1), 1, false, true, 1, 1),
        ];

        let bounds = date_bounds(&records).unwrap();

        assert_eq!(bounds.start, NaiveDate::from_ymd_opt(2011, 1, 1).unwrap());
        assert_eq!(bounds.end, NaiveDate::from_ymd_opt(2011, 3, 1).unwrap());
        assert!(date_bounds(&[]).is_none());
    }
}
