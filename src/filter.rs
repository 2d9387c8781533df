//! Фильтрация таблицы проката по диапазону дат (границы включительно).

use chrono::NaiveDate;

use crate::constants::DATE_FORMAT;
use crate::rental::RentalRecord;

/// Отрезок `[start, end]`. `start > end` допустим и не содержит ни одного дня.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    pub fn label(&self) -> String {
        format!(
            "{} – {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// Оставляет записи, дата которых попадает в `range`, в исходном порядке.
pub(crate) fn filter_by_date(records: &[RentalRecord], range: DateRange) -> Vec<RentalRecord> {
    if range.is_inverted() {
        return Vec::new();
    }
    records
        .iter()
        .filter(|record| range.contains(record.date))
        .copied()
        .collect()
}
