//! Метки и групповые суммы по отфильтрованной таблице проката.
//!
//! Все функции зависят только от входного среза; между вызовами ничего
//! не кэшируется.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};

use crate::error::{DashboardError, Result};
use crate::rental::RentalRecord;

/// Коды `weathersit` 1..=4 из набора данных.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WeatherCondition {
    Clear,
    Misty,
    LightPrecipitation,
    HeavyPrecipitation,
}

impl WeatherCondition {
    pub const ALL: [Self; 4] = [
        Self::Clear,
        Self::Misty,
        Self::LightPrecipitation,
        Self::HeavyPrecipitation,
    ];

    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Clear),
            2 => Some(Self::Misty),
            3 => Some(Self::LightPrecipitation),
            4 => Some(Self::HeavyPrecipitation),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Misty => "Misty/Cloudy",
            Self::LightPrecipitation => "Light Rain/Snow",
            Self::HeavyPrecipitation => "Heavy Rain/Storm",
        }
    }

    fn of(record: &RentalRecord) -> Result<Self> {
        Self::from_code(record.weather_code).ok_or(DashboardError::Label {
            code: record.weather_code,
            date: record.date,
        })
    }
}

/// Тип дня; праздник важнее выходного.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DayType {
    Holiday,
    Weekend,
    Workday,
}

impl DayType {
    pub const fn classify(record: &RentalRecord) -> Self {
        if record.holiday {
            Self::Holiday
        } else if !record.working_day {
            Self::Weekend
        } else {
            Self::Workday
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Holiday => "Holiday",
            Self::Weekend => "Weekend",
            Self::Workday => "Workday",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UserType {
    Casual,
    Registered,
}

impl UserType {
    pub const ALL: [Self; 2] = [Self::Casual, Self::Registered];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Registered => "registered",
        }
    }
}

/// Один размеченный день, вход для boxplot по погоде.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeatherObservation {
    pub condition: WeatherCondition,
    pub total_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeatherTotal {
    pub condition: WeatherCondition,
    pub total_count: u64,
}

/// Строка в длинном формате: одна на пару (тип дня, тип пользователя).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayTypeCount {
    pub day_type: DayType,
    pub user_type: UserType,
    pub count: u64,
}

/// Суммы за календарный месяц с ключом по последнему дню месяца.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonthlyTotal {
    pub month_end: NaiveDate,
    pub days: u32,
    pub holidays: u32,
    pub working_days: u32,
    pub casual: u64,
    pub registered: u64,
    pub total: u64,
}

impl MonthlyTotal {
    fn add(&mut self, record: &RentalRecord) {
        self.days += 1;
        self.holidays += u32::from(record.holiday);
        self.working_days += u32::from(record.working_day);
        self.casual += u64::from(record.casual_count);
        self.registered += u64::from(record.registered_count);
        self.total += u64::from(record.total_count);
    }
}

/// Итоговые числа для выбранного диапазона.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RangeSummary {
    pub days: usize,
    pub casual: u64,
    pub registered: u64,
    pub total: u64,
}

impl RangeSummary {
    pub fn of(records: &[RentalRecord]) -> Self {
        records.iter().fold(
            Self {
                days: records.len(),
                ..Self::default()
            },
            |mut acc, record| {
                acc.casual += u64::from(record.casual_count);
                acc.registered += u64::from(record.registered_count);
                acc.total += u64::from(record.total_count);
                acc
            },
        )
    }
}

/// Размечает все записи; первый неизвестный код прерывает работу с ошибкой `Label`.
pub(crate) fn label_weather(records: &[RentalRecord]) -> Result<Vec<WeatherObservation>> {
    records
        .iter()
        .map(|record| {
            Ok(WeatherObservation {
                condition: WeatherCondition::of(record)?,
                total_count: record.total_count,
            })
        })
        .collect()
}

/// Суммирует `total_count` по погодным условиям в порядке кодов.
pub(crate) fn weather_totals(records: &[RentalRecord]) -> Result<Vec<WeatherTotal>> {
    let buckets = records
        .iter()
        .try_fold(BTreeMap::new(), |mut acc, record| {
            *acc.entry(WeatherCondition::of(record)?).or_insert(0_u64) +=
                u64::from(record.total_count);
            Ok::<_, DashboardError>(acc)
        })?;

    Ok(buckets
        .into_iter()
        .map(|(condition, total_count)| WeatherTotal {
            condition,
            total_count,
        })
        .collect())
}

/// Суммирует casual и registered по типам дня и разворачивает в длинный формат.
pub(crate) fn day_type_totals(records: &[RentalRecord]) -> Vec<DayTypeCount> {
    let buckets = records.iter().fold(
        BTreeMap::<DayType, (u64, u64)>::new(),
        |mut acc, record| {
            let entry = acc.entry(DayType::classify(record)).or_default();
            entry.0 += u64::from(record.casual_count);
            entry.1 += u64::from(record.registered_count);
            acc
        },
    );

    buckets
        .into_iter()
        .flat_map(|(day_type, (casual, registered))| {
            UserType::ALL.into_iter().map(move |user_type| DayTypeCount {
                day_type,
                user_type,
                count: match user_type {
                    UserType::Casual => casual,
                    UserType::Registered => registered,
                },
            })
        })
        .collect()
}

/// Группирует записи по концу календарного месяца. Месяцы без записей пропускаются.
pub(crate) fn monthly_totals(records: &[RentalRecord]) -> Vec<MonthlyTotal> {
    records
        .iter()
        .fold(BTreeMap::<NaiveDate, MonthlyTotal>::new(), |mut acc, record| {
            let month_end = month_end(record.date);
            acc.entry(month_end)
                .or_insert_with(|| MonthlyTotal {
                    month_end,
                    ..MonthlyTotal::default()
                })
                .add(record);
            acc
        })
        .into_values()
        .collect()
}

fn month_end(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}
