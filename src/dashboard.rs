//! Конвейер «фильтр → агрегаты» для одного обновления дашборда.

use tracing::debug;

use crate::aggregate::{
    DayTypeCount, MonthlyTotal, RangeSummary, WeatherObservation, WeatherTotal, day_type_totals,
    label_weather, monthly_totals, weather_totals,
};
use crate::error::Result;
use crate::filter::{DateRange, filter_by_date};
use crate::rental::RentalRecord;

/// Всё, что нужно для отрисовки одного диапазона дат.
#[derive(Clone, Debug)]
pub struct DashboardView {
    pub range: DateRange,
    pub summary: RangeSummary,
    pub observations: Vec<WeatherObservation>,
    pub weather_totals: Vec<WeatherTotal>,
    pub day_types: Vec<DayTypeCount>,
    pub months: Vec<MonthlyTotal>,
}

impl DashboardView {
    pub const fn is_empty(&self) -> bool {
        self.summary.days == 0
    }
}

/// Пересчитывает все агрегаты для `range` с нуля.
pub(crate) fn build_view(records: &[RentalRecord], range: DateRange) -> Result<DashboardView> {
    let filtered = filter_by_date(records, range);
    debug!(
        start = %range.start,
        end = %range.end,
        rows = filtered.len(),
        "Filtered rental table"
    );

    Ok(DashboardView {
        range,
        summary: RangeSummary::of(&filtered),
        observations: label_weather(&filtered)?,
        weather_totals: weather_totals(&filtered)?,
        day_types: day_type_totals(&filtered),
        months: monthly_totals(&filtered),
    })
}
