//! Chart descriptions and their Plotly figures.

use std::collections::BTreeMap;

use itertools::Itertools;
use plotly::color::{Rgb, Rgba};
use plotly::common::{Font, Line, Marker, Mode, Orientation, Title};
use plotly::layout::{Axis, BarMode, ItemClick, Legend, Margin, TicksDirection};
use plotly::{Bar, BoxPlot, Configuration, Layout, Plot, Scatter};

use crate::aggregate::{
    DayTypeCount, MonthlyTotal, UserType, WeatherCondition, WeatherObservation, WeatherTotal,
};
use crate::constants::DATE_FORMAT;
use crate::dashboard::DashboardView;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    Box,
    Bar,
    GroupedBar,
    LineWithMarkers,
    MultiLine,
}

/// Columns of the aggregated tables a chart can bind to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Weather,
    DayType,
    UserType,
    Month,
    Count,
    Total,
    Casual,
    Registered,
}

impl Field {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::DayType => "day type",
            Self::UserType => "user type",
            Self::Month => "month",
            Self::Count => "count",
            Self::Total => "total",
            Self::Casual => "casual",
            Self::Registered => "registered",
        }
    }
}

/// What a chart shows: kind, column bindings, title and axis labels.
///
/// Builders draw one trace per `y` field, and split by `hue` when it is set.
#[derive(Clone, Copy, Debug)]
pub struct ChartSpec {
    pub id: &'static str,
    pub heading: &'static str,
    pub kind: ChartKind,
    pub x: Field,
    pub y: &'static [Field],
    pub hue: Option<Field>,
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
}

pub const WEATHER_DISTRIBUTION: ChartSpec = ChartSpec {
    id: "weather-box",
    heading: "1. Distribution of rentals by weather condition",
    kind: ChartKind::Box,
    x: Field::Weather,
    y: &[Field::Total],
    hue: None,
    title: "Distribution of daily rentals by weather condition",
    x_label: LABEL_WEATHER,
    y_label: LABEL_RENTALS,
};

pub const WEATHER_TOTALS: ChartSpec = ChartSpec {
    id: "weather-bar",
    heading: "2. Effect of weather on bike rentals",
    kind: ChartKind::Bar,
    x: Field::Weather,
    y: &[Field::Total],
    hue: None,
    title: "Total rentals by weather condition",
    x_label: LABEL_WEATHER,
    y_label: LABEL_RENTALS,
};

pub const DAY_TYPE_TOTALS: ChartSpec = ChartSpec {
    id: "day-type-bar",
    heading: "3. Holidays, weekends and workdays",
    kind: ChartKind::GroupedBar,
    x: Field::DayType,
    y: &[Field::Count],
    hue: Some(Field::UserType),
    title: "Rentals by day type and user type",
    x_label: "Day type",
    y_label: LABEL_RENTALS,
};

pub const MONTHLY_TREND: ChartSpec = ChartSpec {
    id: "monthly-line",
    heading: "4. Rental trend over time",
    kind: ChartKind::LineWithMarkers,
    x: Field::Month,
    y: &[Field::Total],
    hue: None,
    title: "Monthly bike rentals",
    x_label: LABEL_MONTH,
    y_label: LABEL_RENTALS,
};

pub const USER_TREND: ChartSpec = ChartSpec {
    id: "user-line",
    heading: "5. Casual vs registered users",
    kind: ChartKind::MultiLine,
    x: Field::Month,
    y: &[Field::Casual, Field::Registered],
    hue: None,
    title: "Casual vs registered rentals per month",
    x_label: LABEL_MONTH,
    y_label: LABEL_RENTALS,
};

/// Render order of the dashboard.
pub const CHART_SPECS: [ChartSpec; 5] = [
    WEATHER_DISTRIBUTION,
    WEATHER_TOTALS,
    DAY_TYPE_TOTALS,
    MONTHLY_TREND,
    USER_TREND,
];

/// A spec paired with its figure; `plot` is `None` when there is nothing to draw.
pub(super) struct RenderedChart {
    pub spec: ChartSpec,
    pub plot: Option<Plot>,
}

const LABEL_WEATHER: &str = "Weather condition";
const LABEL_RENTALS: &str = "Rentals";
const LABEL_MONTH: &str = "Month";
const FONT_FAMILY: &str = "IBM Plex Sans, Arial, sans-serif";
const FONT_SIZE_BASE: usize = 12;
const FONT_SIZE_TITLE: usize = 15;
const FONT_SIZE_AXIS_TITLE: usize = 13;
const FONT_SIZE_AXIS_TICK: usize = 11;
const LINE_WIDTH: f64 = 2.2;
const MARKER_SIZE: usize = 7;
const MONTH_TICK_ANGLE: f64 = -45.0;
const LEGEND_X: f64 = 0.5;
const LEGEND_Y: f64 = 1.02;
const MARGIN_LEFT: usize = 70;
const MARGIN_RIGHT: usize = 30;
const MARGIN_TOP: usize = 70;
const MARGIN_BOTTOM: usize = 70;
const TICK_LENGTH: usize = 6;
const AXIS_GRID_WIDTH: usize = 1;
const COLOR_TEXT_BASE: (u8, u8, u8) = (40, 40, 40);
const COLOR_AXIS_TICK: (u8, u8, u8, f64) = (0, 0, 0, 0.45);
const COLOR_AXIS_LINE: (u8, u8, u8, f64) = (0, 0, 0, 0.35);
const COLOR_AXIS_GRID: (u8, u8, u8, f64) = (0, 0, 0, 0.08);
const COLOR_TOTAL: (u8, u8, u8) = (36, 100, 166);
const COLOR_CASUAL: (u8, u8, u8) = (221, 132, 82);
const COLOR_REGISTERED: (u8, u8, u8) = (76, 114, 176);
const WEATHER_COLORS: [(u8, u8, u8); 4] = [
    (76, 114, 176),
    (129, 178, 154),
    (221, 132, 82),
    (196, 78, 82),
];

fn rgb(color: (u8, u8, u8)) -> Rgb {
    Rgb::new(color.0, color.1, color.2)
}

fn rgba(color: (u8, u8, u8, f64)) -> Rgba {
    Rgba::new(color.0, color.1, color.2, color.3)
}

const fn weather_color(condition: WeatherCondition) -> (u8, u8, u8) {
    match condition {
        WeatherCondition::Clear => WEATHER_COLORS[0],
        WeatherCondition::Misty => WEATHER_COLORS[1],
        WeatherCondition::LightPrecipitation => WEATHER_COLORS[2],
        WeatherCondition::HeavyPrecipitation => WEATHER_COLORS[3],
    }
}

const fn user_color(user_type: UserType) -> (u8, u8, u8) {
    match user_type {
        UserType::Casual => COLOR_CASUAL,
        UserType::Registered => COLOR_REGISTERED,
    }
}

const fn field_color(field: Field) -> (u8, u8, u8) {
    match field {
        Field::Casual => COLOR_CASUAL,
        Field::Registered => COLOR_REGISTERED,
        _ => COLOR_TOTAL,
    }
}

/// Monthly value for a `y` binding; `None` for fields the monthly table lacks.
const fn month_value(month: &MonthlyTotal, field: Field) -> Option<u64> {
    match field {
        Field::Total => Some(month.total),
        Field::Casual => Some(month.casual),
        Field::Registered => Some(month.registered),
        _ => None,
    }
}

/// Builds all five charts in render order.
pub(super) fn build_charts(view: &DashboardView) -> Vec<RenderedChart> {
    CHART_SPECS
        .into_iter()
        .map(|spec| {
            let plot = match spec.kind {
                ChartKind::Box => weather_box(&spec, &view.observations),
                ChartKind::Bar => weather_bar(&spec, &view.weather_totals),
                ChartKind::GroupedBar => day_type_bar(&spec, &view.day_types),
                ChartKind::LineWithMarkers => monthly_line(&spec, &view.months),
                ChartKind::MultiLine => user_lines(&spec, &view.months),
            };
            RenderedChart { spec, plot }
        })
        .collect()
}

fn weather_box(spec: &ChartSpec, observations: &[WeatherObservation]) -> Option<Plot> {
    if observations.is_empty() {
        return None;
    }

    let mut plot = Plot::new();
    // One trace per condition keeps the per-category colours.
    for condition in WeatherCondition::ALL {
        let values = observations
            .iter()
            .filter(|observation| observation.condition == condition)
            .map(|observation| observation.total_count)
            .collect_vec();
        if values.is_empty() {
            continue;
        }
        let labels = vec![condition.label(); values.len()];
        plot.add_trace(
            BoxPlot::new_xy(labels, values)
                .name(condition.label())
                .marker(Marker::new().color(rgb(weather_color(condition)))),
        );
    }
    plot.set_layout(base_layout(spec).show_legend(false));
    plot.set_configuration(Configuration::new().responsive(true));
    Some(plot)
}

fn weather_bar(spec: &ChartSpec, totals: &[WeatherTotal]) -> Option<Plot> {
    if totals.is_empty() {
        return None;
    }

    let mut plot = Plot::new();
    for total in totals {
        plot.add_trace(
            Bar::new(vec![total.condition.label()], vec![total.total_count])
                .name(total.condition.label())
                .marker(Marker::new().color(rgb(weather_color(total.condition)))),
        );
    }
    // Bars sit on distinct categories; overlay keeps them full width.
    plot.set_layout(
        base_layout(spec)
            .bar_mode(BarMode::Overlay)
            .show_legend(false),
    );
    plot.set_configuration(Configuration::new().responsive(true));
    Some(plot)
}

fn day_type_bar(spec: &ChartSpec, counts: &[DayTypeCount]) -> Option<Plot> {
    if counts.is_empty() {
        return None;
    }

    let mut plot = Plot::new();
    if spec.hue == Some(Field::UserType) {
        for user_type in UserType::ALL {
            let (day_types, values): (Vec<_>, Vec<_>) = counts
                .iter()
                .filter(|row| row.user_type == user_type)
                .map(|row| (row.day_type.label(), row.count))
                .unzip();
            plot.add_trace(
                Bar::new(day_types, values)
                    .name(user_type.label())
                    .marker(Marker::new().color(rgb(user_color(user_type)))),
            );
        }
    } else {
        let totals = counts.iter().fold(BTreeMap::new(), |mut acc, row| {
            *acc.entry(row.day_type).or_insert(0_u64) += row.count;
            acc
        });
        let (day_types, values): (Vec<_>, Vec<_>) = totals
            .into_iter()
            .map(|(day_type, count)| (day_type.label(), count))
            .unzip();
        plot.add_trace(
            Bar::new(day_types, values)
                .name(Field::Count.label())
                .marker(Marker::new().color(rgb(COLOR_TOTAL))),
        );
    }
    plot.set_layout(
        with_legend(base_layout(spec))
            .bar_mode(BarMode::Group)
            .show_legend(spec.hue.is_some()),
    );
    plot.set_configuration(Configuration::new().responsive(true));
    Some(plot)
}

fn monthly_line(spec: &ChartSpec, months: &[MonthlyTotal]) -> Option<Plot> {
    if months.is_empty() {
        return None;
    }

    let dates = months.iter().map(month_label).collect_vec();
    let hover = months
        .iter()
        .map(|month| {
            format!(
                "{} days · {} holidays · {} working days",
                month.days, month.holidays, month.working_days
            )
        })
        .collect_vec();
    let mut plot = Plot::new();
    for &field in spec.y {
        let values = months
            .iter()
            .filter_map(|month| month_value(month, field))
            .collect_vec();
        plot.add_trace(
            Scatter::new(dates.clone(), values)
                .mode(Mode::LinesMarkers)
                .text_array(hover.clone())
                .line(Line::new().color(rgb(field_color(field))).width(LINE_WIDTH))
                .marker(Marker::new().size(MARKER_SIZE).color(rgb(field_color(field))))
                .name(field.label()),
        );
    }
    plot.set_layout(
        base_layout(spec).show_legend(spec.y.len() > 1),
    );
    plot.set_configuration(Configuration::new().responsive(true));
    Some(plot)
}

fn user_lines(spec: &ChartSpec, months: &[MonthlyTotal]) -> Option<Plot> {
    if months.is_empty() {
        return None;
    }

    let dates = months.iter().map(month_label).collect_vec();
    let mut plot = Plot::new();
    for &field in spec.y {
        let values = months
            .iter()
            .filter_map(|month| month_value(month, field))
            .collect_vec();
        plot.add_trace(
            Scatter::new(dates.clone(), values)
                .mode(Mode::Lines)
                .line(Line::new().color(rgb(field_color(field))).width(LINE_WIDTH))
                .name(field.label()),
        );
    }
    plot.set_layout(
        with_legend(base_layout(spec)).show_legend(true),
    );
    plot.set_configuration(Configuration::new().responsive(true));
    Some(plot)
}

fn month_label(month: &MonthlyTotal) -> String {
    month.month_end.format(DATE_FORMAT).to_string()
}

fn base_layout(spec: &ChartSpec) -> Layout {
    Layout::new()
        .title(Title::with_text(spec.title).font(Font::new().size(FONT_SIZE_TITLE)))
        .font(
            Font::new()
                .family(FONT_FAMILY)
                .size(FONT_SIZE_BASE)
                .color(rgb(COLOR_TEXT_BASE)),
        )
        .auto_size(true)
        .margin(
            Margin::new()
                .left(MARGIN_LEFT)
                .right(MARGIN_RIGHT)
                .top(MARGIN_TOP)
                .bottom(MARGIN_BOTTOM),
        )
        .x_axis(x_axis(spec))
        .y_axis(styled_axis(spec.y_label).separate_thousands(true))
}

fn styled_axis(title: &str) -> Axis {
    Axis::new()
        .title(Title::with_text(title).font(Font::new().size(FONT_SIZE_AXIS_TITLE)))
        .tick_font(Font::new().size(FONT_SIZE_AXIS_TICK))
        .ticks(TicksDirection::Outside)
        .tick_length(TICK_LENGTH)
        .tick_color(rgba(COLOR_AXIS_TICK))
        .show_line(true)
        .line_color(rgba(COLOR_AXIS_LINE))
        .grid_color(rgba(COLOR_AXIS_GRID))
        .grid_width(AXIS_GRID_WIDTH)
        .auto_margin(true)
}

fn x_axis(spec: &ChartSpec) -> Axis {
    let axis = styled_axis(spec.x_label);
    if spec.x == Field::Month {
        axis.tick_angle(MONTH_TICK_ANGLE)
    } else {
        axis
    }
}

fn with_legend(layout: Layout) -> Layout {
    layout.legend(
        Legend::new()
            .orientation(Orientation::Horizontal)
            .item_click(ItemClick::False)
            .item_double_click(ItemClick::False)
            .x(LEGEND_X)
            .x_anchor(plotly::common::Anchor::Center)
            .y(LEGEND_Y)
            .y_anchor(plotly::common::Anchor::Bottom),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::build_view;
    use crate::filter::DateRange;
    use crate::rental::tests::record;
    use chrono::NaiveDate;

    fn view_for(records: &[crate::rental::RentalRecord], range: DateRange) -> DashboardView {
        build_view(records, range).unwrap()
    }

    fn full_range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2011, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2011, 12, 31).unwrap(),
        )
    }

    #[test]
    fn test_specs_are_in_render_order() {
        let kinds = CHART_SPECS.iter().map(|spec| spec.kind).collect_vec();
        assert_eq!(
            kinds,
            vec![
                ChartKind::Box,
                ChartKind::Bar,
                ChartKind::GroupedBar,
                ChartKind::LineWithMarkers,
                ChartKind::MultiLine,
            ]
        );
        assert_eq!(DAY_TYPE_TOTALS.hue, Some(Field::UserType));
        assert!(CHART_SPECS.iter().map(|spec| spec.id).all_unique());
    }

    #[test]
    fn test_all_charts_built_for_data() {
        let records = vec![
            record((2011, 1, 1), 1, false, false, 10, 20),
            record((2011, 2, 1), 3, false, true, 30, 40),
        ];

        let charts = build_charts(&view_for(&records, full_range()));

        assert_eq!(charts.len(), 5);
        assert!(charts.iter().all(|chart| chart.plot.is_some()));
    }

    #[test]
    fn test_empty_range_yields_placeholders() {
        let records = vec![record((2011, 1, 1), 1, false, false, 10, 20)];
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2011, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2011, 5, 1).unwrap(),
        );

        let charts = build_charts(&view_for(&records, range));

        assert_eq!(charts.len(), 5);
        assert!(charts.iter().all(|chart| chart.plot.is_none()));
    }

    #[test]
    fn test_grouped_bar_has_series_per_user_type() {
        let records = vec![
            record((2011, 1, 1), 1, true, false, 10, 20),
            record((2011, 1, 2), 1, false, false, 30, 40),
        ];

        let plot = day_type_bar(&DAY_TYPE_TOTALS, &view_for(&records, full_range()).day_types)
            .unwrap();
        let json = plot.to_json();

        assert!(json.contains("\"casual\""));
        assert!(json.contains("\"registered\""));
        assert!(json.contains("\"group\""));
    }

    #[test]
    fn test_monthly_line_uses_month_end_dates() {
        let records = vec![
            record((2011, 1, 5), 1, false, true, 1, 2),
            record((2011, 3, 5), 1, false, true, 3, 4),
        ];

        let plot = monthly_line(&MONTHLY_TREND, &view_for(&records, full_range()).months).unwrap();
        let json = plot.to_json();

        assert!(json.contains("2011-01-31"));
        assert!(json.contains("2011-03-31"));
        assert!(!json.contains("2011-02-28"));
        assert!(json.contains("lines+markers"));
        assert!(json.contains("tickangle"));
    }

    #[test]
    fn test_grouped_bar_without_hue_sums_user_types() {
        let records = vec![
            record((2011, 1, 1), 1, true, false, 10, 20),
            record((2011, 1, 2), 1, false, false, 30, 40),
        ];
        let spec = ChartSpec {
            hue: None,
            ..DAY_TYPE_TOTALS
        };

        let plot = day_type_bar(&spec, &view_for(&records, full_range()).day_types).unwrap();
        let json = plot.to_json();

        assert!(!json.contains("\"casual\""));
        assert!(json.contains("\"count\""));
        assert!(json.contains("30"));
        assert!(json.contains("70"));
    }

    #[test]
    fn test_user_lines_follow_y_bindings() {
        let records = vec![record((2011, 1, 5), 1, false, true, 11, 22)];
        let months = view_for(&records, full_range()).months;
        let registered_only = ChartSpec {
            y: &[Field::Registered],
            ..USER_TREND
        };

        let both = user_lines(&USER_TREND, &months).unwrap().to_json();
        let single = user_lines(&registered_only, &months).unwrap().to_json();

        assert!(both.contains("\"casual\"") && both.contains("\"registered\""));
        assert!(!single.contains("\"casual\""));
        assert!(single.contains("\"registered\""));
    }
}
