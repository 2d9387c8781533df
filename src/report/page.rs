//! HTML-страница вокруг Plotly-графиков.

use chrono::{DateTime, Utc};
use maud::{DOCTYPE, Markup, PreEscaped, html};

use super::PageOptions;
use super::chart::RenderedChart;
use crate::constants::DATE_FORMAT;
use crate::dashboard::DashboardView;

const PAGE_TITLE: &str = "Bike Sharing Dashboard";
const PAGE_SUBTITLE: &str = "Daily bike rentals by weather, day type and month.";
const PAGE_DESCRIPTION: &str = "Interactive dashboard of historical bike-sharing rentals: weather impact, holidays and weekends, monthly trends and casual vs registered users.";
const ERROR_TITLE: &str = "The dashboard could not be rendered";
const EMPTY_CHART: &str = "No data for the selected range";
const INVERTED_RANGE_NOTICE: &str = "Start date is after end date, so no days are selected.";
const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M UTC";
const GOOGLE_FONTS_CSS: &str =
    "https://fonts.googleapis.com/css2?family=IBM+Plex+Sans:wght@400;500;600&display=swap";
const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const STYLE: &str = "
:root {
    color-scheme: light;
    --bg: #f7f6f2;
    --card: #ffffff;
    --ink: #1f2430;
    --muted: #56606f;
    --accent: #2464a6;
    --border: rgba(31, 36, 48, 0.08);
}
* { box-sizing: border-box; }
body {
    margin: 0;
    background: var(--bg);
    color: var(--ink);
    font-family: \"IBM Plex Sans\", Arial, sans-serif;
}
.page {
    max-width: 1320px;
    margin: 40px auto 60px;
    padding: 0 24px;
}
.title { font-size: 26px; font-weight: 600; margin: 0; }
.subtitle { margin: 6px 0 22px; color: var(--muted); font-size: 13px; }
.layout {
    display: grid;
    grid-template-columns: 260px minmax(0, 1fr);
    gap: 22px;
    align-items: start;
}
.sidebar {
    position: sticky;
    top: 20px;
    background: var(--card);
    border-radius: 18px;
    padding: 18px;
    border: 1px solid var(--border);
}
.sidebar h2 { margin: 0 0 12px; font-size: 15px; font-weight: 600; }
.sidebar label {
    display: block;
    margin: 10px 0 4px;
    font-size: 11px;
    text-transform: uppercase;
    letter-spacing: 0.08em;
    color: var(--muted);
}
.sidebar input {
    width: 100%;
    font: inherit;
    padding: 6px 8px;
    border-radius: 8px;
    border: 1px solid var(--border);
}
.sidebar button {
    margin-top: 14px;
    width: 100%;
    font: inherit;
    padding: 8px 14px;
    border-radius: 999px;
    border: 1px solid rgba(36, 100, 166, 0.25);
    background: rgba(36, 100, 166, 0.08);
    color: var(--accent);
    font-weight: 500;
    cursor: pointer;
}
.range-label { font-size: 13px; }
.notice {
    margin-top: 12px;
    font-size: 12px;
    color: #b03a2e;
}
.summary-grid {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
    gap: 14px;
    margin-bottom: 18px;
}
.summary-card {
    background: var(--card);
    border-radius: 16px;
    padding: 14px 16px;
    border: 1px solid var(--border);
}
.summary-label {
    font-size: 11px;
    text-transform: uppercase;
    letter-spacing: 0.08em;
    color: var(--muted);
}
.summary-value { font-size: 20px; font-weight: 600; margin-top: 6px; }
.card {
    background: var(--card);
    border-radius: 18px;
    padding: 16px;
    border: 1px solid var(--border);
    margin-bottom: 18px;
    overflow-x: auto;
}
.card h2 { margin: 0 0 10px; font-size: 16px; font-weight: 600; }
.chart { width: 100%; min-height: 420px; }
.empty {
    min-height: 120px;
    display: flex;
    align-items: center;
    justify-content: center;
    color: var(--muted);
    border: 1px dashed var(--border);
    border-radius: 12px;
}
.conclusions h3 { font-size: 14px; margin: 16px 0 6px; }
.conclusions li { margin-bottom: 6px; font-size: 13px; line-height: 1.5; }
.error {
    background: var(--card);
    border-radius: 18px;
    padding: 24px;
    border: 1px solid rgba(176, 58, 46, 0.4);
    color: #b03a2e;
}
footer {
    margin-top: 16px;
    font-size: 12px;
    color: var(--muted);
    text-align: right;
}
@media (max-width: 900px) {
    .layout { grid-template-columns: 1fr; }
    .sidebar { position: static; }
}
";

pub(super) fn render_dashboard_page(
    view: &DashboardView,
    charts: &[RenderedChart],
    options: &PageOptions,
    generated_at: DateTime<Utc>,
) -> String {
    let generated_label = generated_at.format(GENERATED_AT_FORMAT).to_string();
    let start = view.range.start.format(DATE_FORMAT).to_string();
    let end = view.range.end.format(DATE_FORMAT).to_string();
    let (min_date, max_date) = options.bounds.map_or((None, None), |bounds| {
        (
            Some(bounds.start.format(DATE_FORMAT).to_string()),
            Some(bounds.end.format(DATE_FORMAT).to_string()),
        )
    });
    let summary = view.summary;

    let page = html! {
        (DOCTYPE)
        html lang="en" {
            (head(PAGE_TITLE))
            body {
                div class="page" {
                    header {
                        h1 class="title" { (PAGE_TITLE) }
                        p class="subtitle" { (PAGE_SUBTITLE) }
                    }
                    div class="layout" {
                        aside class="sidebar" {
                            h2 { "Date range" }
                            @if options.interactive {
                                form method="get" action="/" {
                                    label for="start" { "Start date" }
                                    input type="date" id="start" name="start" value=(start)
                                        min=[min_date.as_deref()] max=[max_date.as_deref()]
                                        onchange="this.form.submit()";
                                    label for="end" { "End date" }
                                    input type="date" id="end" name="end" value=(end)
                                        min=[min_date.as_deref()] max=[max_date.as_deref()]
                                        onchange="this.form.submit()";
                                    button type="submit" { "Apply" }
                                }
                            } @else {
                                p class="range-label" { (view.range.label()) }
                            }
                            @if view.range.is_inverted() {
                                p class="notice" { (INVERTED_RANGE_NOTICE) }
                            }
                        }
                        main {
                            section class="summary-grid" {
                                (summary_card("Days", summary.days.to_string()))
                                (summary_card("Total rentals", format_count(summary.total)))
                                (summary_card("Casual", format_count(summary.casual)))
                                (summary_card("Registered", format_count(summary.registered)))
                            }
                            @for chart in charts {
                                section class="card" {
                                    h2 { (chart.spec.heading) }
                                    @if let Some(plot) = &chart.plot {
                                        div class="chart" {
                                            (PreEscaped(plot.to_inline_html(Some(chart.spec.id))))
                                        }
                                    } @else {
                                        div class="empty" id=(chart.spec.id) { (EMPTY_CHART) }
                                    }
                                }
                            }
                            (conclusions())
                        }
                    }
                    footer {
                        "Version: " (APP_VERSION) " · Generated: " (generated_label)
                        " · Range: " (view.range.label())
                    }
                }
            }
        }
    };
    page.into_string()
}

pub(super) fn render_error_page(message: &str, generated_at: DateTime<Utc>) -> String {
    let generated_label = generated_at.format(GENERATED_AT_FORMAT).to_string();
    let page = html! {
        (DOCTYPE)
        html lang="en" {
            (head(ERROR_TITLE))
            body {
                div class="page" {
                    h1 class="title" { (PAGE_TITLE) }
                    div class="error" role="alert" {
                        h2 { (ERROR_TITLE) }
                        p { (message) }
                    }
                    footer { "Version: " (APP_VERSION) " · Generated: " (generated_label) }
                }
            }
        }
    };
    page.into_string()
}

fn head(title: &str) -> Markup {
    html! {
        head {
            meta charset="utf-8";
            meta name="viewport" content="width=device-width, initial-scale=1";
            meta name="description" content=(PAGE_DESCRIPTION);
            title { (title) }
            link rel="preconnect" href="https://fonts.googleapis.com";
            link rel="stylesheet" href=(GOOGLE_FONTS_CSS);
            script src=(PLOTLY_CDN) {}
            style { (PreEscaped(STYLE)) }
        }
    }
}

fn summary_card(label: &str, value: String) -> Markup {
    html! {
        div class="summary-card" {
            div class="summary-label" { (label) }
            div class="summary-value" { (value) }
        }
    }
}

fn conclusions() -> Markup {
    html! {
        section class="card conclusions" {
            h2 { "Conclusions" }
            h3 { "1. How does weather affect the number of rentals?" }
            ul {
                li {
                    "Weather has a significant effect. Heavy rain and storms reduce rentals, "
                    "while clear and lightly cloudy days bring more people to rent a bike."
                }
                li {
                    "Rentals are clearly higher on days with good weather (condition 1: clear or "
                    "partly cloudy) than on days with harsher conditions."
                }
                li {
                    "The better the weather, the higher the number of rentals: people prefer to "
                    "cycle when conditions allow it."
                }
            }
            h3 { "2. How do holidays, workdays and weekends affect rentals?" }
            ul {
                li {
                    "Workdays, Fridays in particular, show more rentals than holidays or weekends."
                }
            }
            h3 { "3. How do rentals trend over time, and which month peaks?" }
            ul {
                li { "Year on year, rentals grow from 2011 to 2012." }
                li {
                    "Month to month, warm months from June to September have the most rentals, "
                    "while winter (November to February) shows a drop."
                }
                li {
                    "The peak is June in 2011 and September in 2012, when clear weather, warm "
                    "temperatures and longer days bring out more riders."
                }
                li {
                    "Season and weather strongly shape rentals, with the highest numbers in the "
                    "summer months."
                }
            }
            h3 { "4. How do casual and registered users compare?" }
            ul {
                li { "Registered users rent bikes far more often than casual users." }
            }
        }
    }
}

/// Разделяет тысячи узким пробелом: `1234567` → `1 234 567`.
fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push('\u{202f}');
        }
        out.push(ch);
    }
    out
}
