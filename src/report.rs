//! Сборка автономной HTML-страницы из данных дашборда.

mod chart;
mod page;

use std::fs;
use std::path::Path;

use chrono::Utc;
use minify_html::{Cfg, minify};

use crate::dashboard::DashboardView;
use crate::error::Result;
use crate::filter::DateRange;

/// Параметры оформления страницы вокруг графиков.
#[derive(Clone, Copy, Debug)]
pub struct PageOptions {
    /// Границы данных, служат min/max для полей выбора дат.
    pub bounds: Option<DateRange>,
    /// Форма выбора дат есть только на странице сервера, не в файле от `render`.
    pub interactive: bool,
    pub minify_html: bool,
}

pub fn render_dashboard(view: &DashboardView, options: &PageOptions) -> String {
    let charts = chart::build_charts(view);
    let page = page::render_dashboard_page(view, &charts, options, Utc::now());
    finish(page, options.minify_html)
}

pub fn render_error_page(message: &str, minify_html: bool) -> String {
    finish(page::render_error_page(message, Utc::now()), minify_html)
}

/// Записывает страницу, создавая директорию при необходимости.
pub fn write_html(html: &str, output_html: &Path) -> Result<()> {
    if let Some(parent) = output_html.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_html, html)?;
    Ok(())
}

fn finish(page: String, minify_html: bool) -> String {
    if !minify_html {
        return page;
    }
    let cfg = Cfg {
        minify_css: true,
        ..Cfg::default()
    };
    String::from_utf8(minify(page.as_bytes(), &cfg)).unwrap_or(page)
}
