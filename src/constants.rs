//! Общие константы форматирования, чтобы не дублировать форматы дат и пути.

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_DATA_CSV: &str = "data/day.csv";
