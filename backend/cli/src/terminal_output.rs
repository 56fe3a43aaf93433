//! Terminal output: ANSI styling, notes on stderr, menu tables on stdout.

use menusnap_core::{DishImageSet, Menu};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

// Notes go to stderr so stdout carries only the menu.

pub fn note_progress(msg: &str) {
    if supports_color() {
        eprintln!("{CYAN}{BOLD}›{RESET} {msg}");
    } else {
        eprintln!("... {msg}");
    }
}

pub fn note_warn(msg: &str) {
    if supports_color() {
        eprintln!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        eprintln!("WARN: {msg}");
    }
}

pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

pub fn note_success(msg: &str) {
    if supports_color() {
        eprintln!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        eprintln!("OK: {msg}");
    }
}

/// Column alignment.
pub enum Align {
    Left,
    Right,
}

/// A table column definition.
pub struct Column {
    pub header: String,
    pub align: Align,
}

impl Column {
    pub fn left(header: impl Into<String>) -> Self {
        Self { header: header.into(), align: Align::Left }
    }
    pub fn right(header: impl Into<String>) -> Self {
        Self { header: header.into(), align: Align::Right }
    }
}

/// Render a table with given columns and rows.
pub fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let num_cols = columns.len();
    let mut widths: Vec<usize> = columns
        .iter()
        .map(|c| strip_ansi(&c.header).chars().count())
        .collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(num_cols) {
            widths[i] = widths[i].max(strip_ansi(cell).chars().count());
        }
    }

    let mut out = String::new();

    let header_cells: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| pad_cell(&col.header, widths[i], &col.align))
        .collect();
    let header = header_cells.join("  ");
    if supports_color() {
        out.push_str(&format!("{BOLD}  {header}  {RESET}\n"));
    } else {
        out.push_str(&format!("  {header}  \n"));
    }

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}  \n", sep.join("  ")));

    for row in rows {
        let cells: Vec<String> = (0..num_cols)
            .map(|i| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                pad_cell(cell, widths[i], &columns[i].align)
            })
            .collect();
        out.push_str(&format!("  {}  \n", cells.join("  ")));
    }

    out
}

fn pad_cell(s: &str, width: usize, align: &Align) -> String {
    let pad = width.saturating_sub(strip_ansi(s).chars().count());
    match align {
        Align::Left => format!("{s}{}", " ".repeat(pad)),
        Align::Right => format!("{}{s}", " ".repeat(pad)),
    }
}

/// Render an extracted menu, one table per section.
///
/// Prices are shown only when every dish on the menu has one.
pub fn render_menu(menu: &Menu, images: &DishImageSet) -> String {
    let show_prices = menu.all_dishes_priced();
    let mut out = String::new();

    let title = menu.restaurant_name.as_deref().unwrap_or("Menu");
    out.push_str(&format!("\n{title}\n"));

    for section in &menu.sections {
        out.push_str(&format!("\n{}\n", section.name));

        let mut columns = vec![Column::left("Dish")];
        if show_prices {
            columns.push(Column::right("Price"));
        }
        columns.push(Column::left("Dietary"));
        columns.push(Column::right("Photos"));

        let rows: Vec<Vec<String>> = section
            .dishes
            .iter()
            .map(|dish| {
                let mut row = vec![dish.name.clone()];
                if show_prices {
                    row.push(dish.price.map(|p| format!("{p:.2}")).unwrap_or_default());
                }
                row.push(
                    dish.dietary_tags
                        .iter()
                        .map(String::as_str)
                        .collect::<Vec<_>>()
                        .join(", "),
                );
                row.push(images.images_for(&dish.name).len().to_string());
                row
            })
            .collect();
        out.push_str(&render_table(&columns, &rows));
    }

    out.push_str(&format!(
        "\n{} dishes, {} with photos\n",
        menu.dish_count(),
        menu.dishes()
            .filter(|d| !images.images_for(&d.name).is_empty())
            .count()
    ));
    out
}

/// Dish image listing for the `images` command.
pub fn render_images(images: &DishImageSet) -> String {
    let mut names: Vec<&str> = images.dish_names().collect();
    names.sort_unstable();
    let rows: Vec<Vec<String>> = names
        .into_iter()
        .map(|name| {
            let urls = images.images_for(name);
            vec![
                name.to_string(),
                urls.len().to_string(),
                urls.first().cloned().unwrap_or_default(),
            ]
        })
        .collect();
    render_table(
        &[Column::left("Dish"), Column::right("Photos"), Column::left("First photo")],
        &rows,
    )
}
