use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use tracker_ingest::SplitSummary;

use crate::types::{FileOutcome, FileReport, ImportResult};

pub fn print_summary(result: &ImportResult) {
    if result.reports.is_empty() {
        println!("No input files found.");
        return;
    }
    println!("{}", summary_table(result));
    let failed = result.failed_files();
    if failed > 0 {
        eprintln!("{failed} of {} file(s) failed.", result.reports.len());
    }
}

pub fn summary_table(result: &ImportResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Rows"),
        header_cell("Status"),
        header_cell("Moved to"),
        header_cell("Reason"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Center);
    for report in &result.reports {
        table.add_row(report_row(report));
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(result.rows_processed()).add_attribute(Attribute::Bold),
        Cell::new(format!(
            "{} ok / {} failed",
            result.reports.len() - result.failed_files(),
            result.failed_files()
        ))
        .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    table
}

pub fn print_split_summary(summary: &SplitSummary) {
    println!(
        "Wrote {} file(s) to {}",
        summary.files.len(),
        summary.output_dir.display()
    );
}

fn report_row(report: &FileReport) -> Vec<Cell> {
    let name = report
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (status, reason) = match &report.outcome {
        FileOutcome::Done => (
            Cell::new("done").fg(Color::Green).add_attribute(Attribute::Bold),
            dim_cell("-"),
        ),
        FileOutcome::Failed { line, reason } => {
            let reason = match line {
                Some(line) => format!("line {line}: {reason}"),
                None => reason.clone(),
            };
            (
                Cell::new("failed").fg(Color::Red).add_attribute(Attribute::Bold),
                Cell::new(reason),
            )
        }
    };
    vec![
        Cell::new(name),
        Cell::new(report.rows_processed),
        status,
        match &report.destination {
            Some(destination) => Cell::new(destination.display()),
            None => dim_cell("not moved"),
        },
        reason,
    ]
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).add_attribute(Attribute::Dim)
}
