//! Operator-facing run summary.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};

use crate::pipeline::RunSummary;

pub fn print_summary(summary: &RunSummary) {
    println!("Artifacts: {}", summary.artifacts_root.display());
    println!("Model: {}", summary.model_path.display());
    println!(
        "Selected features: {}",
        summary.selected_features.join(", ")
    );

    let mut stages = Table::new();
    apply_style(&mut stages);
    stages.set_header(vec![header_cell("Stage"), header_cell("Rows")]);
    align_right(&mut stages, 1);
    stages.add_row(vec![Cell::new("raw"), Cell::new(summary.raw_rows)]);
    stages.add_row(vec![
        Cell::new("train split"),
        Cell::new(summary.train_rows),
    ]);
    stages.add_row(vec![Cell::new("test split"), Cell::new(summary.test_rows)]);
    stages.add_row(vec![
        Cell::new("train (balanced)"),
        Cell::new(summary.balanced_rows),
    ]);
    println!("{stages}");

    let mut metrics = Table::new();
    apply_style(&mut metrics);
    metrics.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    align_right(&mut metrics, 1);
    for (name, value) in summary.metrics.to_map() {
        metrics.add_row(vec![Cell::new(name), Cell::new(format!("{value:.4}"))]);
    }
    println!("{metrics}");
}

fn apply_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn align_right(table: &mut Table, index: usize) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(CellAlignment::Right);
    }
}
