use super::inputs::GridRow;

pub const SAVED_MESSAGE: &str = "Despacho guardado correctamente.";

/// Grid with one blank row appended.
pub fn add_row(mut rows: Vec<GridRow>) -> Vec<GridRow> {
    rows.push(GridRow::blank());
    rows
}

/// Grid without the row at `index`. Out-of-range indices change nothing.
pub fn remove_row(mut rows: Vec<GridRow>, index: usize) -> Vec<GridRow> {
    if index < rows.len() {
        rows.remove(index);
    }
    rows
}

pub fn pdf_message(file: &str) -> String {
    format!("PDF generado: {}", file)
}
