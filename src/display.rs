use crate::model::DocumentTable;

/// Renders the table as an aligned plain-text grid for terminal display.
#[must_use]
pub fn render_text_table(table: &DocumentTable) -> String {
    let rows = table
        .rows()
        .iter()
        .zip(table.materialize())
        .map(|(row, mut cells)| {
            cells[1] = row.confidence.map(|confidence| format!("{confidence:.4}"));
            cells
                .into_iter()
                .map(Option::unwrap_or_default)
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let widths = table
        .columns()
        .iter()
        .enumerate()
        .map(|(index, label)| {
            rows.iter()
                .map(|row| row[index].chars().count())
                .chain(std::iter::once(label.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect::<Vec<_>>();

    let mut out = String::new();
    push_line(&mut out, table.columns(), &widths);
    let separator = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>();
    push_line(&mut out, &separator, &widths);
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    out.push_str(line.trim_end());
    out.push('\n');
}
