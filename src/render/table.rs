use crate::render::html::escape_html;
use crate::sort::{SortKind, SortOrder};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: String,
    pub sorter: SortKind,
}

impl Column {
    pub fn new(label: impl Into<String>, sorter: SortKind) -> Self {
        Self {
            label: label.into(),
            sorter,
        }
    }
}

/// One body row; cells hold display text, escaped when written out.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub class: &'static str,
    pub cells: Vec<String>,
}

/// A sortable table. The first `label_span` columns describe the row and
/// the rest hold values grouped under `group_header`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub label_span: usize,
    /// Markup for the header spanning the value columns.
    pub group_header: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub footer_label: String,
    pub footer: Vec<String>,
    pub footnote: Option<(&'static str, String)>,
}

impl ResultTable {
    /// Reorder the body rows by one column. The sort is stable, so rows
    /// with equal keys keep their previous relative order.
    pub fn sort_by(&mut self, column: usize, order: SortOrder) {
        let Some(sorter) = self.columns.get(column).map(|c| c.sorter) else {
            return;
        };
        self.rows.sort_by(|a, b| {
            let x = a.cells.get(column).map(String::as_str).unwrap_or("");
            let y = b.cells.get(column).map(String::as_str).unwrap_or("");
            sorter.compare(x, y, order)
        });
    }

    pub fn to_html(&self) -> String {
        let value_span = self.columns.len().saturating_sub(self.label_span);
        let mut html = String::from("<table border=1 class=\"tablesorter\">\n <thead>\n");
        html.push_str(&format!(
            "  <tr class=\"header\"><th colspan=\"{}\"></th><th colspan=\"{}\">{}</th></tr>\n",
            self.label_span, value_span, self.group_header
        ));
        html.push_str("  <tr class=\"header\">");
        for (idx, column) in self.columns.iter().enumerate() {
            html.push_str(&format!(
                "<th class=\"headerSortable\" data-column=\"{idx}\" data-sorter=\"{}\">{}</th>",
                column.sorter.as_str(),
                escape_html(&column.label)
            ));
        }
        html.push_str("</tr>\n </thead>\n <tbody>\n");

        for row in &self.rows {
            html.push_str(&format!("  <tr class=\"{}\">", row.class));
            for (cell, column) in row.cells.iter().zip(&self.columns) {
                match column.sorter.key(cell) {
                    Some(key) => html.push_str(&format!(
                        "<td data-sort=\"{key}\">{}</td>",
                        escape_html(cell)
                    )),
                    None => html.push_str(&format!("<td>{}</td>", escape_html(cell))),
                }
            }
            html.push_str("</tr>\n");
        }

        html.push_str(" </tbody>\n <tfoot>\n");
        html.push_str(&format!(
            "  <tr class=\"header\"><th colspan=\"{}\">{}</th>",
            self.label_span,
            escape_html(&self.footer_label)
        ));
        for cell in &self.footer {
            html.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        html.push_str("</tr>\n");
        if let Some((class, note)) = &self.footnote {
            html.push_str(&format!(
                "  <tr class=\"{class}\"><td colspan=\"{}\">{}</td></tr>\n",
                self.columns.len(),
                escape_html(note)
            ));
        }
        html.push_str(" </tfoot>\n</table>\n");
        html
    }
}
