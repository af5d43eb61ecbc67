//! Activation section: sample summary and the isotope activity table.

use crate::config::SessionConfig;
use crate::format::{
    format_activation_value, format_mass, format_time, js_number_string, to_exponential,
    to_precision,
};
use crate::render::html::{escape_html, formula_markup};
use crate::render::table::{Column, ResultTable, Row};
use crate::response::{Activation, ActivityRow, Sample};
use crate::sort::SortKind;

pub const BETA_FOOTNOTE: &str = "b reaction activity is slightly underestimated; it does not include decay of transients after removal from beam.";

const DISCLAIMER: &str = "Estimated activation only. All samples must be evaluated by NIST Health Physics to determine if and how the sample can be removed from the NCNR.";

/// Labels for the fixed rest times; anything past them is formatted.
const REST_LABELS: [&str; 4] = ["0 hrs", "1 hr", "24 hrs", "15 days"];

const LABEL_COLUMNS: usize = 4;

/// Beta-branch reactions and transient products have underestimated activity.
fn is_unusual(row: &ActivityRow) -> bool {
    row.reaction == "b" || row.product.ends_with('t')
}

fn group_header(cutoff: f64, session_cutoff: f64) -> String {
    if cutoff > 0.0 {
        format!(
            "Activity (&mu;Ci) above {} &mu;Ci<button class=\"activity_button no-print\" onclick=\"show_cutoff(false);event.stopPropagation();\">All</button>",
            to_exponential(cutoff, 4)
        )
    } else if session_cutoff > 0.0 {
        format!(
            "Activity (&mu;Ci)<button class=\"activity_button no-print\" onclick=\"show_cutoff(true);event.stopPropagation();\">&gt;{}&thinsp;&mu;Ci</button>",
            to_exponential(session_cutoff, 4)
        )
    } else {
        "Activity (&mu;Ci)".to_string()
    }
}

/// Activity table at the given display cutoff. Rows with no level at or
/// above the cutoff are left out.
pub fn activation_table(act: &Activation, cutoff: f64, session_cutoff: f64) -> ResultTable {
    let mut columns = vec![
        Column::new("element", SortKind::Isotope),
        Column::new("reaction", SortKind::Text),
        Column::new("product", SortKind::Isotope),
        Column::new("half life", SortKind::HalfLife),
    ];
    for (idx, hours) in act.rest.iter().enumerate() {
        let label = REST_LABELS
            .get(idx)
            .map(|l| l.to_string())
            .unwrap_or_else(|| format_time(*hours));
        columns.push(Column::new(label, SortKind::Float));
    }

    let mut unusual = false;
    let rows = act
        .activity
        .iter()
        .filter(|row| row.levels.iter().any(|level| *level >= cutoff))
        .map(|row| {
            let class = if is_unusual(row) {
                unusual = true;
                "activity_unusual"
            } else {
                "activity_normal"
            };
            let mut cells = vec![
                row.isotope.clone(),
                row.reaction.clone(),
                row.product.clone(),
                row.halflife.clone(),
            ];
            cells.extend(
                row.levels
                    .iter()
                    .map(|level| format_activation_value(*level, cutoff)),
            );
            Row { class, cells }
        })
        .collect();

    ResultTable {
        label_span: LABEL_COLUMNS,
        group_header: group_header(cutoff, session_cutoff),
        columns,
        rows,
        footer_label: "total activity".to_string(),
        footer: act
            .total
            .iter()
            .map(|total| format_activation_value(*total, cutoff))
            .collect(),
        footnote: unusual.then(|| ("activity_unusual", BETA_FOOTNOTE.to_string())),
    }
}

/// Both views of the table when a cutoff is active; the page shows one of
/// them at a time.
pub fn activation_tables(act: &Activation, session: &SessionConfig) -> String {
    if session.cutoff == 0.0 {
        activation_table(act, 0.0, 0.0).to_html()
    } else {
        format!(
            "<div class=\"cutoff\">\n{}</div>\n<div class=\"nocutoff\">\n{}</div>\n",
            activation_table(act, session.cutoff, session.cutoff).to_html(),
            activation_table(act, 0.0, session.cutoff).to_html()
        )
    }
}

pub fn render_activation(act: &Activation, sample: Option<&Sample>, session: &SessionConfig) -> String {
    let name = sample.map(|s| s.name.as_str()).unwrap_or("sample");
    let mut content = format!(
        "<h3>Activation of {} after {} at {} n/cm<sup>2</sup>/s</h3>\n",
        escape_html(name),
        format_time(act.exposure),
        to_precision(act.flux, 3)
    );
    content.push_str(&format!("<p class=\"disclaimer\">{DISCLAIMER}</p>"));

    content.push_str("<p>");
    if let Some(sample) = sample {
        content.push_str(&format!(
            "Sample in beam: {} of {}\n",
            format_mass(sample.mass),
            formula_markup(&sample.formula_latex)
        ));
    }
    if act.cd > 0.0 || act.fast > 0.0 {
        content.push_str(&format!(
            "<br>Rabbit system: Cd ratio = {}, thermal/fast ratio = {}\n",
            js_number_string(act.cd),
            js_number_string(act.fast)
        ));
    }
    if act.decay_time > 0.0 {
        content.push_str(&format!(
            "<br>Time to decay below {} &mu;Ci is {}.\n",
            to_exponential(act.decay_level, 4),
            format_time(act.decay_time)
        ));
    }
    content.push_str("</p>\n");

    content.push_str(&activation_tables(act, session));
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(isotope: &str, reaction: &str, product: &str, levels: [f64; 5]) -> ActivityRow {
        ActivityRow {
            isotope: isotope.to_string(),
            reaction: reaction.to_string(),
            product: product.to_string(),
            halflife: "5.27 y".to_string(),
            comments: None,
            levels: levels.to_vec(),
        }
    }

    fn activation(rows: Vec<ActivityRow>) -> Activation {
        Activation {
            flux: 1e5,
            fast: 0.0,
            cd: 0.0,
            exposure: 1.0,
            rest: vec![0.0, 1.0, 24.0, 360.0, 720.0],
            activity: rows,
            total: vec![1.0, 0.9, 0.5, 0.1, 0.01],
            decay_level: 0.0005,
            decay_time: 0.0,
        }
    }

    #[test]
    fn rows_below_cutoff_are_dropped() {
        let act = activation(vec![
            row("Co-59", "act", "Co-60", [1e-5, 1e-5, 1e-6, 0.0, 0.0]),
            row("Co-59", "act", "Co-60m", [1e-4, 1e-6, 0.0, 0.0, 0.0]),
        ]);
        let table = activation_table(&act, 0.0005, 0.0005);
        assert!(table.rows.is_empty());
        assert_eq!(table.footer.len(), 5);
        let html = table.to_html();
        assert!(html.contains(" <tbody>\n </tbody>"));
        assert!(html.contains("total activity"));
    }

    #[test]
    fn backend_cell_text_is_escaped() {
        let mut odd = row("<i>Co-59</i>", "a&b", "Co-60", [1.0; 5]);
        odd.halflife = "<1 s".to_string();
        let html = activation_table(&activation(vec![odd]), 0.0005, 0.0005).to_html();
        assert!(html.contains("&lt;i&gt;Co-59&lt;/i&gt;"));
        assert!(html.contains("<td>a&amp;b</td>"));
        assert!(html.contains("&lt;1 s</td>"));
        assert!(!html.contains("<i>"));
    }

    #[test]
    fn one_level_at_cutoff_keeps_the_row() {
        let act = activation(vec![row("Co-59", "act", "Co-60", [0.0, 0.0, 0.0, 0.0, 0.0005])]);
        let table = activation_table(&act, 0.0005, 0.0005);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].cells[4], "---");
        assert_eq!(table.rows[0].cells[8], "5.0000e-4");
    }

    #[test]
    fn last_column_label_comes_from_rest_time() {
        let act = activation(vec![]);
        let table = activation_table(&act, 0.0, 0.0);
        let labels: Vec<&str> = table.columns.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            ["element", "reaction", "product", "half life", "0 hrs", "1 hr", "24 hrs", "15 days", "30 days"]
        );
    }

    #[test]
    fn beta_and_transient_rows_are_flagged() {
        let act = activation(vec![
            row("Co-59", "b", "Co-60", [1.0; 5]),
            row("Ag-109", "act", "Ag-110t", [1.0; 5]),
            row("Na-23", "act", "Na-24", [1.0; 5]),
        ]);
        let table = activation_table(&act, 0.0, 0.0);
        let classes: Vec<&str> = table.rows.iter().map(|r| r.class).collect();
        assert_eq!(classes, ["activity_unusual", "activity_unusual", "activity_normal"]);
        assert!(table.to_html().contains(BETA_FOOTNOTE));
    }

    #[test]
    fn no_footnote_without_unusual_rows() {
        let act = activation(vec![row("Na-23", "act", "Na-24", [1.0; 5])]);
        assert!(activation_table(&act, 0.0, 0.0).footnote.is_none());
    }

    #[test]
    fn cutoff_renders_both_views() {
        let act = activation(vec![row("Na-23", "act", "Na-24", [1.0; 5])]);
        let session = SessionConfig::default();
        let html = activation_tables(&act, &session);
        assert!(html.contains("<div class=\"cutoff\">"));
        assert!(html.contains("<div class=\"nocutoff\">"));
        assert!(html.contains("above 5.0000e-4 &mu;Ci"));
        assert!(html.contains("&gt;5.0000e-4&thinsp;&mu;Ci</button>"));

        let no_cutoff = SessionConfig {
            cutoff: 0.0,
            ..SessionConfig::default()
        };
        let html = activation_tables(&act, &no_cutoff);
        assert!(!html.contains("class=\"cutoff\""));
        assert!(!html.contains("<button"));
    }

    #[test]
    fn summary_lists_sample_and_decay_time() {
        let mut act = activation(vec![]);
        act.decay_time = 48.0;
        act.cd = 2.5;
        let sample = Sample {
            name: "<Co>".to_string(),
            formula: "Co".to_string(),
            formula_latex: "Co$_{2}$".to_string(),
            mass: 1.0,
            density: 8.9,
            thickness: 1.0,
            natural_density: None,
        };
        let html = render_activation(&act, Some(&sample), &SessionConfig::default());
        assert!(html.contains("Activation of &lt;Co&gt; after 1 hrs at 1.00e+5 n/cm<sup>2</sup>/s"));
        assert!(html.contains("Sample in beam: 1.000&thinsp;g of Co<sub>2</sub>"));
        assert!(html.contains("Rabbit system: Cd ratio = 2.5, thermal/fast ratio = 0"));
        assert!(html.contains("Time to decay below 5.0000e-4 &mu;Ci is 2 days."));
    }
}
