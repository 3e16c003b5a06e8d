//! Plain-text charts for terminal and report output.

use crate::report::ImpactDistribution;

const RULE_WIDTH: usize = 60;
const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn header(title: &str) -> String {
    format!("\n{}\n{}\n", title, "─".repeat(RULE_WIDTH))
}

/// Horizontal bars for percentages (0-100).
///
/// A `┆` marks the target column when one is given.
pub fn bar_chart(title: &str, rows: &[(String, f64)], target: Option<f64>, width: usize) -> String {
    let width = width.max(10);
    let mut output = header(title);
    if rows.is_empty() {
        output.push_str("(no data)\n");
        return output;
    }

    let label_width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let scale = |pct: f64| ((pct.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let target_col = target.map(scale);

    for (label, value) in rows {
        let filled = scale(*value);
        let mut bar: Vec<char> = (0..width)
            .map(|i| if i < filled { '█' } else { ' ' })
            .collect();
        if let Some(col) = target_col {
            let col = col.min(width - 1);
            if bar[col] == ' ' {
                bar[col] = '┆';
            }
        }
        let bar: String = bar.into_iter().collect();
        output.push_str(&format!(
            "{:<label_width$} │{}│ {:5.1}%\n",
            label, bar, value
        ));
    }

    output.push_str(&"─".repeat(RULE_WIDTH));
    output.push('\n');
    if let Some(t) = target {
        output.push_str(&format!("┆ Target ({t:.0}%)\n"));
    }
    output
}

/// Box-and-whisker line for a distribution.
pub fn box_summary(title: &str, dist: &ImpactDistribution, width: usize) -> String {
    let width = width.max(10);
    let mut output = format!("{title}\n");
    let span = dist.max - dist.min;
    let pos = |v: f64| {
        if span <= f64::EPSILON {
            width / 2
        } else {
            (((v - dist.min) / span) * (width - 1) as f64).round() as usize
        }
    };

    let (lo, q1, med, q3, hi) = (pos(dist.min), pos(dist.q1), pos(dist.median), pos(dist.q3), pos(dist.max));
    let line: String = (0..width)
        .map(|i| {
            if i == med {
                '┃'
            } else if i >= q1 && i <= q3 {
                '█'
            } else if i == lo || i == hi {
                '├'
            } else if i > lo && i < hi {
                '─'
            } else {
                ' '
            }
        })
        .collect();

    output.push_str(&format!("  {line}\n"));
    output.push_str(&format!(
        "  min {:.1}  q1 {:.1}  median {:.1}  q3 {:.1}  max {:.1}  mean {:.1}  (n={})\n",
        dist.min, dist.q1, dist.median, dist.q3, dist.max, dist.mean, dist.count
    ));
    output
}

fn spark(v: f64) -> char {
    let idx = (v.clamp(0.0, 1.0) * (SPARKS.len() - 1) as f64).round() as usize;
    SPARKS[idx]
}

/// Average consecutive values down to at most `width` columns.
fn bucket(values: &[Option<f64>], width: usize) -> Vec<Option<f64>> {
    if values.len() <= width {
        return values.to_vec();
    }
    let per = values.len().div_ceil(width);
    values
        .chunks(per)
        .map(|chunk| {
            let present: Vec<f64> = chunk.iter().flatten().copied().collect();
            if present.is_empty() {
                None
            } else {
                Some(present.iter().sum::<f64>() / present.len() as f64)
            }
        })
        .collect()
}

/// Sparkline of unit-interval scores with an optional rolling average row.
pub fn timeline(title: &str, values: &[f64], rolling: Option<(usize, &[Option<f64>])>, width: usize) -> String {
    let width = width.max(10);
    let mut output = header(title);
    if values.is_empty() {
        output.push_str("(no data)\n");
        return output;
    }

    let scores: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    let line: String = bucket(&scores, width)
        .into_iter()
        .map(|v| v.map(spark).unwrap_or(' '))
        .collect();
    output.push_str(&format!("scores   {line}\n"));

    if let Some((window, avg)) = rolling {
        let line: String = bucket(avg, width)
            .into_iter()
            .map(|v| v.map(spark).unwrap_or(' '))
            .collect();
        output.push_str(&format!("rolling  {line}\n"));
        output.push_str(&"─".repeat(RULE_WIDTH));
        output.push_str(&format!("\n{} nudges, {window}-nudge rolling average\n", values.len()));
    } else {
        output.push_str(&"─".repeat(RULE_WIDTH));
        output.push_str(&format!("\n{} nudges\n", values.len()));
    }
    output
}
