//! Interaction log summaries.
//!
//! Every statistic is guarded: an empty log, or one with no accepted
//! nudges, yields zeros rather than NaN.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indoc::formatdoc;
use serde::{Deserialize, Serialize};

use crate::chart;
use crate::error::Result;
use crate::interaction::Interaction;
use crate::storage::ReportConfig;

/// Count and share of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareRow {
    pub label: String,
    pub count: usize,
    /// Percent of all interactions
    pub percent: f64,
}

/// Acceptance within one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceRow {
    pub label: String,
    pub count: usize,
    pub accepted: usize,
    /// Percent accepted within the group
    pub acceptance_rate: f64,
}

/// Grouping key for acceptance breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Persona,
    NudgeType,
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn group_label(interaction: &Interaction, by: GroupBy) -> String {
    match by {
        GroupBy::Persona => interaction.persona.to_string(),
        GroupBy::NudgeType => interaction.nudge.nudge_type.to_string(),
    }
}

/// Acceptance per group, largest group first, then by label.
pub fn acceptance_by(interactions: &[Interaction], by: GroupBy) -> Vec<AcceptanceRow> {
    let mut groups: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for i in interactions {
        let entry = groups.entry(group_label(i, by)).or_default();
        entry.0 += 1;
        if i.outcome.accepted {
            entry.1 += 1;
        }
    }

    let mut rows: Vec<AcceptanceRow> = groups
        .into_iter()
        .map(|(label, (count, accepted))| AcceptanceRow {
            label,
            count,
            accepted,
            acceptance_rate: percent(accepted, count),
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    rows
}

/// Headline results of a coaching run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub total: usize,
    pub accepted: usize,
    /// Percent
    pub acceptance_rate: f64,
    /// Percent, over accepted nudges
    pub avg_productivity: f64,
    /// Percent, over accepted nudges
    pub avg_satisfaction: f64,
    pub simulated_roi: f64,
    pub nudge_types: Vec<ShareRow>,
    pub personas: Vec<AcceptanceRow>,
    pub acceptance_target: f64,
    pub productivity_target: f64,
}

impl SummaryReport {
    pub fn from_interactions(interactions: &[Interaction], config: &ReportConfig) -> Self {
        let total = interactions.len();
        let accepted: Vec<&Interaction> = interactions.iter().filter(|i| i.outcome.accepted).collect();

        let productivity: Vec<f64> = accepted.iter().map(|i| i.outcome.productivity_impact).collect();
        let satisfaction: Vec<f64> = accepted.iter().map(|i| i.outcome.satisfaction_impact).collect();

        let nudge_types = acceptance_by(interactions, GroupBy::NudgeType)
            .into_iter()
            .map(|row| ShareRow {
                percent: percent(row.count, total),
                label: row.label,
                count: row.count,
            })
            .collect();

        Self {
            total,
            accepted: accepted.len(),
            acceptance_rate: percent(accepted.len(), total),
            avg_productivity: mean(&productivity) * 100.0,
            avg_satisfaction: mean(&satisfaction) * 100.0,
            simulated_roi: productivity.iter().sum::<f64>() * config.roi_multiplier(),
            nudge_types,
            personas: acceptance_by(interactions, GroupBy::Persona),
            acceptance_target: config.acceptance_target,
            productivity_target: config.productivity_target,
        }
    }

    pub fn meets_acceptance_target(&self) -> bool {
        self.acceptance_rate > self.acceptance_target
    }

    pub fn meets_productivity_target(&self) -> bool {
        self.avg_productivity > self.productivity_target
    }

    pub fn render_text(&self) -> String {
        let mark = |ok: bool| if ok { "PASS" } else { "FAIL" };
        let mut report = formatdoc! {"

            FOCUSCOACH RESULTS SUMMARY
            ==========================

            Total Nudges Generated: {total}
            Nudges Accepted: {accepted}
            Overall Acceptance Rate: {rate:.1}% {rate_mark} (Target: >{rate_target:.0}%)

            Average Productivity Lift: {prod:.1}% {prod_mark} (Target: >{prod_target:.0}%)
            Average Satisfaction Lift: {sat:.1}%

            Simulated Quarterly ROI: ${roi}

            NUDGE TYPE DISTRIBUTION
            -----------------------
            ",
            total = self.total,
            accepted = self.accepted,
            rate = self.acceptance_rate,
            rate_mark = mark(self.meets_acceptance_target()),
            rate_target = self.acceptance_target,
            prod = self.avg_productivity,
            prod_mark = mark(self.meets_productivity_target()),
            prod_target = self.productivity_target,
            sat = self.avg_satisfaction,
            roi = format_thousands(self.simulated_roi),
        };

        for row in &self.nudge_types {
            report.push_str(&format!("{}: {} ({:.1}%)\n", row.label, row.count, row.percent));
        }

        report.push_str("\nPERSONA BREAKDOWN\n-----------------\n");
        for row in &self.personas {
            report.push_str(&format!(
                "{}: {} nudges, {:.1}% acceptance\n",
                row.label, row.count, row.acceptance_rate
            ));
        }
        report
    }
}

/// Whole dollars with thousands separators.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}

/// Five-number summary plus mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactDistribution {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
    pub count: usize,
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

impl ImpactDistribution {
    /// `None` for an empty slice. Quantiles interpolate linearly.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Some(Self {
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
            mean: mean(&sorted),
            count: sorted.len(),
        })
    }
}

/// Impact distributions over accepted nudges, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub productivity: Option<ImpactDistribution>,
    pub satisfaction: Option<ImpactDistribution>,
}

impl ImpactReport {
    pub fn from_interactions(interactions: &[Interaction]) -> Self {
        let (prod, sat): (Vec<f64>, Vec<f64>) = interactions
            .iter()
            .filter(|i| i.outcome.accepted)
            .map(|i| (i.outcome.productivity_impact * 100.0, i.outcome.satisfaction_impact * 100.0))
            .unzip();
        Self {
            productivity: ImpactDistribution::from_values(&prod),
            satisfaction: ImpactDistribution::from_values(&sat),
        }
    }
}

/// Effectiveness scores in time order with a rolling mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessTimeline {
    pub points: Vec<(DateTime<Utc>, f64)>,
    /// Rolling window; 0 when too few points for one
    pub window: usize,
    /// Rolling mean per point; `None` until the window fills
    pub rolling: Vec<Option<f64>>,
}

impl EffectivenessTimeline {
    pub fn from_interactions(interactions: &[Interaction], window_cap: usize) -> Self {
        let mut points: Vec<(DateTime<Utc>, f64)> = interactions
            .iter()
            .map(|i| (i.timestamp, i.effectiveness_score))
            .collect();
        points.sort_by_key(|(ts, _)| *ts);

        let window = window_cap.min(points.len() / 4);
        if window <= 1 {
            return Self {
                points,
                window: 0,
                rolling: Vec::new(),
            };
        }

        let scores: Vec<f64> = points.iter().map(|(_, s)| *s).collect();
        let rolling = (0..scores.len())
            .map(|idx| {
                (idx + 1 >= window).then(|| mean(&scores[idx + 1 - window..=idx]))
            })
            .collect();

        Self {
            points,
            window,
            rolling,
        }
    }

    pub fn scores(&self) -> Vec<f64> {
        self.points.iter().map(|(_, s)| *s).collect()
    }
}

/// Write the summary and chart files into `dir`.
///
/// Returns the written paths in a fixed order.
pub fn write_outputs(dir: &Path, interactions: &[Interaction], config: &ReportConfig) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let width = config.chart_width;
    let mut written = Vec::with_capacity(4);

    let summary = SummaryReport::from_interactions(interactions, config);
    let path = dir.join("summary_report.txt");
    std::fs::write(&path, summary.render_text())?;
    written.push(path);

    let to_rows = |rows: Vec<AcceptanceRow>| -> Vec<(String, f64)> {
        rows.into_iter().map(|r| (r.label, r.acceptance_rate)).collect()
    };
    let mut acceptance = chart::bar_chart(
        "Acceptance Rate by Persona",
        &to_rows(acceptance_by(interactions, GroupBy::Persona)),
        Some(config.acceptance_target),
        width,
    );
    acceptance.push_str(&chart::bar_chart(
        "Acceptance Rate by Nudge Type",
        &to_rows(acceptance_by(interactions, GroupBy::NudgeType)),
        Some(config.acceptance_target),
        width,
    ));
    let path = dir.join("acceptance_rates.txt");
    std::fs::write(&path, acceptance)?;
    written.push(path);

    let impact = ImpactReport::from_interactions(interactions);
    let mut impact_text = format!(
        "\nImpact Distribution for Accepted Nudges (target productivity >{:.0}%)\n{}\n",
        config.productivity_target,
        "─".repeat(60)
    );
    match (&impact.productivity, &impact.satisfaction) {
        (Some(p), Some(s)) => {
            impact_text.push_str(&chart::box_summary("Productivity Lift (%)", p, width));
            impact_text.push_str(&chart::box_summary("Satisfaction Lift (%)", s, width));
        }
        _ => impact_text.push_str("No accepted nudges to analyze\n"),
    }
    let path = dir.join("productivity_impact.txt");
    std::fs::write(&path, impact_text)?;
    written.push(path);

    let timeline = EffectivenessTimeline::from_interactions(interactions, config.rolling_window_cap);
    let rolling = (timeline.window > 1).then_some((timeline.window, timeline.rolling.as_slice()));
    let path = dir.join("effectiveness_timeline.txt");
    std::fs::write(
        &path,
        chart::timeline("Coaching Effectiveness Over Time", &timeline.scores(), rolling, width),
    )?;
    written.push(path);

    tracing::info!("Wrote {} report files to {}", written.len(), dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{DismissalReason, NudgeRecord, Outcome};
    use crate::persona::Persona;
    use crate::selector::NudgeType;
    use chrono::{Duration, TimeZone};

    fn row(minute: i64, persona: Persona, nudge_type: NudgeType, accepted: bool, prod: f64) -> Interaction {
        Interaction {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap() + Duration::minutes(minute),
            user_id: 1,
            persona,
            nudge: NudgeRecord {
                id: None,
                nudge_type,
                nudge_text: "Close a few tabs".into(),
                confidence: 0.8,
                strategy: None,
                trigger_dimension: None,
                urgency_score: None,
            },
            outcome: if accepted {
                Outcome::accepted(prod, 0.1)
            } else {
                Outcome::dismissed(DismissalReason::Busy)
            },
            effectiveness_score: if accepted { 0.6 } else { 0.0 },
        }
    }

    #[test]
    fn empty_summary_is_all_zero() {
        let report = SummaryReport::from_interactions(&[], &ReportConfig::default());
        assert_eq!(report.total, 0);
        assert_eq!(report.acceptance_rate, 0.0);
        assert_eq!(report.avg_productivity, 0.0);
        assert_eq!(report.avg_satisfaction, 0.0);
        assert_eq!(report.simulated_roi, 0.0);
        assert!(report.render_text().contains("Overall Acceptance Rate: 0.0% FAIL"));
    }

    #[test]
    fn distribution_and_breakdown_sorted_by_count() {
        let rows = vec![
            row(0, Persona::Analyst, NudgeType::Focus, true, 0.1),
            row(1, Persona::Analyst, NudgeType::Focus, false, 0.0),
            row(2, Persona::Manager, NudgeType::Wellbeing, true, 0.2),
            row(3, Persona::Analyst, NudgeType::Wellbeing, true, 0.3),
            row(4, Persona::Designer, NudgeType::Focus, true, 0.2),
        ];
        let report = SummaryReport::from_interactions(&rows, &ReportConfig::default());
        assert_eq!(report.nudge_types[0].label, "focus");
        assert_eq!(report.nudge_types[0].count, 3);
        assert!((report.nudge_types[0].percent - 60.0).abs() < 1e-9);
        assert_eq!(report.personas[0].label, "analyst");
        assert!((report.personas[0].acceptance_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.personas[1].label, "designer");

        assert!((report.avg_productivity - 20.0).abs() < 1e-9);
        let expected_roi = 0.8 * 50.0 * 40.0 * 83.0 * 13.0;
        assert!((report.simulated_roi - expected_roi).abs() < 1e-6);

        let text = report.render_text();
        assert!(text.contains("Overall Acceptance Rate: 80.0% PASS (Target: >65%)"));
        assert!(text.contains("Average Productivity Lift: 20.0% PASS (Target: >12%)"));
        assert!(text.contains("Simulated Quarterly ROI: $1,726,400"));
        assert!(text.contains("analyst: 3 nudges, 66.7% acceptance"));
        assert!(text.contains("focus: 3 (60.0%)"));
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.4), "999");
        assert_eq!(format_thousands(1234567.8), "1,234,568");
        assert_eq!(format_thousands(-4500.0), "-4,500");
    }

    #[test]
    fn distribution_quantiles_interpolate() {
        let dist = ImpactDistribution::from_values(&[4.0, 1.0, 3.0, 2.0, 5.0]).unwrap();
        assert_eq!(dist.min, 1.0);
        assert_eq!(dist.q1, 2.0);
        assert_eq!(dist.median, 3.0);
        assert_eq!(dist.q3, 4.0);
        assert_eq!(dist.max, 5.0);
        assert_eq!(dist.count, 5);

        let even = ImpactDistribution::from_values(&[1.0, 2.0]).unwrap();
        assert!((even.median - 1.5).abs() < 1e-9);
        assert!(ImpactDistribution::from_values(&[]).is_none());
    }

    #[test]
    fn timeline_sorts_and_rolls() {
        let mut rows: Vec<Interaction> = (0..12)
            .map(|m| row(m, Persona::Analyst, NudgeType::Focus, m % 2 == 0, 0.1))
            .collect();
        rows.reverse();
        let tl = EffectivenessTimeline::from_interactions(&rows, 20);
        assert_eq!(tl.window, 3);
        assert!(tl.points.windows(2).all(|w| w[0].0 <= w[1].0));
        assert_eq!(tl.rolling[0], None);
        assert_eq!(tl.rolling[1], None);
        assert!((tl.rolling[2].unwrap() - 0.4).abs() < 1e-9);

        let short = EffectivenessTimeline::from_interactions(&rows[..7], 20);
        assert_eq!(short.window, 0);
        assert!(short.rolling.is_empty());
    }

    #[test]
    fn write_outputs_creates_four_files() {
        let dir = tempfile::tempdir().unwrap();
        let rows: Vec<Interaction> = (0..8)
            .map(|m| row(m, Persona::Developer, NudgeType::Focus, m < 5, 0.15))
            .collect();
        let written = write_outputs(&dir.path().join("outputs"), &rows, &ReportConfig::default()).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "summary_report.txt",
                "acceptance_rates.txt",
                "productivity_impact.txt",
                "effectiveness_timeline.txt"
            ]
        );
        let acceptance = std::fs::read_to_string(&written[1]).unwrap();
        assert!(acceptance.contains("developer"));
        assert!(acceptance.contains(" 62.5%"));
    }
}
