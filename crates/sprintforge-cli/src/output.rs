//! Plain-text rendering

use sprintforge_baseline::ComparisonView;
use sprintforge_model::{Baseline, BaselineDetail, BaselineList};
use std::fmt::Write;

const NAME_WIDTH: usize = 32;

#[allow(clippy::cast_precision_loss)]
fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    match bytes {
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{b} B"),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width - 1).collect();
        cut.push('~');
        cut
    }
}

fn baseline_line(out: &mut String, b: &Baseline) {
    let _ = writeln!(
        out,
        "{} {}  {:<NAME_WIDTH$}  {}  {:>9}",
        if b.is_active { '*' } else { ' ' },
        b.id,
        truncate(&b.name, NAME_WIDTH),
        b.created_at.format("%Y-%m-%d %H:%M"),
        human_size(b.snapshot_size_bytes),
    );
}

/// One line per baseline; the active one is starred
#[must_use]
pub fn render_list(list: &BaselineList) -> String {
    let mut out = String::new();
    if list.baselines.is_empty() {
        out.push_str("No baselines yet.\n");
        return out;
    }
    for baseline in &list.baselines {
        baseline_line(&mut out, baseline);
    }
    let _ = writeln!(
        out,
        "page {} of {} ({} total)",
        list.page,
        list.total.div_ceil(u64::from(list.limit.max(1))).max(1),
        list.total
    );
    out
}

/// Baseline header and snapshot summary
#[must_use]
pub fn render_detail(detail: &BaselineDetail) -> String {
    let b = &detail.baseline;
    let mut out = String::new();
    let _ = writeln!(out, "{}{}", b.name, if b.is_active { " (active)" } else { "" });
    let _ = writeln!(out, "  id:       {}", b.id);
    let _ = writeln!(out, "  created:  {}", b.created_at.to_rfc3339());
    let _ = writeln!(out, "  size:     {}", human_size(b.snapshot_size_bytes));
    if let Some(description) = &b.description {
        let _ = writeln!(out, "  about:    {description}");
    }
    let _ = writeln!(out, "  tasks:    {}", detail.snapshot.tasks.len());
    if !detail.snapshot.critical_path.is_empty() {
        let _ = writeln!(out, "  critical: {} tasks", detail.snapshot.critical_path.len());
    }
    out
}

/// Summary counts, then one row per displayed task
#[must_use]
pub fn render_comparison(view: &ComparisonView) -> String {
    let mut out = String::new();
    if let Some(baseline) = &view.baseline {
        let _ = writeln!(
            out,
            "Compared against {} ({})",
            baseline.name,
            baseline.created_at.format("%Y-%m-%d")
        );
    }
    if let Some(s) = &view.summary {
        let _ = writeln!(
            out,
            "{} tasks: {} ahead, {} behind, {} on track; average {:+.1} days",
            s.total_tasks, s.tasks_ahead, s.tasks_behind, s.tasks_on_track, s.avg_variance_days
        );
    }
    if let Some(error) = &view.error {
        let _ = writeln!(out, "! {}", error.user_message());
    }
    if view.rows.is_empty() {
        out.push_str(if view.include_unchanged {
            "No tasks to compare.\n"
        } else {
            "No variances. Use --include-unchanged to list on-track tasks.\n"
        });
    }
    for row in &view.rows {
        let _ = writeln!(
            out,
            "  {:<NAME_WIDTH$}  {:<16}  {}",
            truncate(&row.task.task_name, NAME_WIDTH),
            row.display.display_text,
            row.display.status,
        );
    }
    for task in &view.tasks_added {
        let _ = writeln!(out, "+ {}", task.task_name);
    }
    for task in &view.tasks_deleted {
        let _ = writeln!(out, "- {}", task.task_name);
    }
    out
}
