//! Rendu texte des vues (sortie CLI).

use super::views::{DayEntry, DayView, ListView, ShiftSummary, WeekGrid};
use crate::leave::LeaveConflict;
use crate::model::{ScheduleData, ShiftAssignment, ShiftType, StaffRole};
use crate::staffing::{ShiftDistribution, ShiftStatus, StaffCount, Workload};
use chrono::NaiveDateTime;

pub const NO_EVENTS: &str = "No events for this period.";
const NO_STAFF: &str = "No staff matches the current filters.";
const LEAVE: &str = "[LEAVE]";

fn clock(ts: NaiveDateTime) -> String {
    ts.format("%H:%M").to_string()
}

fn shift_label(shift: &ShiftSummary) -> String {
    format!(
        "{} ({} {}-{})",
        shift.title,
        shift.shift_type,
        clock(shift.start),
        clock(shift.end)
    )
}

fn window_label(shift_type: ShiftType) -> String {
    let times = shift_type.resolve(chrono::NaiveDate::MIN);
    format!("{}-{}", clock(times.start), clock(times.end))
}

pub fn render_week(grid: &WeekGrid) -> String {
    let mut lines = vec![format!(
        "Week {} to {}",
        grid.days[0].format("%Y-%m-%d"),
        grid.days[6].format("%Y-%m-%d")
    )];

    if grid.rows.is_empty() {
        lines.push(NO_STAFF.to_string());
        return lines.join("\n");
    }

    for row in &grid.rows {
        lines.push(format!("{} [{}]", row.staff.full_name, row.staff.role));
        for cell in &row.cells {
            let mut content: Vec<String> = Vec::new();
            if cell.on_leave {
                content.push(LEAVE.to_string());
            }
            content.extend(cell.shifts.iter().map(shift_label));
            if content.is_empty() {
                content.push("-".to_string());
            }
            let marker = if cell.is_today { "*" } else { " " };
            lines.push(format!(
                " {}{}  {}",
                marker,
                cell.date.format("%a %m-%d"),
                content.join("; ")
            ));
        }
    }

    if !grid.has_shifts() {
        lines.push(NO_EVENTS.to_string());
    }
    lines.join("\n")
}

fn entry_label(entry: &DayEntry) -> String {
    let mut label = format!("{} [{}]  {}", entry.staff.full_name, entry.staff.role, entry.shift.title);
    if entry.on_leave {
        label.push(' ');
        label.push_str(LEAVE);
    }
    label
}

pub fn render_day(view: &DayView) -> String {
    let mut lines = vec![format!("Day {}", view.date.format("%A %Y-%m-%d"))];
    if view.is_empty() {
        lines.push(NO_EVENTS.to_string());
        return lines.join("\n");
    }
    for group in &view.groups {
        lines.push(format!("{} {}", group.shift_type, window_label(group.shift_type)));
        if group.entries.is_empty() {
            lines.push("  (none)".to_string());
        }
        for entry in &group.entries {
            lines.push(format!("  - {}", entry_label(entry)));
        }
    }
    lines.join("\n")
}

pub fn render_list(view: &ListView) -> String {
    let mut lines = vec![format!("Shifts on {}", view.date.format("%Y-%m-%d"))];
    if view.is_empty() {
        lines.push(NO_EVENTS.to_string());
    }
    for entry in &view.entries {
        lines.push(format!(
            "{}-{}  {:<7}  {}",
            clock(entry.shift.start),
            clock(entry.shift.end),
            entry.shift.shift_type.as_str(),
            entry_label(entry)
        ));
    }
    lines.join("\n")
}

pub fn render_stats(count: StaffCount, distribution: &ShiftDistribution, approved_leaves: usize) -> String {
    let mut lines = vec![
        format!(
            "Staff on duty: {} (doctors: {}, nurses: {})",
            count.total(),
            count.total_doctors,
            count.total_nurses
        ),
        format!("Approved leaves: {approved_leaves}"),
        format!("{:<8}  {:>7}  {:>6}", "Shift", "Doctors", "Nurses"),
    ];
    for shift in ShiftType::ALL {
        lines.push(format!(
            "{:<8}  {:>7}  {:>6}",
            shift.as_str(),
            distribution.get(shift, StaffRole::Doctor),
            distribution.get(shift, StaffRole::Nurse)
        ));
    }
    lines.join("\n")
}

pub fn render_workload(name: &str, workload: &Workload) -> String {
    format!(
        "{name}: {}h scheduled, {} completed, {} pending",
        workload.total_hours, workload.completed_shifts, workload.pending_shifts
    )
}

/// Planning personnel : ligne de charge puis un créneau par ligne.
pub fn render_personal(name: &str, shifts: &[&ShiftAssignment], workload: &Workload, now: NaiveDateTime) -> String {
    let mut lines = vec![render_workload(name, workload)];
    if shifts.is_empty() {
        lines.push(NO_EVENTS.to_string());
    }
    for shift in shifts {
        lines.push(format!(
            "{}  {:<7}  {}-{}  {}  ({})",
            shift.date().format("%a %Y-%m-%d"),
            shift.shift_type.as_str(),
            clock(shift.start),
            clock(shift.end),
            shift.title,
            ShiftStatus::at(shift, now).label()
        ));
    }
    lines.join("\n")
}

pub fn render_conflicts(conflicts: &[LeaveConflict], data: &ScheduleData) -> String {
    if conflicts.is_empty() {
        return "OK: no assignment falls on an approved leave".to_string();
    }
    conflicts
        .iter()
        .map(|c| {
            let name = data
                .find_staff(&c.staff)
                .map(|m| m.full_name.as_str())
                .unwrap_or(c.staff.as_str());
            let title = data
                .find_shift(&c.shift)
                .map(|s| s.title.as_str())
                .unwrap_or(c.shift.as_str());
            format!("{} | {} [{}] on leave | {}", c.date.format("%Y-%m-%d"), name, c.role, title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
