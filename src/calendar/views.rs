//! Mises en page semaine / jour / liste, calculées à partir des données
//! chargées et de l'état de vue.

use super::state::CalendarViewState;
use crate::leave::is_on_leave;
use crate::model::{
    RoleFilter, ScheduleData, ShiftAssignment, ShiftId, ShiftType, StaffMember,
};
use chrono::{NaiveDate, NaiveDateTime};

/// Personnel visible : recherche sur le nom et filtre de rôle.
pub fn filter_staff<'a>(staff: &'a [StaffMember], state: &CalendarViewState) -> Vec<&'a StaffMember> {
    staff
        .iter()
        .filter(|m| m.matches_search(&state.search_query) && state.role_filter.permits(m.role))
        .collect()
}

/// Créneaux comptant au moins un soignant du rôle filtré.
pub fn filter_shifts(shifts: &[ShiftAssignment], filter: RoleFilter) -> Vec<&ShiftAssignment> {
    shifts.iter().filter(|s| filter.admits(s)).collect()
}

/// Résumé d'un créneau pour l'affichage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftSummary {
    pub id: ShiftId,
    pub title: String,
    pub shift_type: ShiftType,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub description: String,
}

impl From<&ShiftAssignment> for ShiftSummary {
    fn from(shift: &ShiftAssignment) -> Self {
        Self {
            id: shift.id.clone(),
            title: shift.title.clone(),
            shift_type: shift.shift_type,
            start: shift.start,
            end: shift.end,
            description: shift.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekCell {
    pub date: NaiveDate,
    pub shifts: Vec<ShiftSummary>,
    pub on_leave: bool,
    pub is_today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekRow {
    pub staff: StaffMember,
    pub cells: Vec<WeekCell>,
}

/// Grille semaine : une ligne par soignant visible, une colonne par jour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekGrid {
    pub days: [NaiveDate; 7],
    pub rows: Vec<WeekRow>,
}

impl WeekGrid {
    pub fn build(data: &ScheduleData, state: &CalendarViewState, today: NaiveDate) -> Self {
        let days = state.week_days();
        let shifts = filter_shifts(&data.shifts, state.role_filter);

        let rows = filter_staff(&data.staff, state)
            .into_iter()
            .map(|member| {
                let cells = days
                    .iter()
                    .map(|&date| {
                        let mut cell_shifts: Vec<ShiftSummary> = shifts
                            .iter()
                            .filter(|s| s.date() == date && s.includes(&member.id))
                            .map(|s| ShiftSummary::from(*s))
                            .collect();
                        cell_shifts.sort_by_key(|s| s.start);
                        WeekCell {
                            date,
                            shifts: cell_shifts,
                            on_leave: is_on_leave(&data.leaves, &member.id, date),
                            is_today: date == today,
                        }
                    })
                    .collect();
                WeekRow {
                    staff: member.clone(),
                    cells,
                }
            })
            .collect();

        Self { days, rows }
    }

    pub fn has_shifts(&self) -> bool {
        self.rows
            .iter()
            .any(|row| row.cells.iter().any(|cell| !cell.shifts.is_empty()))
    }
}

/// Un soignant sur un créneau.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEntry {
    pub shift: ShiftSummary,
    pub staff: StaffMember,
    pub on_leave: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup {
    pub shift_type: ShiftType,
    pub entries: Vec<DayEntry>,
}

/// Vue jour : regroupement matin / soir / nuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayView {
    pub date: NaiveDate,
    pub groups: Vec<DayGroup>,
}

impl DayView {
    pub fn build(data: &ScheduleData, state: &CalendarViewState) -> Self {
        let date = state.current_date;
        let entries = day_entries(data, state);
        let groups = ShiftType::ALL
            .iter()
            .map(|&shift_type| DayGroup {
                shift_type,
                entries: entries
                    .iter()
                    .filter(|e| e.shift.shift_type == shift_type)
                    .cloned()
                    .collect(),
            })
            .collect();
        Self { date, groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.entries.is_empty())
    }
}

/// Vue liste : couples (créneau, soignant) du jour, par heure de début.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub date: NaiveDate,
    pub entries: Vec<DayEntry>,
}

impl ListView {
    pub fn build(data: &ScheduleData, state: &CalendarViewState) -> Self {
        let mut entries = day_entries(data, state);
        entries.sort_by_key(|e| e.shift.start);
        Self {
            date: state.current_date,
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn day_entries(data: &ScheduleData, state: &CalendarViewState) -> Vec<DayEntry> {
    let date = state.current_date;
    let staff = filter_staff(&data.staff, state);

    filter_shifts(&data.shifts, state.role_filter)
        .into_iter()
        .filter(|s| s.date() == date)
        .flat_map(|shift| {
            staff
                .iter()
                .filter(|m| shift.includes(&m.id))
                .map(|m| DayEntry {
                    shift: ShiftSummary::from(shift),
                    staff: (*m).clone(),
                    on_leave: is_on_leave(&data.leaves, &m.id, date),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
