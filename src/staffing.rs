//! Statistiques d'effectif : présence par jour, répartition par garde,
//! charge individuelle.

use crate::model::{RoleFilter, ShiftAssignment, ShiftType, StaffId, StaffRole};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashSet;

/// Effectif distinct en service sur une journée.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StaffCount {
    pub total_doctors: usize,
    pub total_nurses: usize,
}

impl StaffCount {
    pub fn total(&self) -> usize {
        self.total_doctors + self.total_nurses
    }
}

/// Compte les soignants distincts dont un créneau commence le `date`.
///
/// Une personne présente sur plusieurs créneaux du même jour compte une fois.
pub fn count_staff<'a, I>(shifts: I, date: NaiveDate, filter: RoleFilter) -> StaffCount
where
    I: IntoIterator<Item = &'a ShiftAssignment>,
{
    let mut doctors: HashSet<&StaffId> = HashSet::new();
    let mut nurses: HashSet<&StaffId> = HashSet::new();

    for shift in shifts
        .into_iter()
        .filter(|s| s.date() == date && filter.admits(s))
    {
        if filter.permits(StaffRole::Doctor) {
            doctors.extend(shift.assigned_doctors.iter());
        }
        if filter.permits(StaffRole::Nurse) {
            nurses.extend(shift.assigned_nurses.iter());
        }
    }

    StaffCount {
        total_doctors: doctors.len(),
        total_nurses: nurses.len(),
    }
}

/// Affectations par (garde × rôle). Compte des occurrences, pas des personnes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShiftDistribution {
    counts: [[usize; 2]; 3],
}

fn shift_slot(shift: ShiftType) -> usize {
    match shift {
        ShiftType::Morning => 0,
        ShiftType::Evening => 1,
        ShiftType::Night => 2,
    }
}

fn role_slot(role: StaffRole) -> usize {
    match role {
        StaffRole::Doctor => 0,
        StaffRole::Nurse => 1,
    }
}

impl ShiftDistribution {
    pub fn get(&self, shift: ShiftType, role: StaffRole) -> usize {
        self.counts[shift_slot(shift)][role_slot(role)]
    }

    pub fn total(&self, role: StaffRole) -> usize {
        ShiftType::ALL.iter().map(|s| self.get(*s, role)).sum()
    }

    pub fn morning_doctors(&self) -> usize {
        self.get(ShiftType::Morning, StaffRole::Doctor)
    }
    pub fn morning_nurses(&self) -> usize {
        self.get(ShiftType::Morning, StaffRole::Nurse)
    }
    pub fn evening_doctors(&self) -> usize {
        self.get(ShiftType::Evening, StaffRole::Doctor)
    }
    pub fn evening_nurses(&self) -> usize {
        self.get(ShiftType::Evening, StaffRole::Nurse)
    }
    pub fn night_doctors(&self) -> usize {
        self.get(ShiftType::Night, StaffRole::Doctor)
    }
    pub fn night_nurses(&self) -> usize {
        self.get(ShiftType::Night, StaffRole::Nurse)
    }
}

pub fn shift_distribution<'a, I>(shifts: I, date: NaiveDate) -> ShiftDistribution
where
    I: IntoIterator<Item = &'a ShiftAssignment>,
{
    let mut out = ShiftDistribution::default();
    for shift in shifts.into_iter().filter(|s| s.date() == date) {
        for role in StaffRole::ALL {
            out.counts[shift_slot(shift.shift_type)][role_slot(role)] += shift.assignees(role).len();
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShiftStatus {
    Completed,
    InProgress,
    Pending,
}

impl ShiftStatus {
    pub fn at(shift: &ShiftAssignment, now: NaiveDateTime) -> Self {
        if shift.end < now {
            ShiftStatus::Completed
        } else if shift.start <= now {
            ShiftStatus::InProgress
        } else {
            ShiftStatus::Pending
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShiftStatus::Completed => "Completed",
            ShiftStatus::InProgress => "In Progress",
            ShiftStatus::Pending => "Pending",
        }
    }
}

/// Charge d'un soignant sur un ensemble de créneaux.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Workload {
    pub total_hours: i64,
    pub completed_shifts: usize,
    pub pending_shifts: usize,
}

/// Heures cumulées ; un créneau déjà commencé compte comme effectué.
pub fn workload<'a, I>(shifts: I, staff: &StaffId, now: NaiveDateTime) -> Workload
where
    I: IntoIterator<Item = &'a ShiftAssignment>,
{
    shifts
        .into_iter()
        .filter(|s| s.includes(staff))
        .fold(Workload::default(), |mut acc, shift| {
            acc.total_hours += shift.shift_type.hours();
            if shift.start < now {
                acc.completed_shifts += 1;
            } else {
                acc.pending_shifts += 1;
            }
            acc
        })
}
