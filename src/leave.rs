use crate::model::{LeaveRequest, LeaveStatus, ShiftAssignment, ShiftId, StaffId, StaffRole};
use chrono::NaiveDate;

impl LeaveRequest {
    pub fn is_approved(&self) -> bool {
        self.status == LeaveStatus::Approved
    }

    /// `date` est-elle dans `[start_date, end_date]` (bornes incluses) ?
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Nombre de jours calendaires couverts (bornes incluses).
    pub fn total_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days().abs() + 1
    }
}

/// Vrai si un congé approuvé de `staff` couvre `date`.
pub fn is_on_leave(leaves: &[LeaveRequest], staff: &StaffId, date: NaiveDate) -> bool {
    leaves
        .iter()
        .any(|leave| &leave.staff_id == staff && leave.is_approved() && leave.covers(date))
}

pub fn approved(leaves: &[LeaveRequest]) -> impl Iterator<Item = &LeaveRequest> {
    leaves.iter().filter(|leave| leave.is_approved())
}

/// Soignant affecté à un créneau alors qu'il est en congé approuvé ce jour-là.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveConflict {
    pub staff: StaffId,
    pub role: StaffRole,
    pub shift: ShiftId,
    pub date: NaiveDate,
}

/// Rapport des affectations tombant sur un congé approuvé.
///
/// Informatif seulement : le serveur reste seul juge des écritures.
pub fn leave_conflicts<'a, I>(shifts: I, leaves: &[LeaveRequest]) -> Vec<LeaveConflict>
where
    I: IntoIterator<Item = &'a ShiftAssignment>,
{
    let mut ordered: Vec<&ShiftAssignment> = shifts.into_iter().collect();
    ordered.sort_by_key(|s| s.start);

    let mut out = Vec::new();
    for shift in ordered {
        let date = shift.date();
        for role in StaffRole::ALL {
            for staff in shift.assignees(role) {
                if is_on_leave(leaves, staff, date) {
                    out.push(LeaveConflict {
                        staff: staff.clone(),
                        role,
                        shift: shift.id.clone(),
                        date,
                    });
                }
            }
        }
    }
    out
}
