#![allow(dead_code)]
use chrono::NaiveDate;
use garde::model::{
    LeaveRequest, LeaveStatus, ScheduleData, ShiftAssignment, ShiftId, ShiftType, StaffId,
    StaffMember, StaffRole,
};

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn id(s: &str) -> StaffId {
    StaffId::new(s)
}

/// Semaine du dimanche 2 au samedi 8 juin 2024, plus un créneau hors période.
pub fn fixture() -> ScheduleData {
    let staff = vec![
        StaffMember::new(id("D1"), "Dr Alice Martin", StaffRole::Doctor),
        StaffMember::new(id("D2"), "Dr Paul Roux", StaffRole::Doctor),
        StaffMember::new(id("N1"), "Bob Durand", StaffRole::Nurse),
    ];
    let shifts = vec![
        ShiftAssignment::new(ShiftId::new("e1"), "Urgences", ShiftType::Morning, d(2024, 6, 3))
            .with_doctors([id("D1")])
            .with_nurses([id("N1")]),
        ShiftAssignment::new(ShiftId::new("e2"), "Garde nuit", ShiftType::Night, d(2024, 6, 3))
            .with_doctors([id("D1")]),
        ShiftAssignment::new(ShiftId::new("e3"), "Soins", ShiftType::Evening, d(2024, 6, 4))
            .with_nurses([id("N1")]),
        ShiftAssignment::new(ShiftId::new("e4"), "Semaine suivante", ShiftType::Morning, d(2024, 6, 12))
            .with_doctors([id("D2")]),
    ];
    let leaves = vec![
        LeaveRequest::new(id("N1"), d(2024, 6, 3), d(2024, 6, 3), LeaveStatus::Approved).unwrap(),
        LeaveRequest::new(id("D2"), d(2024, 6, 4), d(2024, 6, 5), LeaveStatus::Pending).unwrap(),
    ];
    ScheduleData { staff, shifts, leaves }
}
