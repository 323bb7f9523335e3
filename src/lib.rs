#![forbid(unsafe_code)]
//! Garde : client du planning des gardes hospitalières (médecins, infirmiers).
//!
//! - Horaires de garde dérivés du type (matin, soir, nuit sur deux jours).
//! - Congés approuvés et détection des affectations en conflit.
//! - Statistiques d'effectif et charge individuelle.
//! - Vue semaine / jour / liste pilotée par l'API REST de l'hôpital.
//! - Heures murales sans fuseau ; l'affichage reste hors de la lib.

pub mod api;
pub mod calendar;
pub mod config;
pub mod io;
pub mod leave;
pub mod model;
pub mod session;
pub mod shift_time;
pub mod staffing;
pub mod storage;

pub use api::{ApiError, EventQuery, HttpScheduleApi, ScheduleApi};
pub use calendar::{
    CalendarController, CalendarError, CalendarViewState, FetchOutcome, LoadState, Period,
    ViewMode,
};
pub use config::{ClientConfig, ConfigError};
pub use leave::{is_on_leave, leave_conflicts, LeaveConflict};
pub use model::{
    DraftError, LeaveRequest, LeaveStatus, LeaveType, RoleFilter, ScheduleData, ShiftAssignment,
    ShiftDraft, ShiftId, ShiftType, StaffId, StaffMember, StaffRole,
};
pub use session::{Session, TokenClaims};
pub use shift_time::ShiftTimes;
pub use staffing::{count_staff, shift_distribution, workload, ShiftDistribution, StaffCount, Workload};
pub use storage::{JsonStorage, Snapshot, Storage};
