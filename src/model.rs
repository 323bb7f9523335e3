use crate::shift_time::ShiftTimes;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifiant fort pour un membre du personnel (ObjectId côté serveur)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(String);

impl StaffId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiant fort pour un créneau de garde
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShiftId(String);

impl ShiftId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rôle soignant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StaffRole {
    Doctor,
    Nurse,
}

impl StaffRole {
    pub const ALL: [StaffRole; 2] = [StaffRole::Doctor, StaffRole::Nurse];

    pub fn as_str(self) -> &'static str {
        match self {
            StaffRole::Doctor => "Doctor",
            StaffRole::Nurse => "Nurse",
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "doctor" => Ok(StaffRole::Doctor),
            "nurse" => Ok(StaffRole::Nurse),
            other => Err(format!("unknown staff role: {other}")),
        }
    }
}

/// Membre du personnel (lecture seule, géré par le module RH)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub full_name: String,
    pub role: StaffRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl StaffMember {
    pub fn new<N: Into<String>>(id: StaffId, full_name: N, role: StaffRole) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            role,
            photo_url: None,
        }
    }

    /// Recherche insensible à la casse sur le nom complet.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty()
            || self
                .full_name
                .to_lowercase()
                .contains(&query.to_lowercase())
    }
}

/// Type de garde, à horaires fixes pour tout l'hôpital
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShiftType {
    Morning,
    Evening,
    Night,
}

impl ShiftType {
    pub const ALL: [ShiftType; 3] = [ShiftType::Morning, ShiftType::Evening, ShiftType::Night];

    pub fn as_str(self) -> &'static str {
        match self {
            ShiftType::Morning => "Morning",
            ShiftType::Evening => "Evening",
            ShiftType::Night => "Night",
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown shift type: {0}")]
pub struct UnknownShiftType(pub String);

impl FromStr for ShiftType {
    type Err = UnknownShiftType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(ShiftType::Morning),
            "evening" => Ok(ShiftType::Evening),
            "night" => Ok(ShiftType::Night),
            _ => Err(UnknownShiftType(s.to_string())),
        }
    }
}

/// Créneau de garde planifié.
///
/// `end` est toujours dérivé de `shift_type` et de la date de `start`
/// (lendemain pour une garde de nuit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub id: ShiftId,
    pub title: String,
    pub shift_type: ShiftType,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub assigned_doctors: BTreeSet<StaffId>,
    #[serde(default)]
    pub assigned_nurses: BTreeSet<StaffId>,
    #[serde(default)]
    pub description: String,
}

impl ShiftAssignment {
    /// Crée un créneau dont les horaires sont résolus depuis le type de garde.
    pub fn new<T: Into<String>>(id: ShiftId, title: T, shift_type: ShiftType, date: NaiveDate) -> Self {
        let times = shift_type.resolve(date);
        Self {
            id,
            title: title.into(),
            shift_type,
            start: times.start,
            end: times.end,
            assigned_doctors: BTreeSet::new(),
            assigned_nurses: BTreeSet::new(),
            description: String::new(),
        }
    }

    pub fn with_doctors<I: IntoIterator<Item = StaffId>>(mut self, ids: I) -> Self {
        self.assigned_doctors.extend(ids);
        self
    }

    pub fn with_nurses<I: IntoIterator<Item = StaffId>>(mut self, ids: I) -> Self {
        self.assigned_nurses.extend(ids);
        self
    }

    /// Date calendaire du début de garde.
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn times(&self) -> ShiftTimes {
        ShiftTimes {
            start: self.start,
            end: self.end,
        }
    }

    pub fn assignees(&self, role: StaffRole) -> &BTreeSet<StaffId> {
        match role {
            StaffRole::Doctor => &self.assigned_doctors,
            StaffRole::Nurse => &self.assigned_nurses,
        }
    }

    pub fn has_role(&self, role: StaffRole) -> bool {
        !self.assignees(role).is_empty()
    }

    pub fn includes(&self, staff: &StaffId) -> bool {
        self.assigned_doctors.contains(staff) || self.assigned_nurses.contains(staff)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LeaveType {
    Medical,
    #[default]
    Vacation,
    Personal,
    Family,
    Other,
}

/// Demande de congé (géré par le module congés, lue ici en lecture seule).
///
/// Les bornes sont des dates calendaires incluses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub staff_id: StaffId,
    #[serde(default)]
    pub staff_name: String,
    #[serde(default)]
    pub staff_role: Option<StaffRole>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: LeaveStatus,
    #[serde(default)]
    pub leave_type: LeaveType,
    #[serde(default)]
    pub reason: String,
}

impl LeaveRequest {
    /// Crée une demande en validant que `end_date >= start_date`.
    pub fn new(
        staff_id: StaffId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: LeaveStatus,
    ) -> Result<Self, String> {
        if end_date < start_date {
            return Err("leave end date must not be before start date".to_string());
        }
        Ok(Self {
            id: None,
            staff_id,
            staff_name: String::new(),
            staff_role: None,
            start_date,
            end_date,
            status,
            leave_type: LeaveType::default(),
            reason: String::new(),
        })
    }
}

/// Filtre de rôle de la vue planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleFilter {
    #[default]
    All,
    Doctor,
    Nurse,
}

impl RoleFilter {
    pub fn role(self) -> Option<StaffRole> {
        match self {
            RoleFilter::All => None,
            RoleFilter::Doctor => Some(StaffRole::Doctor),
            RoleFilter::Nurse => Some(StaffRole::Nurse),
        }
    }

    /// Le rôle est-il visible avec ce filtre ?
    pub fn permits(self, role: StaffRole) -> bool {
        self.role().map_or(true, |r| r == role)
    }

    /// Un créneau passe le filtre s'il compte au moins un soignant du rôle.
    pub fn admits(self, shift: &ShiftAssignment) -> bool {
        self.role().map_or(true, |r| shift.has_role(r))
    }
}

impl FromStr for RoleFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(RoleFilter::All),
            "doctor" => Ok(RoleFilter::Doctor),
            "nurse" => Ok(RoleFilter::Nurse),
            other => Err(format!("unknown role filter: {other} (expected all, doctor or nurse)")),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("title is required")]
    MissingTitle,
    #[error("at least one doctor or nurse must be assigned")]
    NoStaff,
}

/// Saisie d'un créneau avant envoi (création ou modification).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftDraft {
    pub title: String,
    pub shift_type: ShiftType,
    pub date: NaiveDate,
    pub doctors: BTreeSet<StaffId>,
    pub nurses: BTreeSet<StaffId>,
    pub description: String,
}

impl ShiftDraft {
    pub fn new<T: Into<String>>(title: T, shift_type: ShiftType, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            shift_type,
            date,
            doctors: BTreeSet::new(),
            nurses: BTreeSet::new(),
            description: String::new(),
        }
    }

    /// Reprend un créneau existant pour édition.
    pub fn from_assignment(shift: &ShiftAssignment) -> Self {
        Self {
            title: shift.title.clone(),
            shift_type: shift.shift_type,
            date: shift.date(),
            doctors: shift.assigned_doctors.clone(),
            nurses: shift.assigned_nurses.clone(),
            description: shift.description.clone(),
        }
    }

    pub fn with_doctors<I: IntoIterator<Item = StaffId>>(mut self, ids: I) -> Self {
        self.doctors.extend(ids);
        self
    }

    pub fn with_nurses<I: IntoIterator<Item = StaffId>>(mut self, ids: I) -> Self {
        self.nurses.extend(ids);
        self
    }

    pub fn with_description<D: Into<String>>(mut self, description: D) -> Self {
        self.description = description.into();
        self
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::MissingTitle);
        }
        if self.doctors.is_empty() && self.nurses.is_empty() {
            return Err(DraftError::NoStaff);
        }
        Ok(())
    }

    pub fn times(&self) -> ShiftTimes {
        self.shift_type.resolve(self.date)
    }
}

/// Données chargées pour la période visible
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleData {
    pub staff: Vec<StaffMember>,
    pub shifts: Vec<ShiftAssignment>,
    pub leaves: Vec<LeaveRequest>,
}

impl ScheduleData {
    pub fn find_staff<'a>(&'a self, id: &StaffId) -> Option<&'a StaffMember> {
        self.staff.iter().find(|s| &s.id == id)
    }
    pub fn find_shift<'a>(&'a self, id: &ShiftId) -> Option<&'a ShiftAssignment> {
        self.shifts.iter().find(|s| &s.id == id)
    }
    pub fn find_shift_mut(&mut self, id: &ShiftId) -> Option<&mut ShiftAssignment> {
        self.shifts.iter_mut().find(|s| &s.id == id)
    }
}
