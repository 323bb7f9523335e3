//! Formes JSON échangées avec l'API de l'hôpital.
//!
//! Chaque réponse a son enveloppe explicite ; la normalisation vers le
//! modèle se fait ici et échoue franchement sur une forme inattendue.

use crate::model::{
    LeaveRequest, LeaveStatus, LeaveType, ShiftAssignment, ShiftDraft, ShiftId, ShiftType,
    StaffId, StaffMember, StaffRole,
};
use crate::session::Session;
use crate::shift_time::{self, ShiftTimes};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("invalid {field} timestamp: {value}")]
    Timestamp { field: &'static str, value: String },
    #[error(transparent)]
    Shift(#[from] crate::model::UnknownShiftType),
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Accepte RFC3339 (l'heure murale écrite est conservée, sans conversion),
/// un horodatage naïf ou une simple date (minuit).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn timestamp(field: &'static str, raw: &str) -> Result<NaiveDateTime, WireError> {
    parse_timestamp(raw).ok_or_else(|| WireError::Timestamp {
        field,
        value: raw.to_string(),
    })
}

/// Soignant tel que renvoyé par `/doctors`, `/nurses` ou peuplé dans un événement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffDto {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl StaffDto {
    pub fn into_member(self, role: StaffRole, session: &Session) -> StaffMember {
        let photo_url = self.photo.as_deref().and_then(|p| session.resolve_asset(p));
        StaffMember {
            id: StaffId::new(self.id),
            full_name: self.full_name,
            role,
            photo_url,
        }
    }
}

/// Référence à un soignant : identifiant brut ou document peuplé.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StaffRef {
    Id(String),
    Populated(StaffDto),
}

impl StaffRef {
    pub fn id(&self) -> &str {
        match self {
            StaffRef::Id(id) => id,
            StaffRef::Populated(dto) => &dto.id,
        }
    }
}

/// Événement (créneau) côté API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub assigned_doctors: Vec<StaffRef>,
    #[serde(default)]
    pub assigned_nurses: Vec<StaffRef>,
    pub shift: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EventDto {
    pub fn into_assignment(self) -> Result<ShiftAssignment, WireError> {
        let shift_type: ShiftType = self.shift.parse()?;
        let start = timestamp("start", &self.start)?;
        let end = shift_time::normalize_end(shift_type, start, timestamp("end", &self.end)?);
        Ok(ShiftAssignment {
            id: ShiftId::new(self.id),
            title: self.title,
            shift_type,
            start,
            end,
            assigned_doctors: self.assigned_doctors.iter().map(|r| StaffId::new(r.id())).collect(),
            assigned_nurses: self.assigned_nurses.iter().map(|r| StaffId::new(r.id())).collect(),
            description: self.description.unwrap_or_default(),
        })
    }

    /// Forme peuplée (noms inclus) attendue par l'export PDF.
    pub fn populated(shift: &ShiftAssignment, staff: &[StaffMember]) -> Self {
        let populate = |id: &StaffId| match staff.iter().find(|m| &m.id == id) {
            Some(member) => StaffRef::Populated(StaffDto {
                id: id.as_str().to_string(),
                full_name: member.full_name.clone(),
                photo: member.photo_url.clone(),
            }),
            None => StaffRef::Id(id.as_str().to_string()),
        };
        Self {
            id: shift.id.as_str().to_string(),
            title: shift.title.clone(),
            start: format_timestamp(shift.start),
            end: format_timestamp(shift.end),
            assigned_doctors: shift.assigned_doctors.iter().map(populate).collect(),
            assigned_nurses: shift.assigned_nurses.iter().map(populate).collect(),
            shift: shift.shift_type.as_str().to_string(),
            description: Some(shift.description.clone()).filter(|d| !d.is_empty()),
        }
    }
}

/// Réponse `{ message, event }` des créations/modifications.
#[derive(Debug, Clone, Deserialize)]
pub struct MutationEnvelope {
    #[serde(default)]
    pub message: Option<String>,
    pub event: EventDto,
}

/// Réponse `{ message }` d'une suppression.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEnvelope {
    #[serde(default)]
    pub message: Option<String>,
}

/// Corps d'erreur renvoyé par le serveur.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Texte d'erreur lisible extrait d'un corps de réponse, vide sinon.
pub fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .unwrap_or_default()
}

/// Création ou remplacement complet d'un créneau.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub title: String,
    pub start: String,
    pub end: String,
    pub assigned_doctors: Vec<String>,
    pub assigned_nurses: Vec<String>,
    pub shift: String,
    pub description: String,
}

impl EventPayload {
    /// Les horaires sont toujours dérivés du type de garde.
    pub fn from_draft(draft: &ShiftDraft) -> Self {
        let times = draft.times();
        Self {
            title: draft.title.trim().to_string(),
            start: format_timestamp(times.start),
            end: format_timestamp(times.end),
            assigned_doctors: draft.doctors.iter().map(|id| id.as_str().to_string()).collect(),
            assigned_nurses: draft.nurses.iter().map(|id| id.as_str().to_string()).collect(),
            shift: draft.shift_type.as_str().to_string(),
            description: draft.description.clone(),
        }
    }
}

/// Mise à jour partielle (déplacement d'un créneau).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl EventPatch {
    pub fn reschedule(times: ShiftTimes) -> Self {
        Self {
            start: Some(format_timestamp(times.start)),
            end: Some(format_timestamp(times.end)),
        }
    }
}

/// Réponse de `POST /schedule/weekly`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyScheduleReport {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_count: Option<u32>,
    #[serde(default)]
    pub log: Option<String>,
}

/// Demande d'export PDF `{ events, view, startDate, endDate }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub events: Vec<EventDto>,
    pub view: String,
    pub start_date: String,
    pub end_date: String,
}

/// Demande de congé côté API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveDto {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub staff_id: StaffRef,
    #[serde(default)]
    pub staff_name: String,
    #[serde(default)]
    pub staff_role: Option<StaffRole>,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub status: LeaveStatus,
    #[serde(default)]
    pub leave_type: LeaveType,
    #[serde(default)]
    pub reason: String,
}

impl LeaveDto {
    /// Les bornes sont ramenées à leur date calendaire.
    pub fn into_request(self) -> Result<LeaveRequest, WireError> {
        let start_date = timestamp("startDate", &self.start_date)?.date();
        let end_date = timestamp("endDate", &self.end_date)?.date();
        Ok(LeaveRequest {
            id: self.id,
            staff_id: StaffId::new(self.staff_id.id()),
            staff_name: self.staff_name,
            staff_role: self.staff_role,
            start_date,
            end_date,
            status: self.status,
            leave_type: self.leave_type,
            reason: self.reason,
        })
    }
}
