//! Accès à l'API REST de l'hôpital.
//!
//! `ScheduleApi` est la couture de test : le contrôleur de calendrier ne
//! connaît que ce trait, `HttpScheduleApi` l'implémente avec reqwest.

mod http;
pub mod wire;

pub use http::HttpScheduleApi;
pub use wire::{EventPatch, EventPayload, ExportRequest, WeeklyScheduleReport};

use crate::model::{LeaveRequest, ShiftAssignment, ShiftId, StaffMember, StaffRole};
use chrono::NaiveDateTime;
use thiserror::Error;

const GENERIC_FAILURE: &str = "Unable to reach the scheduling service. Please try again.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("not authenticated: no bearer token configured")]
    MissingToken,
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response shape from {endpoint}: {detail}")]
    Shape {
        endpoint: &'static str,
        detail: String,
    },
}

impl ApiError {
    /// Texte affichable : message du serveur si disponible, générique sinon.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } if !message.trim().is_empty() => message.clone(),
            ApiError::MissingToken => "You must be signed in.".to_string(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

/// Paramètres de `GET /events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub search: Option<String>,
    pub role: Option<StaffRole>,
}

impl EventQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("startDate", wire::format_timestamp(self.start)),
            ("endDate", wire::format_timestamp(self.end)),
        ];
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(role) = self.role {
            pairs.push(("role", role.as_str().to_string()));
        }
        pairs
    }
}

/// Opérations consommées par la vue planning.
#[allow(async_fn_in_trait)]
pub trait ScheduleApi {
    /// Créneaux de la période ; « aucun événement » est une liste vide.
    async fn fetch_events(&self, query: &EventQuery) -> Result<Vec<ShiftAssignment>, ApiError>;

    async fn fetch_event(&self, id: &ShiftId) -> Result<ShiftAssignment, ApiError>;

    async fn create_event(&self, payload: &EventPayload) -> Result<ShiftAssignment, ApiError>;

    async fn update_event(&self, id: &ShiftId, payload: &EventPayload) -> Result<ShiftAssignment, ApiError>;

    async fn patch_event(&self, id: &ShiftId, patch: &EventPatch) -> Result<ShiftAssignment, ApiError>;

    async fn delete_event(&self, id: &ShiftId) -> Result<(), ApiError>;

    /// Déclenche l'affectation automatique de la semaine (algorithme serveur).
    async fn run_weekly_schedule(&self) -> Result<WeeklyScheduleReport, ApiError>;

    async fn fetch_staff(&self, role: StaffRole) -> Result<Vec<StaffMember>, ApiError>;

    async fn fetch_approved_leaves(&self) -> Result<Vec<LeaveRequest>, ApiError>;

    /// Rendu PDF délégué au serveur ; renvoie les octets bruts.
    async fn export_pdf(&self, request: &ExportRequest) -> Result<Vec<u8>, ApiError>;
}
