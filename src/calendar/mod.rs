//! Contrôleur de la vue planning.
//!
//! Machine à états explicite (`Idle`, `Loading`, `Loaded`, `Error`) : chaque
//! chargement reçoit un ticket de génération ; une réponse dont le ticket
//! n'est plus courant (navigation entre-temps) est ignorée. Un échec laisse
//! les dernières données valides en place et lève une bannière.

pub mod render;
mod state;
mod views;

pub use state::{week_days, CalendarViewState, Period, ViewMode};
pub use views::{
    filter_shifts, filter_staff, DayEntry, DayGroup, DayView, ListView, ShiftSummary, WeekCell,
    WeekGrid, WeekRow,
};

use crate::api::wire::{self, EventDto};
use crate::api::{
    ApiError, EventPatch, EventPayload, EventQuery, ExportRequest, ScheduleApi,
    WeeklyScheduleReport,
};
use crate::leave::{self, LeaveConflict};
use crate::model::{
    DraftError, RoleFilter, ScheduleData, ShiftAssignment, ShiftDraft, ShiftId, StaffRole,
};
use crate::shift_time;
use crate::staffing::{self, ShiftDistribution, StaffCount};
use crate::storage::Snapshot;
use chrono::{Local, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Draft(#[from] DraftError),
}

impl CalendarError {
    pub fn user_message(&self) -> String {
        match self {
            CalendarError::Api(err) => err.user_message(),
            CalendarError::Draft(err) => err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchScope {
    /// Personnel, créneaux et congés approuvés.
    Full,
    /// Créneaux seuls (après navigation ou changement de filtre).
    Shifts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    scope: FetchScope,
    query: EventQuery,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
pub enum Fetched {
    Full(ScheduleData),
    Shifts(Vec<ShiftAssignment>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Stale,
    Failed,
}

/// PDF rendu par le serveur.
#[derive(Debug, Clone)]
pub struct PdfExport {
    pub file_name: String,
    pub period: Period,
    pub shift_count: usize,
    pub bytes: Vec<u8>,
}

/// Nom de fichier proposé pour un export : `Schedule_semaine_02-06-2024.pdf`.
pub fn export_file_name(view: ViewMode, start: NaiveDate) -> String {
    let kind = match view {
        ViewMode::Week => "semaine",
        ViewMode::Day | ViewMode::List => "jour",
    };
    format!("Schedule_{}_{}.pdf", kind, start.format("%d-%m-%Y"))
}

/// Exécute le chargement décrit par un ticket, sans toucher au contrôleur.
pub async fn fetch<A: ScheduleApi>(api: &A, ticket: &FetchTicket) -> Result<Fetched, ApiError> {
    match ticket.scope {
        FetchScope::Full => {
            let (doctors, nurses, shifts, leaves) = tokio::join!(
                api.fetch_staff(StaffRole::Doctor),
                api.fetch_staff(StaffRole::Nurse),
                api.fetch_events(&ticket.query),
                api.fetch_approved_leaves(),
            );
            let mut staff = doctors?;
            staff.extend(nurses?);
            Ok(Fetched::Full(ScheduleData {
                staff,
                shifts: shifts?,
                leaves: leaves?,
            }))
        }
        FetchScope::Shifts => Ok(Fetched::Shifts(api.fetch_events(&ticket.query).await?)),
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[derive(Debug, Clone)]
pub struct CalendarController {
    state: CalendarViewState,
    data: ScheduleData,
    load: LoadState,
    banner: Option<String>,
    generation: u64,
    loaded_at: Option<NaiveDateTime>,
    loaded_period: Option<Period>,
}

impl CalendarController {
    pub fn new(state: CalendarViewState) -> Self {
        Self {
            state,
            data: ScheduleData::default(),
            load: LoadState::Idle,
            banner: None,
            generation: 0,
            loaded_at: None,
            loaded_period: None,
        }
    }

    pub fn state(&self) -> &CalendarViewState {
        &self.state
    }
    pub fn data(&self) -> &ScheduleData {
        &self.data
    }
    pub fn load_state(&self) -> &LoadState {
        &self.load
    }
    pub fn is_loading(&self) -> bool {
        self.load == LoadState::Loading
    }
    pub fn loaded_at(&self) -> Option<NaiveDateTime> {
        self.loaded_at
    }
    pub fn loaded_period(&self) -> Option<Period> {
        self.loaded_period
    }

    /// Message d'erreur à afficher, s'il y en a un.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    // -- navigation / filtres : toute réponse en vol devient périmée --

    fn invalidate(&mut self) {
        self.generation += 1;
        if self.load == LoadState::Loading {
            self.load = LoadState::Idle;
        }
    }

    pub fn previous(&mut self) {
        self.state.previous();
        self.invalidate();
    }

    pub fn next(&mut self) {
        self.state.next();
        self.invalidate();
    }

    pub fn today(&mut self) {
        self.state.today();
        self.invalidate();
    }

    pub fn go_to(&mut self, date: NaiveDate) {
        self.state.go_to(date);
        self.invalidate();
    }

    pub fn set_view(&mut self, view_mode: ViewMode) {
        self.state.view_mode = view_mode;
        self.invalidate();
    }

    pub fn set_search<S: Into<String>>(&mut self, query: S) {
        self.state.search_query = query.into();
        self.invalidate();
    }

    pub fn set_role(&mut self, role_filter: RoleFilter) {
        self.state.role_filter = role_filter;
        self.invalidate();
    }

    // -- chargement --

    pub fn begin_fetch(&mut self, scope: FetchScope) -> FetchTicket {
        self.generation += 1;
        self.load = LoadState::Loading;
        FetchTicket {
            generation: self.generation,
            scope,
            query: self.state.event_query(),
        }
    }

    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: Result<Fetched, ApiError>) -> FetchOutcome {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale schedule response"
            );
            return FetchOutcome::Stale;
        }

        match result {
            Ok(fetched) => {
                match fetched {
                    Fetched::Full(data) => self.data = data,
                    Fetched::Shifts(shifts) => self.data.shifts = shifts,
                }
                self.load = LoadState::Loaded;
                self.banner = None;
                self.loaded_at = Some(now());
                self.loaded_period = Some(self.state.period());
                debug!(
                    shifts = self.data.shifts.len(),
                    staff = self.data.staff.len(),
                    "schedule loaded"
                );
                FetchOutcome::Applied
            }
            Err(err) => {
                warn!(error = %err, "schedule fetch failed");
                let message = err.user_message();
                self.load = LoadState::Error(message.clone());
                self.banner = Some(message);
                FetchOutcome::Failed
            }
        }
    }

    pub async fn refresh<A: ScheduleApi>(&mut self, api: &A) -> FetchOutcome {
        let ticket = self.begin_fetch(FetchScope::Full);
        let result = fetch(api, &ticket).await;
        self.complete_fetch(ticket, result)
    }

    pub async fn refresh_shifts<A: ScheduleApi>(&mut self, api: &A) -> FetchOutcome {
        let ticket = self.begin_fetch(FetchScope::Shifts);
        let result = fetch(api, &ticket).await;
        self.complete_fetch(ticket, result)
    }

    // -- écritures : l'état local n'est remplacé qu'après succès serveur --

    fn fail(&mut self, err: CalendarError) -> CalendarError {
        warn!(error = %err, "schedule update failed");
        self.banner = Some(err.user_message());
        err
    }

    fn replace_shift(&mut self, updated: ShiftAssignment) {
        match self.data.find_shift_mut(&updated.id) {
            Some(slot) => *slot = updated,
            None => self.data.shifts.push(updated),
        }
    }

    pub async fn create_shift<A: ScheduleApi>(
        &mut self,
        api: &A,
        draft: &ShiftDraft,
    ) -> Result<ShiftAssignment, CalendarError> {
        if let Err(err) = draft.validate() {
            return Err(self.fail(err.into()));
        }
        match api.create_event(&EventPayload::from_draft(draft)).await {
            Ok(created) => {
                self.data.shifts.push(created.clone());
                Ok(created)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    pub async fn update_shift<A: ScheduleApi>(
        &mut self,
        api: &A,
        id: &ShiftId,
        draft: &ShiftDraft,
    ) -> Result<ShiftAssignment, CalendarError> {
        if let Err(err) = draft.validate() {
            return Err(self.fail(err.into()));
        }
        match api.update_event(id, &EventPayload::from_draft(draft)).await {
            Ok(updated) => {
                self.replace_shift(updated.clone());
                Ok(updated)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Déplace un créneau à une autre date : début et fin sont re-dérivés du
    /// type de garde. En cas d'échec le créneau local reste inchangé.
    pub async fn move_shift<A: ScheduleApi>(
        &mut self,
        api: &A,
        id: &ShiftId,
        new_date: NaiveDate,
    ) -> Result<ShiftAssignment, CalendarError> {
        let current = match self.data.find_shift(id).cloned() {
            Some(shift) => shift,
            None => match api.fetch_event(id).await {
                Ok(shift) => shift,
                Err(err) => return Err(self.fail(err.into())),
            },
        };

        let patch = EventPatch::reschedule(shift_time::reschedule(&current, new_date));
        match api.patch_event(id, &patch).await {
            Ok(updated) => {
                self.replace_shift(updated.clone());
                Ok(updated)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    pub async fn delete_shift<A: ScheduleApi>(&mut self, api: &A, id: &ShiftId) -> Result<(), CalendarError> {
        match api.delete_event(id).await {
            Ok(()) => {
                self.data.shifts.retain(|s| &s.id != id);
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Demande au serveur de générer la semaine suivante puis recharge.
    pub async fn auto_schedule<A: ScheduleApi>(&mut self, api: &A) -> Result<WeeklyScheduleReport, CalendarError> {
        let report = match api.run_weekly_schedule().await {
            Ok(report) => report,
            Err(err) => return Err(self.fail(err.into())),
        };
        self.refresh(api).await;
        Ok(report)
    }

    /// Export PDF des créneaux filtrés de la semaine (`Week`) ou du jour courant.
    pub async fn export_pdf<A: ScheduleApi>(&mut self, api: &A, view: ViewMode) -> Result<PdfExport, CalendarError> {
        let view = match view {
            ViewMode::Week => ViewMode::Week,
            ViewMode::Day | ViewMode::List => ViewMode::Day,
        };
        let period = self.state.clone().with_view(view).period();
        let events: Vec<EventDto> = self
            .shifts_in(period)
            .into_iter()
            .map(|s| EventDto::populated(s, &self.data.staff))
            .collect();
        let shift_count = events.len();

        let request = ExportRequest {
            events,
            view: view.as_str().to_string(),
            start_date: wire::format_timestamp(period.start_bound()),
            end_date: wire::format_timestamp(period.end_bound()),
        };

        match api.export_pdf(&request).await {
            Ok(bytes) => Ok(PdfExport {
                file_name: export_file_name(view, period.start),
                period,
                shift_count,
                bytes,
            }),
            Err(err) => Err(self.fail(err.into())),
        }
    }

    // -- lectures dérivées --

    /// Créneaux filtrés par rôle dont le début tombe dans `period`, triés.
    pub fn shifts_in(&self, period: Period) -> Vec<&ShiftAssignment> {
        let mut shifts: Vec<&ShiftAssignment> = filter_shifts(&self.data.shifts, self.state.role_filter)
            .into_iter()
            .filter(|s| period.contains(s.date()))
            .collect();
        shifts.sort_by_key(|s| s.start);
        shifts
    }

    pub fn visible_shifts(&self) -> Vec<&ShiftAssignment> {
        self.shifts_in(self.state.period())
    }

    pub fn week_grid(&self, today: NaiveDate) -> WeekGrid {
        WeekGrid::build(&self.data, &self.state, today)
    }

    pub fn day_view(&self) -> DayView {
        DayView::build(&self.data, &self.state)
    }

    pub fn list_view(&self) -> ListView {
        ListView::build(&self.data, &self.state)
    }

    pub fn staff_count(&self) -> StaffCount {
        staffing::count_staff(&self.data.shifts, self.state.current_date, self.state.role_filter)
    }

    pub fn distribution(&self) -> ShiftDistribution {
        staffing::shift_distribution(
            filter_shifts(&self.data.shifts, self.state.role_filter),
            self.state.current_date,
        )
    }

    pub fn approved_leave_count(&self) -> usize {
        leave::approved(&self.data.leaves).count()
    }

    /// Conflits limités aux créneaux visibles (période et filtre de rôle).
    pub fn leave_conflicts(&self) -> Vec<LeaveConflict> {
        leave::leave_conflicts(self.visible_shifts(), &self.data.leaves)
    }

    // -- cache hors ligne --

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            fetched_at: self.loaded_at.unwrap_or_else(now),
            period: self.loaded_period.unwrap_or_else(|| self.state.period()),
            data: self.data.clone(),
        }
    }

    /// Recharge des données sauvegardées ; une réponse en vol devient périmée.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.generation += 1;
        self.data = snapshot.data;
        self.loaded_at = Some(snapshot.fetched_at);
        self.loaded_period = Some(snapshot.period);
        self.load = LoadState::Loaded;
    }
}
