#![forbid(unsafe_code)]
mod common;

use common::{d, fixture, id};
use garde::api::wire::{parse_timestamp, StaffRef};
use garde::api::{
    ApiError, EventPatch, EventPayload, EventQuery, ExportRequest, ScheduleApi,
    WeeklyScheduleReport,
};
use garde::calendar::{
    export_file_name, CalendarController, CalendarError, CalendarViewState, FetchOutcome,
    FetchScope, Fetched, LoadState, ViewMode,
};
use garde::model::{
    DraftError, LeaveRequest, LeaveStatus, RoleFilter, ScheduleData, ShiftAssignment, ShiftDraft, ShiftId,
    ShiftType, StaffMember, StaffRole,
};
use std::sync::Mutex;

/// Backend en mémoire : répond depuis le jeu de données, ou échoue sur demande.
struct FakeApi {
    data: Mutex<ScheduleData>,
    failure: Mutex<Option<(u16, String)>>,
    calls: Mutex<Vec<&'static str>>,
    exports: Mutex<Vec<ExportRequest>>,
}

impl FakeApi {
    fn new(data: ScheduleData) -> Self {
        Self {
            data: Mutex::new(data),
            failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            exports: Mutex::new(Vec::new()),
        }
    }

    fn fail_with(&self, status: u16, message: &str) {
        *self.failure.lock().unwrap() = Some((status, message.to_string()));
    }

    fn heal(&self) {
        *self.failure.lock().unwrap() = None;
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn enter(&self, call: &'static str) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().clone() {
            Some((status, message)) => Err(ApiError::Status { status, message }),
            None => Ok(()),
        }
    }

    fn from_payload(id: ShiftId, payload: &EventPayload) -> ShiftAssignment {
        let shift_type: ShiftType = payload.shift.parse().unwrap();
        let date = parse_timestamp(&payload.start).unwrap().date();
        ShiftAssignment::new(id, payload.title.clone(), shift_type, date)
            .with_doctors(payload.assigned_doctors.iter().map(|s| id_of(s)))
            .with_nurses(payload.assigned_nurses.iter().map(|s| id_of(s)))
    }
}

fn id_of(s: &str) -> garde::model::StaffId {
    garde::model::StaffId::new(s)
}

fn not_found() -> ApiError {
    ApiError::Status {
        status: 404,
        message: "Event not found".into(),
    }
}

impl ScheduleApi for FakeApi {
    async fn fetch_events(&self, query: &EventQuery) -> Result<Vec<ShiftAssignment>, ApiError> {
        self.enter("events")?;
        let data = self.data.lock().unwrap();
        Ok(data
            .shifts
            .iter()
            .filter(|s| query.start <= s.start && s.start <= query.end)
            .filter(|s| query.role.map_or(true, |r| s.has_role(r)))
            .cloned()
            .collect())
    }

    async fn fetch_event(&self, id: &ShiftId) -> Result<ShiftAssignment, ApiError> {
        self.enter("event")?;
        self.data.lock().unwrap().find_shift(id).cloned().ok_or_else(not_found)
    }

    async fn create_event(&self, payload: &EventPayload) -> Result<ShiftAssignment, ApiError> {
        self.enter("create")?;
        let mut data = self.data.lock().unwrap();
        let created = Self::from_payload(ShiftId::new(format!("new{}", data.shifts.len())), payload);
        data.shifts.push(created.clone());
        Ok(created)
    }

    async fn update_event(&self, id: &ShiftId, payload: &EventPayload) -> Result<ShiftAssignment, ApiError> {
        self.enter("update")?;
        let mut data = self.data.lock().unwrap();
        let slot = data.find_shift_mut(id).ok_or_else(not_found)?;
        *slot = Self::from_payload(id.clone(), payload);
        Ok(slot.clone())
    }

    async fn patch_event(&self, id: &ShiftId, patch: &EventPatch) -> Result<ShiftAssignment, ApiError> {
        self.enter("patch")?;
        let mut data = self.data.lock().unwrap();
        let slot = data.find_shift_mut(id).ok_or_else(not_found)?;
        if let Some(start) = patch.start.as_deref().and_then(parse_timestamp) {
            slot.start = start;
        }
        if let Some(end) = patch.end.as_deref().and_then(parse_timestamp) {
            slot.end = end;
        }
        Ok(slot.clone())
    }

    async fn delete_event(&self, id: &ShiftId) -> Result<(), ApiError> {
        self.enter("delete")?;
        self.data.lock().unwrap().shifts.retain(|s| &s.id != id);
        Ok(())
    }

    async fn run_weekly_schedule(&self) -> Result<WeeklyScheduleReport, ApiError> {
        self.enter("weekly")?;
        self.data.lock().unwrap().shifts.push(
            ShiftAssignment::new(ShiftId::new("auto1"), "Auto", ShiftType::Evening, d(2024, 6, 6))
                .with_doctors([id("D2")]),
        );
        Ok(WeeklyScheduleReport {
            message: Some("Weekly schedule generated".into()),
            created_count: Some(1),
            log: None,
        })
    }

    async fn fetch_staff(&self, role: StaffRole) -> Result<Vec<StaffMember>, ApiError> {
        self.enter("staff")?;
        let data = self.data.lock().unwrap();
        Ok(data.staff.iter().filter(|m| m.role == role).cloned().collect())
    }

    async fn fetch_approved_leaves(&self) -> Result<Vec<LeaveRequest>, ApiError> {
        self.enter("leaves")?;
        let data = self.data.lock().unwrap();
        Ok(data.leaves.iter().filter(|l| l.is_approved()).cloned().collect())
    }

    async fn export_pdf(&self, request: &ExportRequest) -> Result<Vec<u8>, ApiError> {
        self.enter("pdf")?;
        self.exports.lock().unwrap().push(request.clone());
        Ok(b"%PDF-1.4".to_vec())
    }
}

fn controller(date: chrono::NaiveDate) -> CalendarController {
    CalendarController::new(CalendarViewState::new(date))
}

#[tokio::test]
async fn refresh_loads_staff_shifts_and_approved_leaves() {
    let api = FakeApi::new(fixture());
    let mut ctl = controller(d(2024, 6, 5));
    assert_eq!(ctl.load_state(), &LoadState::Idle);

    assert_eq!(ctl.refresh(&api).await, FetchOutcome::Applied);
    assert_eq!(ctl.load_state(), &LoadState::Loaded);
    assert_eq!(ctl.data().staff.len(), 3);
    // e4 est hors de la semaine
    assert_eq!(ctl.data().shifts.len(), 3);
    assert_eq!(ctl.approved_leave_count(), 1);
    assert!(ctl.loaded_at().is_some());
    assert!(ctl.banner().is_none());
}

#[tokio::test]
async fn response_for_a_previous_period_is_discarded() {
    let api = FakeApi::new(fixture());
    let mut ctl = controller(d(2024, 6, 5));

    let ticket = ctl.begin_fetch(FetchScope::Full);
    assert!(ctl.is_loading());
    let result = garde::calendar::fetch(&api, &ticket).await;

    // navigation pendant le chargement
    ctl.next();
    assert_eq!(ctl.complete_fetch(ticket, result), FetchOutcome::Stale);
    assert!(ctl.data().shifts.is_empty());
    assert_eq!(ctl.state().current_date, d(2024, 6, 12));
}

#[tokio::test]
async fn only_the_latest_ticket_applies() {
    let api = FakeApi::new(fixture());
    let mut ctl = controller(d(2024, 6, 5));

    let first = ctl.begin_fetch(FetchScope::Shifts);
    let second = ctl.begin_fetch(FetchScope::Shifts);
    assert!(second.generation() > first.generation());

    let early = garde::calendar::fetch(&api, &first).await;
    let late = garde::calendar::fetch(&api, &second).await;
    assert_eq!(ctl.complete_fetch(second, late), FetchOutcome::Applied);
    assert_eq!(ctl.complete_fetch(first, early), FetchOutcome::Stale);
    assert_eq!(ctl.data().shifts.len(), 3);
}

#[tokio::test]
async fn filter_change_invalidates_in_flight_fetch() {
    let mut ctl = controller(d(2024, 6, 5));
    let ticket = ctl.begin_fetch(FetchScope::Shifts);
    ctl.set_role(RoleFilter::Nurse);
    assert!(!ctl.is_loading());
    let outcome = ctl.complete_fetch(ticket, Ok(Fetched::Shifts(fixture().shifts)));
    assert_eq!(outcome, FetchOutcome::Stale);
}

#[tokio::test]
async fn failure_keeps_previous_data_and_raises_banner() {
    let api = FakeApi::new(fixture());
    let mut ctl = controller(d(2024, 6, 5));
    ctl.refresh(&api).await;

    api.fail_with(500, "Database unavailable");
    assert_eq!(ctl.refresh(&api).await, FetchOutcome::Failed);
    assert_eq!(ctl.load_state(), &LoadState::Error("Database unavailable".into()));
    assert_eq!(ctl.banner(), Some("Database unavailable"));
    assert_eq!(ctl.data().shifts.len(), 3);

    ctl.dismiss_banner();
    assert!(ctl.banner().is_none());

    api.heal();
    assert_eq!(ctl.refresh_shifts(&api).await, FetchOutcome::Applied);
    assert_eq!(ctl.load_state(), &LoadState::Loaded);
}

#[tokio::test]
async fn missing_token_gets_a_sign_in_message() {
    let mut ctl = controller(d(2024, 6, 5));
    let ticket = ctl.begin_fetch(FetchScope::Full);
    ctl.complete_fetch(ticket, Err(ApiError::MissingToken));
    assert_eq!(ctl.banner(), Some("You must be signed in."));
}

#[tokio::test]
async fn moving_a_night_shift_rederives_its_times() {
    let api = FakeApi::new(fixture());
    let mut ctl = controller(d(2024, 6, 5));
    ctl.refresh(&api).await;

    let moved = ctl.move_shift(&api, &ShiftId::new("e2"), d(2024, 6, 5)).await.unwrap();
    assert_eq!(moved.start, d(2024, 6, 5).and_hms_opt(22, 0, 0).unwrap());
    assert_eq!(moved.end, d(2024, 6, 6).and_hms_opt(6, 0, 0).unwrap());
    assert_eq!(ctl.data().find_shift(&ShiftId::new("e2")), Some(&moved));
}

#[tokio::test]
async fn rejected_move_leaves_the_shift_in_place() {
    let api = FakeApi::new(fixture());
    let mut ctl = controller(d(2024, 6, 5));
    ctl.refresh(&api).await;
    let before = ctl.data().find_shift(&ShiftId::new("e1")).cloned();

    api.fail_with(409, "Staff member is on leave");
    let err = ctl
        .move_shift(&api, &ShiftId::new("e1"), d(2024, 6, 6))
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Staff member is on leave");
    assert_eq!(ctl.data().find_shift(&ShiftId::new("e1")).cloned(), before);
    assert_eq!(ctl.banner(), Some("Staff member is on leave"));
}

#[tokio::test]
async fn moving_an_unloaded_shift_fetches_it_first() {
    let api = FakeApi::new(fixture());
    let mut ctl = controller(d(2024, 6, 5));

    let moved = ctl.move_shift(&api, &ShiftId::new("e4"), d(2024, 6, 7)).await.unwrap();
    assert_eq!(moved.date(), d(2024, 6, 7));
    assert_eq!(api.calls(), vec!["event", "patch"]);
}

#[tokio::test]
async fn invalid_draft_never_reaches_the_server() {
    let api = FakeApi::new(fixture());
    let mut ctl = controller(d(2024, 6, 5));

    let draft = ShiftDraft::new("Garde", ShiftType::Morning, d(2024, 6, 6));
    let err = ctl.create_shift(&api, &draft).await.unwrap_err();
    assert!(matches!(err, CalendarError::Draft(DraftError::NoStaff)));

    let draft = ShiftDraft::new("   ", ShiftType::Morning, d(2024, 6, 6)).with_doctors([id("D1")]);
    let err = ctl.create_shift(&api, &draft).await.unwrap_err();
    assert!(matches!(err, CalendarError::Draft(DraftError::MissingTitle)));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn create_update_and_delete_follow_the_server() {
    let api = FakeApi::new(fixture());
    let mut ctl = controller(d(2024, 6, 5));
    ctl.refresh(&api).await;

    let draft = ShiftDraft::new("Renfort", ShiftType::Night, d(2024, 6, 7)).with_nurses([id("N1")]);
    let created = ctl.create_shift(&api, &draft).await.unwrap();
    assert_eq!(created.end, d(2024, 6, 8).and_hms_opt(6, 0, 0).unwrap());
    assert_eq!(ctl.data().shifts.len(), 4);

    let edit = ShiftDraft::from_assignment(&created).with_doctors([id("D2")]);
    let updated = ctl.update_shift(&api, &created.id, &edit).await.unwrap();
    assert!(updated.assigned_doctors.contains(&id("D2")));
    assert_eq!(ctl.data().find_shift(&created.id), Some(&updated));

    ctl.delete_shift(&api, &created.id).await.unwrap();
    assert!(ctl.data().find_shift(&created.id).is_none());
}

#[tokio::test]
async fn auto_schedule_reloads_the_period() {
    let api = FakeApi::new(fixture());
    let mut ctl = controller(d(2024, 6, 5));
    ctl.refresh(&api).await;

    let report = ctl.auto_schedule(&api).await.unwrap();
    assert_eq!(report.created_count, Some(1));
    assert!(ctl.data().find_shift(&ShiftId::new("auto1")).is_some());
}

#[tokio::test]
async fn export_sends_filtered_populated_shifts() {
    let api = FakeApi::new(fixture());
    let mut ctl = controller(d(2024, 6, 5));
    ctl.refresh(&api).await;
    ctl.set_role(RoleFilter::Doctor);

    let export = ctl.export_pdf(&api, ViewMode::Week).await.unwrap();
    assert_eq!(export.file_name, "Schedule_semaine_02-06-2024.pdf");
    assert_eq!(export.shift_count, 2);
    assert_eq!(export.bytes, b"%PDF-1.4");

    let sent = api.exports.lock().unwrap()[0].clone();
    assert_eq!(sent.view, "week");
    assert_eq!(sent.start_date, "2024-06-02T00:00:00");
    assert_eq!(sent.end_date, "2024-06-08T23:59:59");
    match &sent.events[0].assigned_doctors[0] {
        StaffRef::Populated(dto) => assert_eq!(dto.full_name, "Dr Alice Martin"),
        other => panic!("expected populated staff, got {other:?}"),
    }

    assert_eq!(export_file_name(ViewMode::Day, d(2024, 6, 3)), "Schedule_jour_03-06-2024.pdf");
}

#[tokio::test]
async fn derived_stats_follow_role_filter() {
    let api = FakeApi::new(fixture());
    let mut ctl = CalendarController::new(
        CalendarViewState::new(d(2024, 6, 3)).with_view(ViewMode::Day),
    );
    ctl.refresh(&api).await;
    assert_eq!(ctl.staff_count().total(), 2);

    ctl.set_role(RoleFilter::Doctor);
    assert_eq!(ctl.staff_count().total_nurses, 0);
    assert_eq!(ctl.distribution().morning_nurses(), 1);
    assert_eq!(ctl.distribution().night_doctors(), 1);

    let conflicts = ctl.leave_conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].staff, id("N1"));
}

#[tokio::test]
async fn snapshot_restores_data_and_period() {
    let api = FakeApi::new(fixture());
    let mut ctl = controller(d(2024, 6, 5));
    ctl.refresh(&api).await;
    let snapshot = ctl.snapshot();
    assert_eq!(snapshot.period.start, d(2024, 6, 2));

    let mut offline = controller(d(2024, 6, 5));
    let stale = offline.begin_fetch(FetchScope::Full);
    offline.restore(snapshot.clone());
    assert_eq!(offline.load_state(), &LoadState::Loaded);
    assert_eq!(offline.data(), &snapshot.data);
    assert_eq!(
        offline.complete_fetch(stale, Ok(Fetched::Full(ScheduleData::default()))),
        FetchOutcome::Stale
    );
}

#[test]
fn leave_conflicts_only_cover_visible_shifts() {
    // le serveur peut renvoyer des créneaux hors période : le rapport ne doit pas les voir
    let mut data = fixture();
    data.shifts.push(
        ShiftAssignment::new(ShiftId::new("far"), "Juillet", ShiftType::Morning, d(2024, 7, 20))
            .with_doctors([id("D2")]),
    );
    data.leaves.push(
        LeaveRequest::new(id("D2"), d(2024, 7, 20), d(2024, 7, 20), LeaveStatus::Approved).unwrap(),
    );
    data.leaves.push(
        LeaveRequest::new(id("N1"), d(2024, 6, 4), d(2024, 6, 4), LeaveStatus::Approved).unwrap(),
    );

    let mut ctl = CalendarController::new(
        CalendarViewState::new(d(2024, 6, 5)).with_role(RoleFilter::Doctor),
    );
    let ticket = ctl.begin_fetch(FetchScope::Full);
    assert_eq!(ctl.complete_fetch(ticket, Ok(Fetched::Full(data))), FetchOutcome::Applied);

    let seen: Vec<String> = ctl
        .leave_conflicts()
        .iter()
        .map(|c| format!("{}:{}", c.shift, c.staff))
        .collect();
    assert_eq!(seen, vec!["e1:N1".to_string()]);

    ctl.set_role(RoleFilter::All);
    let seen: Vec<String> = ctl
        .leave_conflicts()
        .iter()
        .map(|c| format!("{}:{}", c.shift, c.staff))
        .collect();
    assert_eq!(seen, vec!["e1:N1".to_string(), "e3:N1".to_string()]);
}
