use super::wire::{
    self, EventDto, EventPatch, EventPayload, ExportRequest, LeaveDto, MessageEnvelope,
    MutationEnvelope, StaffDto, WeeklyScheduleReport,
};
use super::{ApiError, EventQuery, ScheduleApi};
use crate::model::{LeaveRequest, ShiftAssignment, ShiftId, StaffMember, StaffRole};
use crate::session::Session;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client REST authentifié par jeton bearer.
#[derive(Debug, Clone)]
pub struct HttpScheduleApi {
    client: Client,
    session: Session,
}

impl HttpScheduleApi {
    pub fn new(session: Session) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("garde/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.session.base_url().join(path)?)
    }

    async fn execute(&self, endpoint: &'static str, request: RequestBuilder) -> Result<Response, ApiError> {
        let token = self.session.token().ok_or(ApiError::MissingToken)?;
        let request_id = Uuid::new_v4();
        debug!(%request_id, endpoint, "sending request");

        let response = request
            .bearer_auth(token)
            .header("x-request-id", request_id.to_string())
            .send()
            .await
            .map_err(|err| {
                warn!(%request_id, endpoint, error = %err, "request failed");
                ApiError::Transport(err)
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(%request_id, endpoint, status = status.as_u16(), "request done");
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = wire::error_message(&body);
        warn!(%request_id, endpoint, status = status.as_u16(), reason = %message, "server rejected request");
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(endpoint: &'static str, response: Response) -> Result<T, ApiError> {
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| ApiError::Shape {
            endpoint,
            detail: err.to_string(),
        })
    }

    async fn mutation(&self, endpoint: &'static str, request: RequestBuilder) -> Result<ShiftAssignment, ApiError> {
        let response = self.execute(endpoint, request).await?;
        let envelope: MutationEnvelope = Self::decode(endpoint, response).await?;
        into_assignment(endpoint, envelope.event)
    }
}

fn into_assignment(endpoint: &'static str, dto: EventDto) -> Result<ShiftAssignment, ApiError> {
    dto.into_assignment().map_err(|err| ApiError::Shape {
        endpoint,
        detail: err.to_string(),
    })
}

impl ScheduleApi for HttpScheduleApi {
    async fn fetch_events(&self, query: &EventQuery) -> Result<Vec<ShiftAssignment>, ApiError> {
        const ENDPOINT: &str = "GET /events";
        let request = self.client.get(self.url("events")?).query(&query.to_pairs());
        let response = match self.execute(ENDPOINT, request).await {
            Ok(response) => response,
            Err(err) if err.is_not_found() => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        let events: Vec<EventDto> = Self::decode(ENDPOINT, response).await?;
        events
            .into_iter()
            .map(|dto| into_assignment(ENDPOINT, dto))
            .collect()
    }

    async fn fetch_event(&self, id: &ShiftId) -> Result<ShiftAssignment, ApiError> {
        const ENDPOINT: &str = "GET /events/:id";
        let request = self.client.get(self.url(&format!("events/{}", id.as_str()))?);
        let response = self.execute(ENDPOINT, request).await?;
        let dto: EventDto = Self::decode(ENDPOINT, response).await?;
        into_assignment(ENDPOINT, dto)
    }

    async fn create_event(&self, payload: &EventPayload) -> Result<ShiftAssignment, ApiError> {
        let request = self.client.post(self.url("events")?).json(payload);
        self.mutation("POST /events", request).await
    }

    async fn update_event(&self, id: &ShiftId, payload: &EventPayload) -> Result<ShiftAssignment, ApiError> {
        let request = self
            .client
            .put(self.url(&format!("events/{}", id.as_str()))?)
            .json(payload);
        self.mutation("PUT /events/:id", request).await
    }

    async fn patch_event(&self, id: &ShiftId, patch: &EventPatch) -> Result<ShiftAssignment, ApiError> {
        let request = self
            .client
            .put(self.url(&format!("events/{}", id.as_str()))?)
            .json(patch);
        self.mutation("PUT /events/:id", request).await
    }

    async fn delete_event(&self, id: &ShiftId) -> Result<(), ApiError> {
        const ENDPOINT: &str = "DELETE /events/:id";
        let request = self.client.delete(self.url(&format!("events/{}", id.as_str()))?);
        let response = self.execute(ENDPOINT, request).await?;
        let envelope: MessageEnvelope = Self::decode(ENDPOINT, response).await?;
        debug!(id = id.as_str(), reply = envelope.message.as_deref().unwrap_or(""), "event deleted");
        Ok(())
    }

    async fn run_weekly_schedule(&self) -> Result<WeeklyScheduleReport, ApiError> {
        const ENDPOINT: &str = "POST /schedule/weekly";
        let request = self
            .client
            .post(self.url("schedule/weekly")?)
            .json(&serde_json::json!({}));
        let response = self.execute(ENDPOINT, request).await?;
        Self::decode(ENDPOINT, response).await
    }

    async fn fetch_staff(&self, role: StaffRole) -> Result<Vec<StaffMember>, ApiError> {
        let (endpoint, path) = match role {
            StaffRole::Doctor => ("GET /doctors", "doctors"),
            StaffRole::Nurse => ("GET /nurses", "nurses"),
        };
        let request = self.client.get(self.url(path)?);
        let response = self.execute(endpoint, request).await?;
        let staff: Vec<StaffDto> = Self::decode(endpoint, response).await?;
        Ok(staff
            .into_iter()
            .map(|dto| dto.into_member(role, &self.session))
            .collect())
    }

    async fn fetch_approved_leaves(&self) -> Result<Vec<LeaveRequest>, ApiError> {
        const ENDPOINT: &str = "GET /leave-requests/all";
        let request = self
            .client
            .get(self.url("leave-requests/all")?)
            .query(&[("status", "Approved")]);
        let response = self.execute(ENDPOINT, request).await?;
        let leaves: Vec<LeaveDto> = Self::decode(ENDPOINT, response).await?;
        leaves
            .into_iter()
            .map(|dto| {
                dto.into_request().map_err(|err| ApiError::Shape {
                    endpoint: ENDPOINT,
                    detail: err.to_string(),
                })
            })
            .collect()
    }

    async fn export_pdf(&self, request: &ExportRequest) -> Result<Vec<u8>, ApiError> {
        let builder = self
            .client
            .post(self.url("events/export-pdf")?)
            .json(request);
        let response = self.execute("POST /events/export-pdf", builder).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
