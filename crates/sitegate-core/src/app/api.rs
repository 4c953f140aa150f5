//! Worker-facing request and response shapes.
//!
//! Inbound bodies are deserialized into all-optional raw structs and then
//! validated into commands, so a missing or out-of-range field produces a
//! coded rejection instead of a generic parse failure. Outbound, every result
//! is rendered as `{ success, data | error, code }`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    AdmissionError, AssignmentId, CoordinateError, EmployeeId, MAX_PROGRESS, Position,
    StartEligibility,
};

use super::state_machine::{
    AssignmentStateMachine, ProgressCommand, ProgressOutcome, StartCommand, StartOutcome,
};

/// Success codes.
pub mod codes {
    pub const TASK_STARTED: &str = "TASK_STARTED";
    pub const PROGRESS_UPDATED: &str = "PROGRESS_UPDATED";
    pub const TASK_COMPLETED: &str = "TASK_COMPLETED";
    pub const ELIGIBILITY_EVALUATED: &str = "ELIGIBILITY_EVALUATED";
}

/// Boundary validation failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("malformed request body: {0}")]
    Malformed(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must be a positive integer, got {value}")]
    InvalidId { field: &'static str, value: i64 },

    #[error(transparent)]
    Coordinates(#[from] CoordinateError),

    #[error("progressPercent must be between 0 and 100, got {0}")]
    ProgressOutOfRange(i64),
}

impl From<RequestError> for AdmissionError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Coordinates(c) => AdmissionError::InvalidCoordinates(c),
            RequestError::ProgressOutOfRange(v) => AdmissionError::InvalidProgressValue(v),
            other => AdmissionError::InvalidRequest(other.to_string()),
        }
    }
}

/// Deserialize a JSON body, mapping syntax and type errors to `Malformed`.
pub fn parse<T: DeserializeOwned>(body: &str) -> Result<T, RequestError> {
    serde_json::from_str(body).map_err(|e| RequestError::Malformed(e.to_string()))
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInput {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl PositionInput {
    pub fn validate(&self) -> Result<Position, CoordinateError> {
        let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) else {
            return Err(CoordinateError::Missing);
        };
        let mut position = Position::new(latitude, longitude)?;
        if let Some(accuracy) = self.accuracy {
            position = position.with_accuracy(accuracy);
        }
        if let Some(timestamp) = self.timestamp {
            position = position.with_timestamp(timestamp);
        }
        Ok(position)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub assignment_id: Option<i64>,
    pub position: Option<PositionInput>,
}

impl StartRequest {
    /// The actor comes from the authenticated session, never from the body.
    pub fn into_command(self, actor: EmployeeId) -> Result<StartCommand, RequestError> {
        let assignment_id = assignment_id(self.assignment_id)?;
        let position = self.position.as_ref().map(PositionInput::validate).transpose()?;
        Ok(StartCommand {
            assignment_id,
            employee_id: actor,
            position,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    pub assignment_id: Option<i64>,
    pub progress_percent: Option<i64>,
    pub description: Option<String>,
    pub position: Option<PositionInput>,
}

impl ProgressRequest {
    pub fn into_command(self, actor: EmployeeId) -> Result<ProgressCommand, RequestError> {
        let assignment_id = assignment_id(self.assignment_id)?;
        let raw = self
            .progress_percent
            .ok_or(RequestError::MissingField("progressPercent"))?;
        let progress_percent = u8::try_from(raw)
            .ok()
            .filter(|p| *p <= MAX_PROGRESS)
            .ok_or(RequestError::ProgressOutOfRange(raw))?;
        let position = self.position.as_ref().map(PositionInput::validate).transpose()?;
        Ok(ProgressCommand {
            assignment_id,
            employee_id: actor,
            progress_percent,
            description: self.description.unwrap_or_default(),
            position,
        })
    }
}

fn assignment_id(raw: Option<i64>) -> Result<AssignmentId, RequestError> {
    let raw = raw.ok_or(RequestError::MissingField("assignmentId"))?;
    AssignmentId::from_raw(raw).ok_or(RequestError::InvalidId {
        field: "assignmentId",
        value: raw,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub code: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, code: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: code.to_string(),
        }
    }

    pub fn rejected(err: &AdmissionError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                message: err.to_string(),
                details: err.details(),
            }),
            code: err.code().as_str().to_string(),
        }
    }
}

pub async fn handle_start(
    machine: &AssignmentStateMachine,
    actor: EmployeeId,
    request: StartRequest,
) -> ApiResponse<StartOutcome> {
    let command = match request.into_command(actor) {
        Ok(command) => command,
        Err(err) => return ApiResponse::rejected(&err.into()),
    };
    match machine.start(command).await {
        Ok(outcome) => ApiResponse::ok(outcome, codes::TASK_STARTED),
        Err(err) => ApiResponse::rejected(&err),
    }
}

pub async fn handle_progress(
    machine: &AssignmentStateMachine,
    actor: EmployeeId,
    request: ProgressRequest,
) -> ApiResponse<ProgressOutcome> {
    let command = match request.into_command(actor) {
        Ok(command) => command,
        Err(err) => return ApiResponse::rejected(&err.into()),
    };
    match machine.progress(command).await {
        Ok(outcome) if outcome.completed => ApiResponse::ok(outcome, codes::TASK_COMPLETED),
        Ok(outcome) => ApiResponse::ok(outcome, codes::PROGRESS_UPDATED),
        Err(err) => ApiResponse::rejected(&err),
    }
}

pub async fn handle_check(
    machine: &AssignmentStateMachine,
    actor: EmployeeId,
    request: StartRequest,
) -> ApiResponse<StartEligibility> {
    let command = match request.into_command(actor) {
        Ok(command) => command,
        Err(err) => return ApiResponse::rejected(&err.into()),
    };
    match machine.eligibility(&command).await {
        Ok(report) => ApiResponse::ok(report, codes::ELIGIBILITY_EVALUATED),
        Err(err) => ApiResponse::rejected(&err),
    }
}
