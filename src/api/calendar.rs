use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::ValidationError;
use crate::http::AuthHttpClient;

use super::{expect_json, expect_success};

/// Appointment times travel as naive local datetimes without a `Z` suffix;
/// the backend interprets them as LocalDateTime. No UTC conversion happens on
/// either side.
mod local_datetime {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceDto {
    id: i64,
    name: String,
    background: String,
    foreground: String,
    active: bool,
}

/// Bookable resource (room, office, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: i64,
    pub name: String,
    pub background: String,
    pub foreground: String,
}

impl From<ResourceDto> for Resource {
    fn from(dto: ResourceDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            background: dto.background,
            foreground: dto.foreground,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppointmentDto {
    id: i64,
    subject: String,
    #[serde(with = "local_datetime")]
    start_time: NaiveDateTime,
    #[serde(with = "local_datetime")]
    end_time: NaiveDateTime,
    #[serde(default)]
    recurrence_rule: Option<String>,
    active: bool,
    #[serde(default)]
    resource_ids: Option<Vec<i64>>,
}

/// Scheduled presence slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub id: Option<i64>,
    pub subject: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub resource_ids: Vec<i64>,
    pub recurrence_rule: Option<String>,
}

impl From<AppointmentDto> for Appointment {
    fn from(dto: AppointmentDto) -> Self {
        Self {
            id: Some(dto.id),
            subject: dto.subject,
            start_time: dto.start_time,
            end_time: dto.end_time,
            resource_ids: dto.resource_ids.unwrap_or_default(),
            recurrence_rule: dto.recurrence_rule,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAppointmentRequest<'a> {
    subject: &'a str,
    #[serde(with = "local_datetime")]
    start_time: NaiveDateTime,
    #[serde(with = "local_datetime")]
    end_time: NaiveDateTime,
    resource_ids: &'a [i64],
    #[serde(skip_serializing_if = "Option::is_none")]
    recurrence_rule: Option<&'a str>,
    active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAppointmentRequest<'a> {
    subject: &'a str,
    #[serde(with = "local_datetime")]
    start_time: NaiveDateTime,
    #[serde(with = "local_datetime")]
    end_time: NaiveDateTime,
    resource_ids: &'a [i64],
    #[serde(skip_serializing_if = "Option::is_none")]
    recurrence_rule: Option<&'a str>,
}

/// Bindings for /resources and /appointments.
pub struct CalendarApi {
    http: AuthHttpClient,
    config: Arc<Settings>,
}

impl CalendarApi {
    pub fn new(http: AuthHttpClient, config: Arc<Settings>) -> Self {
        Self { http, config }
    }

    /// Active resources only.
    pub async fn get_resources(&self) -> crate::Result<Vec<Resource>> {
        let url = self.config.api.endpoint("/resources");
        let response = self.http.send(self.http.get(&url)).await?;
        let resources: Vec<ResourceDto> = expect_json(response).await?;
        Ok(resources
            .into_iter()
            .filter(|resource| resource.active)
            .map(Resource::from)
            .collect())
    }

    /// Active appointments only.
    pub async fn get_appointments(&self) -> crate::Result<Vec<Appointment>> {
        let url = self.config.api.endpoint("/appointments");
        let response = self.http.send(self.http.get(&url)).await?;
        let appointments: Vec<AppointmentDto> = expect_json(response).await?;
        Ok(appointments
            .into_iter()
            .filter(|appointment| appointment.active)
            .map(Appointment::from)
            .collect())
    }

    /// Every appointment needs at least one resource assignment.
    pub async fn create_appointment(
        &self,
        appointment: &Appointment,
    ) -> crate::Result<Appointment> {
        if appointment.resource_ids.is_empty() {
            return Err(ValidationError::MissingResources.into());
        }

        let request = CreateAppointmentRequest {
            subject: &appointment.subject,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            resource_ids: &appointment.resource_ids,
            recurrence_rule: appointment.recurrence_rule.as_deref(),
            active: true,
        };
        let url = self.config.api.endpoint("/appointments");
        let response = self.http.send(self.http.post(&url).json(&request)).await?;
        let dto: AppointmentDto = expect_json(response).await?;
        Ok(dto.into())
    }

    pub async fn update_appointment(
        &self,
        id: i64,
        appointment: &Appointment,
    ) -> crate::Result<Appointment> {
        let request = UpdateAppointmentRequest {
            subject: &appointment.subject,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            resource_ids: &appointment.resource_ids,
            recurrence_rule: appointment.recurrence_rule.as_deref(),
        };
        let url = self.config.api.endpoint(&format!("/appointments/{}", id));
        let response = self.http.send(self.http.put(&url).json(&request)).await?;
        let dto: AppointmentDto = expect_json(response).await?;
        Ok(dto.into())
    }

    /// Soft delete; the backend marks the appointment inactive.
    pub async fn delete_appointment(&self, id: i64) -> crate::Result<()> {
        let url = self.config.api.endpoint(&format!("/appointments/{}", id));
        let response = self.http.send(self.http.delete(&url)).await?;
        expect_success(response).await?;
        Ok(())
    }
}
