//! Provider dashboard endpoints
//!
//! Both need a signed-in session; the server reads the provider from the
//! bearer token for `appointments/me`.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::Result;

/// One calendar day of a provider's month
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayAvailability {
    pub day: u32,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub date: DateTime<Utc>,
    pub user: AppointmentCustomer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentCustomer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Which days of `year`/`month` still have free slots for `provider_id`
pub async fn month_availability(
    api: &ApiClient,
    provider_id: &str,
    year: i32,
    month: u32,
) -> Result<Vec<DayAvailability>> {
    let days: Vec<DayAvailability> = api
        .get_json(
            &format!("providers/{provider_id}/month-availability"),
            &[("year", year.to_string()), ("month", month.to_string())],
        )
        .await?;

    tracing::debug!(provider_id, year, month, days = days.len(), "Loaded month availability");

    Ok(days)
}

/// The signed-in provider's appointments on `date`, in server order
pub async fn appointments_for_day(api: &ApiClient, date: NaiveDate) -> Result<Vec<Appointment>> {
    let appointments: Vec<Appointment> = api
        .get_json(
            "appointments/me",
            &[
                ("year", date.year().to_string()),
                ("month", date.month().to_string()),
                ("day", date.day().to_string()),
            ],
        )
        .await?;

    tracing::debug!(%date, count = appointments.len(), "Loaded appointments");

    Ok(appointments)
}
