//! GoBarber API Client
//!
//! Thin layer over `reqwest` for the GoBarber REST API.
//! Every request carries the client's default headers; the authorization
//! entry among them has exactly one writer, [`BearerAuth`].

mod auth;
mod client;
mod dashboard;
mod error;
mod passwords;

pub use auth::{bearer_value, BearerAuth};
pub use client::ApiClient;
pub use dashboard::{
    appointments_for_day, month_availability, Appointment, AppointmentCustomer, DayAvailability,
};
pub use error::ApiError;
pub use passwords::{forgot_password, reset_password, PasswordReset};

pub use reqwest::header::HeaderValue;
pub use reqwest::multipart;
pub use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, ApiError>;
