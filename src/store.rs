use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::{debug, warn};

use crate::settings::Settings;
use crate::extract::ProfileRecord;

const TABLE: &str = "entries";
const CONFLICT_COLUMNS: &str = "roll,section";
const MERGE_PREFERENCE: &str = "resolution=merge-duplicates";
const ACCEPTED: [u16; 3] = [200, 201, 204];

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum UpsertError {
    #[error("{status} - {body}")]
    Rejected { status: u16, body: String },
    #[error("Connection Error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Destination for profile rows. Writes merge on `(roll, section)`.
pub trait EntryStore {
    fn upsert(&self, record: &ProfileRecord) -> Result<(), UpsertError>;
}

/// PostgREST endpoint of the hosted `entries` table.
pub struct RestStore {
    client: Client,
    url: String,
    service_key: String,
}

impl RestStore {
    pub fn new(settings: &Settings, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(RestStore {
            client,
            url: format!(
                "{}/rest/v1/{}?on_conflict={}",
                settings.endpoint, TABLE, CONFLICT_COLUMNS
            ),
            service_key: settings.service_key.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl EntryStore for RestStore {
    fn upsert(&self, record: &ProfileRecord) -> Result<(), UpsertError> {
        let response = self
            .client
            .post(&self.url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", MERGE_PREFERENCE)
            .json(record)
            .send()?;

        let status = response.status().as_u16();
        if ACCEPTED.contains(&status) {
            debug!(roll = %record.roll, section = %record.section, status, "upserted");
            return Ok(());
        }
        let body = response.text().unwrap_or_else(|e| {
            warn!(roll = %record.roll, status, error = %e, "could not read error body");
            format!("<unreadable body: {}>", e)
        });
        Err(UpsertError::Rejected { status, body })
    }
}
