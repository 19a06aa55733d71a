// src/seed/mod.rs

//! Data-seeding handler.
//!
//! Writes one synthetic CSV object to `<bucket>/<prefix>/data.csv` on
//! create/update and removes it (best effort) on delete. Settings come from
//! the environment first, then from the event's resource properties:
//!
//! - bucket: `BUCKET_NAME`, else `Bucket` (required)
//! - prefix: `RAW_PREFIX`, else `RawPrefix`, else `raw/`
//! - rows: `Rows`, else `ROWS`, else 200

pub mod dataset;
pub mod store;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::resource::{RequestType, ResourceEvent, ResourceResponse};

pub use dataset::{NUM_FEATURES, build_csv, generate_row};
pub use store::{LocalDirStore, MemoryObjectStore, ObjectStore, StoreError};

pub const DEFAULT_RAW_PREFIX: &str = "raw/";
pub const DEFAULT_ROWS: usize = 200;
pub const DATA_FILE_NAME: &str = "data.csv";
const UNRESOLVED_PHYSICAL_ID: &str = "seed-unresolved";

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("no bucket configured (set BUCKET_NAME or the Bucket property)")]
    MissingBucket,

    #[error("invalid row count '{0}'")]
    InvalidRows(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Row count as it may appear in properties: a number or numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RowCount {
    Number(u64),
    Text(String),
}

/// `ResourceProperties` of a seed event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SeedProperties {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub raw_prefix: Option<String>,
    #[serde(default)]
    pub rows: Option<RowCount>,
}

/// Fully resolved seeding target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSettings {
    pub bucket: String,
    pub raw_prefix: String,
    pub rows: usize,
}

impl SeedSettings {
    pub fn new(bucket: impl Into<String>, raw_prefix: impl Into<String>, rows: usize) -> Self {
        Self {
            bucket: bucket.into(),
            raw_prefix: raw_prefix.into(),
            rows,
        }
    }

    /// Resolve settings from `props`, consulting `env` for overrides.
    pub fn resolve(
        props: &SeedProperties,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SeedError> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());

        let bucket = non_empty(env("BUCKET_NAME"))
            .or_else(|| non_empty(props.bucket.clone()))
            .ok_or(SeedError::MissingBucket)?;

        let raw_prefix = non_empty(env("RAW_PREFIX"))
            .or_else(|| non_empty(props.raw_prefix.clone()))
            .unwrap_or_else(|| DEFAULT_RAW_PREFIX.to_string());

        let rows = match &props.rows {
            Some(RowCount::Number(n)) => usize::try_from(*n)
                .map_err(|_| SeedError::InvalidRows(n.to_string()))?,
            Some(RowCount::Text(s)) => parse_rows(s)?,
            None => match non_empty(env("ROWS")) {
                Some(s) => parse_rows(&s)?,
                None => DEFAULT_ROWS,
            },
        };

        Ok(Self {
            bucket,
            raw_prefix,
            rows,
        })
    }

    fn trimmed_prefix(&self) -> &str {
        self.raw_prefix.trim_end_matches('/')
    }

    pub fn object_key(&self) -> String {
        format!("{}/{DATA_FILE_NAME}", self.trimmed_prefix())
    }

    pub fn s3_uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.object_key())
    }

    /// Physical id used when the event does not carry one.
    pub fn default_physical_id(&self) -> String {
        format!("seed-{}-{}", self.bucket, self.trimmed_prefix())
    }

    /// Seed material for the dataset: identical settings give identical data.
    fn dataset_seed(&self) -> String {
        format!("{}/{}", self.bucket, self.object_key())
    }
}

/// The event's id, else one derived from the settings.
fn physical_id(event: &ResourceEvent<SeedProperties>, settings: Option<&SeedSettings>) -> String {
    event
        .physical_resource_id
        .clone()
        .or_else(|| settings.map(SeedSettings::default_physical_id))
        .unwrap_or_else(|| UNRESOLVED_PHYSICAL_ID.to_string())
}

fn parse_rows(s: &str) -> Result<usize, SeedError> {
    s.trim()
        .parse::<usize>()
        .map_err(|_| SeedError::InvalidRows(s.to_string()))
}

pub struct SeedHandler<S: ObjectStore> {
    store: S,
}

impl<S: ObjectStore> SeedHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle an event, reading overrides from the process environment.
    pub fn handle(
        &mut self,
        event: &ResourceEvent<SeedProperties>,
    ) -> Result<ResourceResponse, SeedError> {
        self.handle_with_env(event, |k| std::env::var(k).ok())
    }

    /// Create/Update need resolvable settings. Delete and unknown requests
    /// never fail: unresolvable settings are logged and the event's own
    /// physical id is echoed back.
    pub fn handle_with_env(
        &mut self,
        event: &ResourceEvent<SeedProperties>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ResourceResponse, SeedError> {
        let settings = SeedSettings::resolve(&event.resource_properties, env);

        match event.request_type {
            RequestType::Create | RequestType::Update => {
                let settings = settings?;
                let uri = self.seed(&settings)?;
                Ok(ResourceResponse::new(physical_id(event, Some(&settings)))
                    .with_data("S3Uri", uri)
                    .with_data("Rows", settings.rows))
            }
            RequestType::Delete => match settings {
                Ok(settings) => {
                    let key = settings.object_key();
                    if let Err(e) = self.store.delete_object(&settings.bucket, &key) {
                        warn!(bucket = %settings.bucket, %key, error = %e, "ignoring seed delete failure");
                    }
                    Ok(ResourceResponse::new(physical_id(event, Some(&settings))))
                }
                Err(e) => {
                    warn!(error = %e, "seed settings unresolved, skipping delete");
                    Ok(ResourceResponse::new(physical_id(event, None)))
                }
            },
            RequestType::Other => Ok(ResourceResponse::new(physical_id(
                event,
                settings.as_ref().ok(),
            ))),
        }
    }

    /// Write the dataset and return its `s3://` URI.
    pub fn seed(&mut self, settings: &SeedSettings) -> Result<String, SeedError> {
        let key = settings.object_key();
        let body = build_csv(&settings.dataset_seed(), settings.rows, NUM_FEATURES);
        self.store
            .put_object(&settings.bucket, &key, body.as_bytes())?;
        info!(bucket = %settings.bucket, %key, rows = settings.rows, "seeded dataset");
        Ok(settings.s3_uri())
    }
}
