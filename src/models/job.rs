use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A job listing as returned by the remote job API.
///
/// Missing or `null` fields take their default; only `guid` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JobRecord {
    pub guid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub main_category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub company_name: String,
    pub company_logo: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub job_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub work_model: String,
    #[serde(deserialize_with = "null_as_default")]
    pub seniority_level: String,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub currency: String,
    #[serde(deserialize_with = "null_as_default")]
    pub locations: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pub_date: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub expiry_date: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub application_link: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl JobRecord {
    /// Salary used for ordering: the upper bound when known, else the lower bound.
    pub fn comparable_salary(&self) -> Option<f64> {
        self.max_salary.or(self.min_salary)
    }
}

/// A job held in the local collection.
///
/// `id` is a rendering key generated on first sight; identity is always `guid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(flatten)]
    pub record: JobRecord,
}

impl Job {
    /// Wrap a record with a freshly generated local id.
    pub fn new(record: JobRecord) -> Self {
        Self::with_id(record, uuid::Uuid::new_v4().to_string())
    }

    pub fn with_id(record: JobRecord, id: String) -> Self {
        Self { id, record }
    }

    pub fn guid(&self) -> &str {
        &self.record.guid
    }
}

impl Deref for Job {
    type Target = JobRecord;

    fn deref(&self) -> &JobRecord {
        &self.record
    }
}

/// One page of results from the remote job API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPage {
    pub jobs: Vec<JobRecord>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub total_count: Option<u64>,
}

impl JobPage {
    /// Parse a response body leniently.
    ///
    /// A missing or non-array `jobs` field is an empty page. Records that
    /// fail to parse or carry no `guid` are skipped.
    pub fn from_value(data: &Value) -> Self {
        let jobs = data
            .get("jobs")
            .and_then(|v| v.as_array())
            .map(|raw| raw.iter().filter_map(parse_record).collect())
            .unwrap_or_default();

        Self {
            jobs,
            offset: data.get("offset").and_then(|v| v.as_u64()),
            limit: data.get("limit").and_then(|v| v.as_u64()),
            total_count: data.get("total_count").and_then(|v| v.as_u64()),
        }
    }
}

fn parse_record(raw: &Value) -> Option<JobRecord> {
    let record: JobRecord = match JobRecord::deserialize(raw) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!("Skipping unparseable job record: {e}");
            return None;
        }
    };
    if record.guid.is_empty() {
        tracing::warn!("Skipping job record without guid: '{}'", record.title);
        return None;
    }
    Some(record)
}
