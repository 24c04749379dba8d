use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::job::Job;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

const MIN_NAME_LEN: usize = 2;
const MIN_CONTACT_LEN: usize = 7;
const MIN_COVER_LETTER_LEN: usize = 30;
const MAX_COVER_LETTER_LEN: usize = 500;

/// A submitted application. `id` is the guid of the job applied to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub job: Job,
    pub name: String,
    pub email: String,
    pub contact: String,
    pub cover_letter: String,
    /// Epoch milliseconds.
    pub submitted_at: i64,
}

impl Application {
    pub fn new(job: Job, form: ApplicationForm) -> Self {
        Self {
            id: job.guid().to_string(),
            job,
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            contact: form.contact.trim().to_string(),
            cover_letter: form.cover_letter.trim().to_string(),
            submitted_at: Utc::now().timestamp_millis(),
        }
    }
}

/// Applicant details as entered by the user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationForm {
    pub name: String,
    pub email: String,
    pub contact: String,
    #[serde(alias = "coverLetter")]
    pub cover_letter: String,
}

impl ApplicationForm {
    /// Check every field, collecting one message per problem.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("Full name is required".to_string());
        } else if name.chars().count() < MIN_NAME_LEN {
            errors.push("Name is too short".to_string());
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.push("Email is required".to_string());
        } else if !EMAIL_RE.is_match(email) {
            errors.push("Invalid email format".to_string());
        }

        let contact = self.contact.trim();
        if contact.is_empty() {
            errors.push("Contact number is required".to_string());
        } else if contact.chars().count() < MIN_CONTACT_LEN {
            errors.push("Contact seems too short".to_string());
        }

        let letter_len = self.cover_letter.trim().chars().count();
        if letter_len == 0 {
            errors.push("Cover letter is required".to_string());
        } else if letter_len < MIN_COVER_LETTER_LEN {
            errors.push("Cover letter is too short".to_string());
        } else if letter_len > MAX_COVER_LETTER_LEN {
            errors.push(format!("Max {MAX_COVER_LETTER_LEN} characters"));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
