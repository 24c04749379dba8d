use std::cmp::Ordering;
use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::job::{Job, JobRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalarySort {
    Highest,
    Lowest,
}

impl FromStr for SalarySort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "highest" => Ok(SalarySort::Highest),
            "lowest" => Ok(SalarySort::Lowest),
            other => Err(format!("Unknown salary sort '{other}' (expected highest or lowest)")),
        }
    }
}

/// Search text, exact-match filters and salary ordering for the job list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub job_type: Option<String>,
    pub work_model: Option<String>,
    pub seniority_level: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub salary_sort: Option<SalarySort>,
}

/// An empty `salary_sort=` means no sort, like the other empty filters.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<SalarySort>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// A label for one active filter, keyed so a client can remove it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterChip {
    pub key: &'static str,
    pub label: String,
}

impl JobQuery {
    /// Treat empty strings as "no selection".
    pub fn normalized(self) -> Self {
        let keep = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            search: keep(self.search),
            category: keep(self.category),
            job_type: keep(self.job_type),
            work_model: keep(self.work_model),
            seniority_level: keep(self.seniority_level),
            salary_sort: self.salary_sort,
        }
    }

    pub fn is_filtering(&self) -> bool {
        self.search.as_deref().is_some_and(|s| !s.is_empty())
            || self.category.is_some()
            || self.job_type.is_some()
            || self.work_model.is_some()
            || self.seniority_level.is_some()
            || self.salary_sort.is_some()
    }

    pub fn active_filters(&self) -> Vec<FilterChip> {
        let mut chips = Vec::new();
        if let Some(category) = &self.category {
            chips.push(FilterChip {
                key: "category",
                label: format!("Category: {category}"),
            });
        }
        if let Some(sort) = self.salary_sort {
            let label = match sort {
                SalarySort::Highest => "Salary: Highest",
                SalarySort::Lowest => "Salary: Lowest",
            };
            chips.push(FilterChip {
                key: "salary_sort",
                label: label.to_string(),
            });
        }
        if let Some(job_type) = &self.job_type {
            chips.push(FilterChip {
                key: "job_type",
                label: format!("Type: {job_type}"),
            });
        }
        if let Some(work_model) = &self.work_model {
            chips.push(FilterChip {
                key: "work_model",
                label: format!("Model: {work_model}"),
            });
        }
        if let Some(level) = &self.seniority_level {
            chips.push(FilterChip {
                key: "seniority_level",
                label: format!("Seniority: {level}"),
            });
        }
        chips
    }

    fn matches(&self, job: &JobRecord, needle: Option<&str>) -> bool {
        let exact = |selected: &Option<String>, value: &str| {
            selected.as_deref().is_none_or(|s| s == value)
        };

        needle.is_none_or(|n| {
            job.title.to_lowercase().contains(n)
                || job.company_name.to_lowercase().contains(n)
                || job.main_category.to_lowercase().contains(n)
        }) && exact(&self.category, &job.main_category)
            && exact(&self.job_type, &job.job_type)
            && exact(&self.work_model, &job.work_model)
            && exact(&self.seniority_level, &job.seniority_level)
    }
}

/// Narrow and order `jobs` by `query`. Without a salary sort the input
/// order is kept.
pub fn filter_jobs(jobs: &[Job], query: &JobQuery) -> Vec<Job> {
    let needle = query
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut filtered: Vec<Job> = jobs
        .iter()
        .filter(|job| query.matches(job, needle.as_deref()))
        .cloned()
        .collect();

    if let Some(sort) = query.salary_sort {
        // sort_by is stable, so ties keep arrival order.
        filtered.sort_by(|a, b| compare_salary(a, b, sort));
    }

    filtered
}

fn compare_salary(a: &JobRecord, b: &JobRecord, sort: SalarySort) -> Ordering {
    match (a.comparable_salary(), b.comparable_salary()) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => match sort {
            SalarySort::Highest => y.total_cmp(&x),
            SalarySort::Lowest => x.total_cmp(&y),
        },
    }
}

/// Distinct non-empty values present in the unfiltered list, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub job_types: Vec<String>,
    pub work_models: Vec<String>,
    pub seniority_levels: Vec<String>,
}

impl FilterOptions {
    pub fn from_jobs(jobs: &[Job]) -> Self {
        Self {
            categories: distinct(jobs, |j| &j.main_category),
            job_types: distinct(jobs, |j| &j.job_type),
            work_models: distinct(jobs, |j| &j.work_model),
            seniority_levels: distinct(jobs, |j| &j.seniority_level),
        }
    }
}

fn distinct<'a>(jobs: &'a [Job], field: impl Fn(&'a JobRecord) -> &'a String) -> Vec<String> {
    let mut seen = HashSet::new();
    jobs.iter()
        .map(|job| field(&job.record))
        .filter(|value| !value.is_empty() && seen.insert(value.as_str()))
        .cloned()
        .collect()
}
