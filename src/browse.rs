use std::io::Write;

use crate::config::BrowseArgs;
use crate::jobs::{JobCollection, JobQuery, filter_jobs};
use crate::models::job::{Job, JobRecord};
use crate::stores::{ApplicationsStore, SavedJobsStore};

/// Fetch the requested number of pages, then print the jobs that match.
pub async fn run(
    collection: &JobCollection,
    saved: &SavedJobsStore,
    applications: &ApplicationsStore,
    args: &BrowseArgs,
) -> anyhow::Result<()> {
    collection.refetch().await;
    if let Some(error) = collection.snapshot().error {
        anyhow::bail!("Failed to fetch jobs: {error}");
    }

    for _ in 1..args.pages {
        if !collection.load_more().await {
            break;
        }
    }

    let state = collection.snapshot();
    if let Some(error) = &state.error {
        tracing::warn!("Stopped paging early: {error}");
    }

    let query = args.query();
    let jobs = filter_jobs(&state.jobs, &query);
    let mut out = std::io::stdout().lock();
    render(&mut out, &jobs, &query, |guid| {
        Markers {
            saved: saved.is_present(guid),
            applied: applications.is_present(guid),
        }
    })?;
    writeln!(
        out,
        "{} shown, {} loaded of {} available",
        jobs.len(),
        state.jobs.len(),
        state.total_count
    )?;
    Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Markers {
    pub saved: bool,
    pub applied: bool,
}

/// Write one line per job, after a line listing active filters.
pub fn render(
    out: &mut impl Write,
    jobs: &[Job],
    query: &JobQuery,
    markers: impl Fn(&str) -> Markers,
) -> std::io::Result<()> {
    let chips = query.active_filters();
    if !chips.is_empty() {
        let labels: Vec<_> = chips.into_iter().map(|c| c.label).collect();
        writeln!(out, "Filters: {}", labels.join(", "))?;
    }

    for job in jobs {
        let mark = markers(job.guid());
        let mut flags = String::new();
        if mark.saved {
            flags.push_str(" [saved]");
        }
        if mark.applied {
            flags.push_str(" [applied]");
        }

        let mut details = vec![job.company_name.as_str()];
        for field in [&job.main_category, &job.work_model, &job.job_type] {
            if !field.is_empty() {
                details.push(field);
            }
        }

        write!(out, "{} | {}", job.title, details.join(" | "))?;
        if let Some(salary) = format_salary(job) {
            write!(out, " | {salary}")?;
        }
        writeln!(out, "{flags}")?;
    }
    Ok(())
}

/// Human-readable salary range, or `None` when the listing has none.
pub fn format_salary(job: &JobRecord) -> Option<String> {
    let range = match (job.min_salary, job.max_salary) {
        (Some(min), Some(max)) if min != max => format!("{min:.0}-{max:.0}"),
        (Some(amount), _) | (None, Some(amount)) => format!("{amount:.0}"),
        (None, None) => return None,
    };
    if job.currency.is_empty() {
        Some(range)
    } else {
        Some(format!("{range} {}", job.currency))
    }
}
