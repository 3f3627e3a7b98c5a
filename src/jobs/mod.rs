//! Background jobs and their scheduler.
//!
//! Each job has a descriptor in the `jobs` collection. The scheduler only
//! runs on the instance started with `JOB_INSTANCE=true`, and a scheduled
//! run is skipped while the descriptor is switched off.

pub mod cleanup_job;
pub mod gametip_job;
pub mod kickoff_job;
pub mod reminder_job;
pub mod result_job;
pub mod standings_job;

use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime};
use mongodb::bson::{doc, DateTime as BsonDateTime};

use crate::errors::{AppError, Result};
use crate::models::job::JobDescriptor;
use crate::services::data_service;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Every day at the given local time.
    Daily { hour: u32, minute: u32 },
    Every(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Reminder,
    Standings,
    Cleanup,
    Kickoff,
    Result,
    GameTip,
}

impl JobKind {
    pub const ALL: [JobKind; 6] = [
        JobKind::Reminder,
        JobKind::Standings,
        JobKind::Cleanup,
        JobKind::Kickoff,
        JobKind::Result,
        JobKind::GameTip,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            JobKind::Reminder => "ReminderJob",
            JobKind::Standings => "StandingsJob",
            JobKind::Cleanup => "CleanupJob",
            JobKind::Kickoff => "KickoffJob",
            JobKind::Result => "ResultJob",
            JobKind::GameTip => "GameTipJob",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    pub fn description(&self) -> &'static str {
        match self {
            JobKind::Reminder => "Reminds users of games and extras within the next 24 hours they have not tipped yet",
            JobKind::Standings => "Sends the current top 3 to every user who has this notification activated",
            JobKind::Cleanup => "Deletes users who did not activate their account within 2 days",
            JobKind::Kickoff => "Updates the kickoff of the current and the next three playdays from OpenLigaDB",
            JobKind::Result => "Fetches results of finished games from OpenLigaDB",
            JobKind::GameTip => "Sends all tips of games closed for tipping to users who want them",
        }
    }

    pub fn schedule(&self) -> Schedule {
        match self {
            JobKind::Reminder => Schedule::Every(Duration::from_secs(60 * 60)),
            JobKind::Standings => Schedule::Daily { hour: 3, minute: 0 },
            JobKind::Cleanup => Schedule::Daily { hour: 2, minute: 0 },
            JobKind::Kickoff => Schedule::Daily { hour: 5, minute: 0 },
            JobKind::Result => Schedule::Every(Duration::from_secs(5 * 60)),
            JobKind::GameTip => Schedule::Every(Duration::from_secs(60)),
        }
    }

    pub fn executed(&self) -> String {
        match self.schedule() {
            Schedule::Daily { hour, minute } => format!("Runs daily at {:02}:{:02}", hour, minute),
            Schedule::Every(interval) if interval.as_secs() % 3600 == 0 => {
                let hours = interval.as_secs() / 3600;
                if hours == 1 {
                    "Runs every hour".to_string()
                } else {
                    format!("Runs every {} hours", hours)
                }
            }
            Schedule::Every(interval) => {
                let minutes = interval.as_secs() / 60;
                if minutes == 1 {
                    "Runs every minute".to_string()
                } else {
                    format!("Runs every {} minutes", minutes)
                }
            }
        }
    }

    pub fn descriptor(&self) -> JobDescriptor {
        JobDescriptor {
            id: None,
            name: self.name().to_string(),
            description: self.description().to_string(),
            executed: self.executed(),
            active: true,
            last_run: None,
        }
    }
}

pub fn descriptors() -> Vec<JobDescriptor> {
    JobKind::ALL.iter().map(JobKind::descriptor).collect()
}

/// Time from `now` (local wall clock) until the next run.
pub fn next_delay(schedule: Schedule, now: NaiveDateTime) -> Duration {
    match schedule {
        Schedule::Every(interval) => interval,
        Schedule::Daily { hour, minute } => {
            let at = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
            let mut next = now.date().and_time(at);
            if next <= now {
                next += chrono::Duration::days(1);
            }
            (next - now).to_std().unwrap_or(Duration::from_secs(60))
        }
    }
}

pub fn start_scheduler(state: AppState) {
    for kind in JobKind::ALL {
        let state = state.clone();
        tokio::spawn(async move {
            tracing::info!("Scheduled {}: {}", kind.name(), kind.executed());
            loop {
                let delay = next_delay(kind.schedule(), Local::now().naive_local());
                tokio::time::sleep(delay).await;

                match is_active(&state, kind).await {
                    Ok(true) => {
                        if let Err(e) = run_job(&state, kind).await {
                            tracing::error!("Job {} failed: {}", kind.name(), e);
                        }
                    }
                    Ok(false) => tracing::debug!("Job {} is inactive, skipping", kind.name()),
                    Err(e) => tracing::error!("Failed to load descriptor of {}: {}", kind.name(), e),
                }
            }
        });
    }
}

async fn is_active(state: &AppState, kind: JobKind) -> Result<bool> {
    let descriptor = data_service::jobs(&state.db)
        .find_one(doc! { "name": kind.name() })
        .await?;
    Ok(descriptor.map(|d| d.active).unwrap_or(false))
}

/// Executes the job body right away, regardless of the schedule.
pub async fn run_job(state: &AppState, kind: JobKind) -> Result<()> {
    tracing::info!("Started job: {}", kind.name());

    match kind {
        JobKind::Reminder => reminder_job::run(state).await?,
        JobKind::Standings => standings_job::run(state).await?,
        JobKind::Cleanup => cleanup_job::run(state).await?,
        JobKind::Kickoff => kickoff_job::run(state).await?,
        JobKind::Result => result_job::run(state).await?,
        JobKind::GameTip => gametip_job::run(state).await?,
    }

    data_service::jobs(&state.db)
        .update_one(
            doc! { "name": kind.name() },
            doc! { "$set": { "last_run": BsonDateTime::now() } },
        )
        .await?;

    tracing::info!("Finished job: {}", kind.name());
    Ok(())
}

pub async fn run_by_name(state: &AppState, name: &str) -> Result<()> {
    let kind = JobKind::from_name(name).ok_or(AppError::DocumentNotFound)?;
    run_job(state, kind).await
}
