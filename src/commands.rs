//! CLI surface: thin triggers around the pipelines and the store.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{SearchConfig, MIN_MATCH_SCORE, REQUEST_DELAY_MS};
use crate::db;
use crate::domain::models::{JobFilter, JobStatus};
use crate::repository::JobRepository;
use crate::service::scorer::load_resume;
use crate::service::{
    AnthropicClient, DiscoveryRunner, JobScorer, SearchExecutor, TaskKind, TaskTracker, Throttle,
};

#[derive(Parser)]
#[command(
    name = "jobhunter",
    about = "Automated job search and resume matching",
    version
)]
pub struct Cli {
    /// Path to the SQLite job database
    #[arg(long, global = true, default_value = "jobs.db")]
    pub db: PathBuf,

    /// Path to the search configuration file
    #[arg(long, global = true, default_value = "search_config.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize the database
    Init,
    /// Search for jobs and store new postings
    Scrape,
    /// Score unscored jobs against your resume
    Score {
        /// Path to resume file
        #[arg(short, long, default_value = "resume.txt")]
        resume: PathBuf,
    },
    /// List jobs with optional filters
    List {
        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,
        /// Minimum match score
        #[arg(short, long)]
        min_score: Option<i64>,
        /// Filter by company substring
        #[arg(short, long)]
        company: Option<String>,
        /// Max results
        #[arg(short, long, default_value_t = 50)]
        limit: i64,
    },
    /// Show details for a specific job
    Show { job_id: i64 },
    /// Show summary statistics
    Stats,
    /// Deep analysis of a job: score, gaps, cover letter points
    Analyze {
        job_id: i64,
        /// Path to resume file
        #[arg(short, long, default_value = "resume.txt")]
        resume: PathBuf,
    },
    /// Update job tracking status
    Status {
        job_id: i64,
        /// One of: new, reviewed, applied, interviewing, rejected
        new_status: String,
        /// Add notes
        #[arg(short, long)]
        notes: Option<String>,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    let pool = db::init_db(&cli.db).await?;
    let repo = JobRepository::new(pool.clone());

    match cli.command {
        Command::Init => {
            println!("Database initialized at {}", cli.db.display());
            println!("\nNext steps:");
            println!("1. Create resume.txt with your resume content");
            println!("2. Edit {} with your search parameters", cli.config.display());
            println!("3. Run 'jobhunter scrape' to fetch jobs");
            println!("4. Run 'jobhunter score' to score them");
        }

        Command::Scrape => {
            let config = SearchConfig::load(&cli.config)?;
            let throttle = Arc::new(Throttle::new(Duration::from_millis(REQUEST_DELAY_MS)));
            let executor = SearchExecutor::from_env(throttle)?;
            let runner = DiscoveryRunner::new(executor, repo, config);

            let tracker = TaskTracker::new();
            let task_id = tracker.create(TaskKind::Discovery);

            println!("Searching for jobs...");
            let report = runner.run(&tracker, &task_id).await?;
            tracker.report_done(&task_id, Ok(format!("Discovered {} links", report.discovered)));

            println!("{}", "=".repeat(60));
            println!(
                "Discovered {} links: {} inserted, {} updated, {} skipped, {} failed.",
                report.discovered, report.inserted, report.updated, report.skipped, report.failed
            );
            println!("\nRun 'jobhunter score' to score new jobs against your resume.");
        }

        Command::Score { resume } => {
            let resume_text = load_resume(&resume)?;
            let client = Arc::new(AnthropicClient::from_env()?);
            let scorer = JobScorer::new(client, repo, resume_text);

            let tracker = TaskTracker::new();
            let task_id = tracker.create(TaskKind::Scoring);

            let report = scorer.score_all(&tracker, &task_id).await?;
            tracker.report_done(&task_id, Ok(format!("Scored {} jobs", report.scored)));

            println!(
                "Scoring complete: {} scored, {} failed (failed jobs stay unscored and retry next run).",
                report.scored, report.failed
            );
        }

        Command::List {
            status,
            min_score,
            company,
            limit,
        } => {
            let status = status
                .map(|s| s.parse::<JobStatus>())
                .transpose()
                .map_err(|e| anyhow::anyhow!(e))?;

            let filter = JobFilter {
                status,
                min_score,
                company,
                limit: Some(limit),
            };
            let jobs = repo.list_filtered(&filter).await?;

            if jobs.is_empty() {
                println!("No jobs found matching criteria.");
                return Ok(());
            }

            println!(
                "\n{:<5} {:<7} {:<12} {:<20} {:<40}",
                "ID", "Score", "Status", "Company", "Title"
            );
            println!("{}", "-".repeat(90));

            for job in &jobs {
                let score = job
                    .match_score
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let marker = if job.is_high_match() { "* " } else { "" };
                println!(
                    "{:<5} {:<7} {:<12} {:<20} {}{}",
                    job.id,
                    score,
                    job.status.as_str(),
                    truncate(&job.company, 20),
                    marker,
                    truncate(&job.title, 40),
                );
            }
            println!(
                "\nShowing {} jobs. Use --min-score, --status, --company to filter.",
                jobs.len()
            );
        }

        Command::Show { job_id } => {
            let Some(job) = repo.get_by_id(job_id).await? else {
                bail!("Job {} not found", job_id);
            };

            println!("\n{}", "=".repeat(60));
            println!("Job #{}: {}", job.id, job.title);
            println!("{}", "=".repeat(60));
            println!("Company:  {}", job.company);
            println!("Location: {}", job.location);
            println!("Status:   {}", job.status);
            println!("URL:      {}", job.url);
            println!("Scraped:  {}", job.scraped_at.to_rfc3339());

            if let Some(score) = job.match_score {
                println!("\nMatch Score: {}/100", score);
                if let Some(reasoning) = &job.match_reasoning {
                    println!("Reasoning:\n{}", reasoning);
                }
            }

            if !job.notes.is_empty() {
                println!("\nNotes: {}", job.notes);
            }

            println!("\n--- Description ---");
            println!("{}", truncate(&job.description, 2000));
        }

        Command::Stats => {
            let stats = repo.aggregate_stats().await?;

            println!("\n=== Job Hunt Statistics ===\n");
            println!("Total jobs tracked: {}", stats.total);
            println!("Unscored: {}", stats.unscored);
            if let Some(avg) = stats.average_score {
                println!("Average match score: {:.1}/100", avg);
            }

            println!("\nBy Status:");
            for (status, count) in &stats.by_status {
                println!("  {}: {}", status, count);
            }

            println!("\nBy Company:");
            for (company, count) in stats.by_company.iter().take(10) {
                println!("  {}: {}", company, count);
            }
        }

        Command::Analyze { job_id, resume } => {
            let Some(job) = repo.get_by_id(job_id).await? else {
                bail!("Job {} not found", job_id);
            };
            let resume_text = load_resume(&resume)?;
            let client = Arc::new(AnthropicClient::from_env()?);
            let scorer = JobScorer::new(client, JobRepository::new(pool.clone()), resume_text);

            println!("\nAnalyzing: {} at {}", job.title, job.company);
            println!("{}", "=".repeat(60));

            let analysis = scorer.analyze(&job).await?;
            repo.update_score(job.id, analysis.score, &analysis.reasoning)
                .await?;

            println!("\nScore: {}/100", analysis.score);
            if analysis.score >= MIN_MATCH_SCORE {
                println!("HIGH MATCH");
            }
            println!("\n{}", analysis.reasoning);

            println!("\n{}", "-".repeat(40));
            println!("Resume Gap Analysis:");
            println!("{}", "-".repeat(40));
            println!("{}", analysis.gap_analysis);

            println!("\n{}", "-".repeat(40));
            println!("Cover Letter Key Points:");
            println!("{}", "-".repeat(40));
            println!("{}", analysis.cover_letter_points);
        }

        Command::Status {
            job_id,
            new_status,
            notes,
        } => {
            if repo.get_by_id(job_id).await?.is_none() {
                bail!("Job {} not found", job_id);
            }

            let status = new_status
                .parse::<JobStatus>()
                .map_err(|e| anyhow::anyhow!(e))?;
            repo.update_status(job_id, status)
                .await
                .context("failed to update status")?;

            if let Some(notes) = notes {
                repo.update_notes(job_id, &notes).await?;
            }

            println!("Updated job #{} status to '{}'", job_id, status);
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(2)).collect();
        format!("{}..", cut)
    }
}
