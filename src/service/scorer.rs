//! Resume/job match scoring.
//!
//! Builds one structured prompt per job, calls the AI service, and parses
//! the response into a bounded score plus free-text reasoning. Score
//! extraction is a pure function of the response text: rescoring the same
//! response is deterministic, and a response with no numeric token leaves
//! the job unscored for the next run rather than defaulting to 0 (0 is a
//! real score and must never mean "not yet scored").

use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures::StreamExt;
use regex::Regex;
use std::sync::OnceLock;

use crate::config::{MIN_MATCH_SCORE, SCORING_CONCURRENCY};
use crate::domain::models::Job;
use crate::error::{AppError, Result};
use crate::repository::JobRepository;
use crate::service::anthropic::ScoreClient;
use crate::service::tasks::TaskTracker;

/// Longest slice of a job description included in a prompt.
const PROMPT_DESCRIPTION_CHARS: usize = 4000;

/// Outcome counts for one scoring run.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreReport {
    pub scored: usize,
    pub failed: usize,
}

/// Result of the deeper analyze variant.
#[derive(Debug, Clone)]
pub struct JobAnalysis {
    pub score: i64,
    pub reasoning: String,
    pub gap_analysis: String,
    pub cover_letter_points: String,
}

/// Load the candidate resume as an opaque string.
pub fn load_resume(path: &Path) -> Result<String> {
    let resume = std::fs::read_to_string(path).map_err(|_| {
        AppError::config(format!(
            "resume not found at {} (create it with your resume content)",
            path.display()
        ))
    })?;
    if resume.trim().is_empty() {
        return Err(AppError::config(format!(
            "resume at {} is empty",
            path.display()
        )));
    }
    Ok(resume)
}

/// Extract a match score from an AI response. Pure.
pub fn parse_score(text: &str) -> Result<i64> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        vec![
            // "SCORE: 82" on its own line (the format the prompt asks for)
            Regex::new(r"(?im)^\s*score\s*[:=]\s*(\d{1,3})").unwrap(),
            // "82/100" embedded anywhere
            Regex::new(r"(?i)(\d{1,3})\s*/\s*100").unwrap(),
            // "score ... 82" with drift between the word and the number
            Regex::new(r"(?i)score[^0-9]{0,12}(\d{1,3})").unwrap(),
            // any bare numeric token as a last resort
            Regex::new(r"(\d{1,3})").unwrap(),
        ]
    });

    for pattern in patterns {
        if let Some(caps) = pattern.captures(text) {
            if let Ok(value) = caps[1].parse::<i64>() {
                return Ok(value.min(100));
            }
        }
    }

    let preview: String = text.chars().take(80).collect();
    Err(AppError::ScoreParse(preview))
}

pub fn build_match_prompt(resume: &str, job: &Job) -> String {
    let description: String = job.description.chars().take(PROMPT_DESCRIPTION_CHARS).collect();

    format!(
        "You are a job matching expert. Analyze how well this job posting matches the candidate's resume.\n\n\
        CANDIDATE RESUME:\n{resume}\n\n\
        JOB POSTING:\n\
        Company: {company}\n\
        Title: {title}\n\
        Location: {location}\n\n\
        Description:\n{description}\n\n\
        Evaluate the match on these criteria:\n\
        1. Skills alignment (technical skills, tools, frameworks)\n\
        2. Experience level match (years of experience, seniority)\n\
        3. Industry/domain fit\n\
        4. Certifications/clearances match\n\
        5. Location compatibility\n\n\
        Provide your response in this exact format:\n\
        SCORE: [number 0-100]\n\
        REASONING: [2-3 sentences explaining the match, highlighting key alignments and gaps]\n\
        KEY_MATCHES: [comma-separated list of matching qualifications]\n\
        KEY_GAPS: [comma-separated list of missing requirements, or \"None\" if none]\n",
        resume = resume,
        company = job.company,
        title = job.title,
        location = job.location,
        description = description,
    )
}

pub fn build_gap_prompt(resume: &str, job: &Job) -> String {
    let description: String = job.description.chars().take(3000).collect();

    format!(
        "Analyze this job posting against the candidate's resume. \
        Identify any gaps or weaknesses, and suggest how to address them.\n\n\
        RESUME:\n{resume}\n\n\
        JOB POSTING:\n\
        Company: {company}\n\
        Title: {title}\n\
        Description:\n{description}\n\n\
        For each gap:\n\
        1. What requirement is not clearly met?\n\
        2. Does the candidate likely have relevant experience that isn't highlighted?\n\
        3. How could they reframe existing experience to address this?\n\
        4. Is this a dealbreaker or minor concern?\n\n\
        Be constructive and specific.\n",
        resume = resume,
        company = job.company,
        title = job.title,
        description = description,
    )
}

pub fn build_cover_letter_prompt(resume: &str, job: &Job) -> String {
    let description: String = job.description.chars().take(3000).collect();

    format!(
        "Based on this job posting and resume, identify the 3-5 most important points \
        the candidate should emphasize in their cover letter.\n\n\
        RESUME:\n{resume}\n\n\
        JOB POSTING:\n\
        Company: {company}\n\
        Title: {title}\n\
        Description:\n{description}\n\n\
        For each point:\n\
        1. Identify a specific requirement from the job\n\
        2. Connect it to a specific accomplishment from the resume\n\
        3. Suggest how to frame it\n\n\
        Format as bullet points.\n",
        resume = resume,
        company = job.company,
        title = job.title,
        description = description,
    )
}

/// Scores unscored jobs against a resume.
pub struct JobScorer {
    client: Arc<dyn ScoreClient>,
    repo: JobRepository,
    resume: String,
}

impl JobScorer {
    pub fn new(client: Arc<dyn ScoreClient>, repo: JobRepository, resume: String) -> Self {
        Self {
            client,
            repo,
            resume,
        }
    }

    /// Score one job. Returns the parsed score and the full response text
    /// as reasoning.
    pub async fn score_job(&self, job: &Job) -> Result<(i64, String)> {
        let prompt = build_match_prompt(&self.resume, job);
        let response = self.client.complete(&prompt).await?;
        let score = parse_score(&response)?;
        Ok((score, response.trim().to_string()))
    }

    /// Score every job currently lacking a match score. AI calls run with
    /// bounded concurrency; store writes happen one at a time in the
    /// consuming loop so no two writers ever touch the same row.
    pub async fn score_all(&self, tracker: &TaskTracker, task_id: &str) -> Result<ScoreReport> {
        let jobs = self.repo.list_unscored().await?;
        let total = jobs.len();
        let cancel_flag = tracker.cancel_flag(task_id);

        log::info!("Scoring {} unscored jobs", total);
        tracker.report_progress(task_id, 0, total, "");

        let mut report = ScoreReport::default();
        let mut done = 0;

        let mut results = futures::stream::iter(jobs)
            .map(|job| async move {
                let outcome = self.score_job(&job).await;
                (job, outcome)
            })
            .buffer_unordered(SCORING_CONCURRENCY);

        while let Some((job, outcome)) = results.next().await {
            if cancel_flag.load(Ordering::Relaxed) {
                log::warn!("Scoring task {} cancelled after {} jobs", task_id, done);
                break;
            }

            done += 1;
            tracker.report_progress(
                task_id,
                done,
                total,
                &format!("{} at {}", job.title, job.company),
            );

            match outcome {
                Ok((score, reasoning)) => {
                    match self.repo.update_score(job.id, score, &reasoning).await {
                        Ok(()) => {
                            if score >= MIN_MATCH_SCORE {
                                log::info!("HIGH MATCH {}/100: {} at {}", score, job.title, job.company);
                            }
                            report.scored += 1;
                        }
                        Err(e) => {
                            // The job was never marked scored, so the next
                            // run retries it
                            log::error!("Failed to persist score for job {}: {}", job.id, e);
                            report.failed += 1;
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Failed to score job {} ({}): {}", job.id, job.title, e);
                    report.failed += 1;
                }
            }
        }

        log::info!(
            "Scoring complete: {} scored, {} failed",
            report.scored,
            report.failed
        );
        Ok(report)
    }

    /// Deeper analysis of one job: match score plus gap analysis and cover
    /// letter talking points.
    pub async fn analyze(&self, job: &Job) -> Result<JobAnalysis> {
        let (score, reasoning) = self.score_job(job).await?;

        let gap_analysis = self
            .client
            .complete(&build_gap_prompt(&self.resume, job))
            .await?;
        let cover_letter_points = self
            .client
            .complete(&build_cover_letter_prompt(&self.resume, job))
            .await?;

        Ok(JobAnalysis {
            score,
            reasoning,
            gap_analysis,
            cover_letter_points,
        })
    }
}
