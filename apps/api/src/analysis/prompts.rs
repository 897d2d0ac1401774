//! Prompt templates for ATS scoring.
//!
//! The scorer sends ONE combined prompt: the system instruction and the user
//! request joined by a blank line.

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;

pub const ATS_SYSTEM_INSTRUCTION: &str = r#"You are an expert ATS (Applicant Tracking System) resume analyzer. Your task is to analyze resumes against job descriptions and provide detailed feedback.

{json_only}

Use this exact JSON schema:
{
  "atsScore": number (0-100),
  "matchPercentage": number (0-100),
  "summary": "Brief overall assessment (2-3 sentences)",
  "strengths": ["List of candidate's key strengths"],
  "weaknesses": ["Areas needing improvement"],
  "missingKeywords": ["Important keywords from job description not found in resume"],
  "skillsMatch": {
    "matched": ["Skills found in both resume and job description"],
    "missing": ["Required skills not found in resume"]
  },
  "experienceRelevance": "High" | "Medium" | "Low",
  "formattingIssues": ["Any ATS formatting problems detected"],
  "recommendations": ["Actionable suggestions for improvement"],
  "sectionScores": {
    "contactInfo": number (0-100),
    "summary": number (0-100),
    "experience": number (0-100),
    "education": number (0-100),
    "skills": number (0-100)
  }
}"#;

pub const ATS_USER_PROMPT_TEMPLATE: &str = r#"Please analyze the following resume against the job description provided.

RESUME TEXT:
{resume_text}

JOB DESCRIPTION:
{job_description}

Provide a comprehensive ATS analysis with specific scores and actionable recommendations."#;

/// Stands in for an empty job description.
pub const GENERAL_OPTIMIZATION_FALLBACK: &str =
    "No specific job description provided. Analyze the resume for general ATS optimization.";

pub fn build_ats_prompt(resume_text: &str, job_description: &str) -> String {
    let job_description = match job_description.trim() {
        "" => GENERAL_OPTIMIZATION_FALLBACK,
        jd => jd,
    };
    let system = ATS_SYSTEM_INSTRUCTION.replace("{json_only}", JSON_ONLY_INSTRUCTION);
    // Fill the job description last so resume text containing the placeholder
    // is left untouched.
    let user = ATS_USER_PROMPT_TEMPLATE
        .replace("{job_description}", job_description)
        .replacen("{resume_text}", resume_text, 1);
    format!("{system}\n\n{user}")
}
