// Skill assessment LLM prompt templates.
// Gemini receives the system instruction and the ratings prompt as one user part.

use crate::assessment::models::Answers;

pub const ASSESSMENT_SYSTEM: &str = r#"
You are an assistant that analyzes a student's self-rated technical skills.

You MUST respond with valid JSON only, with this exact shape:
{
  "score": number between 0 and 100,
  "detectedSkills": string[],
  "missingSkills": string[],
  "strengthAreas": string[],
  "shortSummary": string
}
Do not include any explanations or text outside of this JSON.
"#;

pub const RATINGS_PROMPT_TEMPLATE: &str = r#"
The user rated their skills on a scale from 0 (no experience) to 3 (strong):

frontend: {frontend}
backend: {backend}
data structures & algorithms: {dsa}
databases: {databases}
devops: {devops}
system design: {system_design}

Based on these ratings, infer:
- concrete skills they likely have (detectedSkills),
- important skills or areas they should work on (missingSkills),
- broader strength areas (strengthAreas),
- an overall readiness/strength score (0–100),
- and a short, encouraging summary (2–3 lines).
"#;

/// Builds the full prompt text. Deterministic for a given set of answers.
pub fn build_assessment_prompt(answers: &Answers) -> String {
    let ratings = RATINGS_PROMPT_TEMPLATE
        .replace("{frontend}", &answers.frontend.to_string())
        .replace("{backend}", &answers.backend.to_string())
        .replace("{dsa}", &answers.dsa.to_string())
        .replace("{databases}", &answers.databases.to_string())
        .replace("{devops}", &answers.devops.to_string())
        .replace("{system_design}", &answers.system_design.to_string());

    format!("{ASSESSMENT_SYSTEM}\n\n{ratings}")
}
