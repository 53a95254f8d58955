use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use std::sync::Arc;

use crate::catalog::{group_thousands, Catalog};
use crate::llm::ExplanationService;
use crate::recommend::{recommend, AdmissionChance, StudentPreferences};

const SIMILAR_LIMIT: usize = 5;

pub struct CommandHandler {
    catalog: Arc<Catalog>,
    explainer: Arc<ExplanationService>,
}

impl CommandHandler {
    pub fn new(catalog: Arc<Catalog>, explainer: Arc<ExplanationService>) -> Self {
        Self { catalog, explainer }
    }

    /// Runs one REPL line and returns the text to print.
    pub async fn handle_command(&self, input: &str) -> Result<String> {
        let input = input.trim();
        let (command, args) = input.split_once(' ').unwrap_or((input, ""));

        match command {
            "" => Ok(String::new()),
            "help" => Ok(help_text()),
            "meta" => self.meta(),
            "similar" => self.similar(args),
            "recommend" => self.recommend(args).await,
            other => Err(anyhow!("Unknown command: {}. Type 'help' for usage.", other)),
        }
    }

    fn meta(&self) -> Result<String> {
        let meta = self.catalog.meta();
        let mut out = format!("{}\n", "Exams and courses:".bold());
        for (exam, courses) in &meta.courses {
            out.push_str(&format!("  {}: {}\n", exam.cyan(), courses.join(", ")));
        }
        out.push_str(&format!("{}\n  {}\n", "States:".bold(), meta.states.join(", ")));
        out.push_str(&format!(
            "{}\n  {}",
            "College types:".bold(),
            meta.college_types.join(", ")
        ));
        Ok(out)
    }

    fn similar(&self, query: &str) -> Result<String> {
        if query.trim().is_empty() {
            bail!("Usage: similar <text>");
        }

        let hits = self.explainer.search().search(query, SIMILAR_LIMIT);
        let lines: Vec<String> = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                format!(
                    "{}. [Score: {:.2}] {} ({}, {})",
                    i + 1,
                    hit.score,
                    hit.college.college_name.bold(),
                    hit.college.city,
                    hit.college.state
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }

    async fn recommend(&self, args: &str) -> Result<String> {
        let prefs = parse_preferences(args)?;
        let recommendation = recommend(self.catalog.colleges(), &prefs)?;
        let explanations = self
            .explainer
            .explain_all(&recommendation.candidates, &prefs)
            .await;

        let mut out = format!("{}\n", recommendation.summary(self.catalog.len()).bold());
        for (i, (candidate, explanation)) in recommendation
            .candidates
            .iter()
            .zip(explanations)
            .enumerate()
        {
            let chance = match candidate.admission_chance {
                AdmissionChance::Safe => candidate.admission_chance.as_str().green(),
                AdmissionChance::Target => candidate.admission_chance.as_str().yellow(),
                AdmissionChance::Dream => candidate.admission_chance.as_str().red(),
            };
            out.push_str(&format!(
                "\n{:>2}. {} [{}] score {}/100\n    {}, {} | closing rank {} | ₹{} | NIRF #{} | placement {}%\n    {}\n",
                i + 1,
                candidate.college.college_name.bold(),
                chance,
                candidate.match_score,
                candidate.college.city,
                candidate.college.state,
                group_thousands(candidate.college.closing_rank),
                group_thousands(candidate.college.average_fees),
                candidate.college.nirf_ranking,
                candidate.college.placement_rate,
                explanation.dimmed(),
            ));
        }
        Ok(out)
    }
}

/// Parses `key=value` pairs. A word without `=` continues the previous
/// value, so `state=Tamil Nadu` works without quoting.
pub fn parse_preferences(args: &str) -> Result<StudentPreferences> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for word in args.split_whitespace() {
        match word.split_once('=') {
            Some((key, value)) => pairs.push((key.to_lowercase(), value.to_string())),
            None => match pairs.last_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(word);
                }
                None => bail!("Expected key=value, got '{}'", word),
            },
        }
    }

    let mut prefs = StudentPreferences::new("", "", 0, 0);
    for (key, value) in pairs {
        match key.as_str() {
            "exam" => prefs.exam = value,
            "course" => prefs.course = value,
            "rank" => prefs.rank = parse_number(&key, &value)?,
            "budget" | "budget_max" => prefs.budget_max = parse_number(&key, &value)?,
            "budget_min" => prefs.budget_min = parse_number(&key, &value)?,
            "state" => prefs.state = value,
            "type" | "college_type" => prefs.college_type = value,
            "ai" => {
                prefs.use_ai = value
                    .parse::<bool>()
                    .with_context(|| format!("ai must be true or false, got '{}'", value))?
            }
            other => bail!("Unknown option: {}", other),
        }
    }

    Ok(prefs)
}

fn parse_number(key: &str, value: &str) -> Result<i64> {
    value
        .replace([',', '_'], "")
        .parse()
        .with_context(|| format!("{} must be a whole number, got '{}'", key, value))
}

fn help_text() -> String {
    format!(
        "{}\n\
         \x20 recommend exam=JEE course=BTech rank=5000 budget=300000 [state=..] [type=Government|Private] [ai=false]\n\
         \x20 similar <text>     colleges closest to a free-text description\n\
         \x20 meta               exams, courses and states in the catalog\n\
         \x20 help               show this message\n\
         \x20 exit               quit",
        "Commands:".bold()
    )
}
