use futures::future::join_all;
use std::sync::Arc;

use crate::catalog::group_thousands;
use crate::llm::semantic_search::SemanticSearch;
use crate::providers::traits::CompletionProvider;
use crate::recommend::{AdmissionChance, ScoredCandidate, StudentPreferences};

/// Writes the short "why this college" text shown with each recommendation.
///
/// With a provider and `use_ai` set, the text comes from the language model,
/// primed with similar colleges from the vector store. Otherwise, or when the
/// provider fails, a rule-based explanation is used instead.
#[derive(Clone)]
pub struct ExplanationService {
    provider: Option<Arc<dyn CompletionProvider>>,
    search: SemanticSearch,
}

impl ExplanationService {
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>, search: SemanticSearch) -> Self {
        Self { provider, search }
    }

    pub fn search(&self) -> &SemanticSearch {
        &self.search
    }

    pub async fn explain(&self, candidate: &ScoredCandidate, prefs: &StudentPreferences) -> String {
        let provider = match (&self.provider, prefs.use_ai) {
            (Some(provider), true) => provider,
            _ => return fallback_explanation(candidate, prefs),
        };

        let context = self.search.context_for(&candidate.college, prefs);
        let prompt = build_prompt(candidate, prefs, &context);

        match provider.complete(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                log::warn!(
                    "Empty explanation for {}, using fallback",
                    candidate.college.college_name
                );
                fallback_explanation(candidate, prefs)
            }
            Err(e) => {
                log::warn!(
                    "Explanation for {} failed, using fallback: {}",
                    candidate.college.college_name,
                    e
                );
                fallback_explanation(candidate, prefs)
            }
        }
    }

    /// One explanation per candidate, in the same order.
    pub async fn explain_all(
        &self,
        candidates: &[ScoredCandidate],
        prefs: &StudentPreferences,
    ) -> Vec<String> {
        join_all(candidates.iter().map(|candidate| self.explain(candidate, prefs))).await
    }
}

pub fn build_prompt(candidate: &ScoredCandidate, prefs: &StudentPreferences, rag_context: &str) -> String {
    let college = &candidate.college;
    format!(
        "You are an expert Indian college admission counselor.\n\
         \n\
         Student Profile:\n\
         - Exam: {exam}\n\
         - Rank: {rank}\n\
         - Budget: ₹{budget}/year\n\
         - Preferred State: {state}\n\
         - Course: {course}\n\
         - College Type: {college_type}\n\
         \n\
         College Being Evaluated:\n\
         - Name: {name}\n\
         - Location: {city}, {college_state}\n\
         - Closing Rank: {closing_rank}\n\
         - Annual Fees: ₹{fees}\n\
         - NIRF Ranking: #{nirf}\n\
         - Placement Rate: {placement}%\n\
         - Match Score: {score}/100\n\
         - Admission Chance: {chance}\n\
         \n\
         Similar Colleges (RAG context for comparison):\n\
         {rag_context}\n\
         \n\
         Write a concise, personalized 2-3 sentence explanation for why this college is recommended for this student. \n\
         Mention: rank compatibility, fees vs budget, placement strength, and any notable advantage.\n\
         Be specific, encouraging, and honest about risks if it's a Dream college.\n\
         Do NOT use bullet points. Write in flowing prose. Keep it under 60 words.",
        exam = prefs.exam,
        rank = group_thousands(prefs.rank),
        budget = group_thousands(prefs.budget_max),
        state = prefs.state,
        course = prefs.course,
        college_type = prefs.college_type,
        name = college.college_name,
        city = college.city,
        college_state = college.state,
        closing_rank = group_thousands(college.closing_rank),
        fees = group_thousands(college.average_fees),
        nirf = college.nirf_ranking,
        placement = college.placement_rate,
        score = candidate.match_score,
        chance = candidate.admission_chance,
        rag_context = rag_context,
    )
}

pub fn fallback_explanation(candidate: &ScoredCandidate, prefs: &StudentPreferences) -> String {
    let college = &candidate.college;
    let rank = group_thousands(prefs.rank);
    let closing = group_thousands(college.closing_rank);

    let mut parts = vec![match candidate.admission_chance {
        AdmissionChance::Safe => format!(
            "Your rank ({}) is comfortably within the closing rank of {}, giving you a strong chance.",
            rank, closing
        ),
        AdmissionChance::Target => format!(
            "Your rank ({}) is close to the closing rank of {}, competitive but achievable.",
            rank, closing
        ),
        AdmissionChance::Dream => format!(
            "Your rank ({}) is above the closing rank of {}, an aspirational pick worth monitoring.",
            rank, closing
        ),
    }];

    if college.average_fees as f64 <= prefs.budget_max as f64 * 0.7 {
        parts.push(format!(
            "The fees of ₹{} are well within your budget.",
            group_thousands(college.average_fees)
        ));
    }
    if college.placement_rate >= 90 {
        parts.push(format!(
            "Outstanding placement record of {}%.",
            college.placement_rate
        ));
    }
    if college.nirf_ranking <= 10 {
        parts.push(format!("Ranked #{} nationally by NIRF.", college.nirf_ranking));
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::college;
    use crate::database::vector_db::VectorStore;
    use crate::providers::traits::TextStream;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingProvider {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingProvider {
        fn new(reply: Result<String, String>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for RecordingProvider {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(|e| anyhow!(e))
        }

        async fn stream_chat(&self, _system_prompt: &str, _user_message: &str) -> Result<TextStream> {
            Err(anyhow!("not used"))
        }

        async fn get_model_info(&self) -> Result<String> {
            Ok("recording".to_string())
        }
    }

    fn candidate(chance: AdmissionChance) -> ScoredCandidate {
        ScoredCandidate {
            college: college(1, "IIT Test", 1000),
            match_score: 77,
            admission_chance: chance,
        }
    }

    fn service(provider: Option<Arc<dyn CompletionProvider>>) -> ExplanationService {
        let store = VectorStore::build(vec![college(1, "IIT Test", 1000), college(2, "NIT Test", 4000)]);
        ExplanationService::new(provider, SemanticSearch::new(Arc::new(store)))
    }

    #[test]
    fn test_fallback_sentences() {
        let prefs = StudentPreferences::new("JEE", "BTech", 1200, 200_000);
        let text = fallback_explanation(&candidate(AdmissionChance::Dream), &prefs);
        assert_eq!(
            text,
            "Your rank (1,200) is above the closing rank of 1,000, an aspirational pick worth monitoring. \
             The fees of ₹100,000 are well within your budget. \
             Outstanding placement record of 90%. \
             Ranked #10 nationally by NIRF."
        );
    }

    #[test]
    fn test_fallback_omits_unmet_highlights() {
        let prefs = StudentPreferences::new("JEE", "BTech", 500, 120_000);
        let mut c = candidate(AdmissionChance::Safe);
        c.college.placement_rate = 89;
        c.college.nirf_ranking = 11;
        let text = fallback_explanation(&c, &prefs);
        assert_eq!(
            text,
            "Your rank (500) is comfortably within the closing rank of 1,000, giving you a strong chance."
        );
    }

    #[test]
    fn test_prompt_contains_context() {
        let prefs = StudentPreferences::new("JEE", "BTech", 1200, 200_000);
        let prompt = build_prompt(&candidate(AdmissionChance::Target), &prefs, "- CONTEXT LINE");
        assert!(prompt.contains("- Rank: 1,200"));
        assert!(prompt.contains("- Match Score: 77/100"));
        assert!(prompt.contains("- Admission Chance: Target"));
        assert!(prompt.contains("Similar Colleges (RAG context for comparison):\n- CONTEXT LINE"));
    }

    #[tokio::test]
    async fn test_uses_provider_with_rag_context() {
        let provider = RecordingProvider::new(Ok("  Great fit.  ".to_string()));
        let service = service(Some(provider.clone() as Arc<dyn CompletionProvider>));
        let prefs = StudentPreferences::new("JEE", "BTech", 1200, 200_000);

        let text = service.explain(&candidate(AdmissionChance::Dream), &prefs).await;
        assert_eq!(text, "Great fit.");

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("- IIT Test (Karnataka): Exam=JEE"));
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let provider = RecordingProvider::new(Err("rate limited".to_string()));
        let service = service(Some(provider as Arc<dyn CompletionProvider>));
        let prefs = StudentPreferences::new("JEE", "BTech", 1200, 200_000);
        let c = candidate(AdmissionChance::Dream);
        assert_eq!(service.explain(&c, &prefs).await, fallback_explanation(&c, &prefs));
    }

    #[tokio::test]
    async fn test_ai_disabled_skips_provider() {
        let provider = RecordingProvider::new(Ok("model text".to_string()));
        let service = service(Some(provider.clone() as Arc<dyn CompletionProvider>));
        let prefs = StudentPreferences::new("JEE", "BTech", 1200, 200_000).with_ai(false);
        let c = candidate(AdmissionChance::Safe);

        assert_eq!(service.explain(&c, &prefs).await, fallback_explanation(&c, &prefs));
        assert!(provider.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_explain_all_keeps_order() {
        let service = service(None);
        let prefs = StudentPreferences::new("JEE", "BTech", 1200, 200_000);
        let candidates = vec![candidate(AdmissionChance::Safe), candidate(AdmissionChance::Dream)];
        let texts = service.explain_all(&candidates, &prefs).await;
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("comfortably within"));
        assert!(texts[1].contains("aspirational"));
    }
}
