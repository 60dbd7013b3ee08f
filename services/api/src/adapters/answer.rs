//! services/api/src/adapters/answer.rs
//!
//! This module contains the templated answer generator. It implements the
//! `AnswerService` port from the `core` crate: no model call, no
//! randomness, just keyword extraction and a fixed set of response
//! templates, so the same question always produces the same answer.

use async_trait::async_trait;
use docqa_core::ports::{AnswerService, PortError, PortResult};
use regex::Regex;

/// Words dropped during keyword extraction, alongside anything of length <= 3.
const STOP_WORDS: [&str; 18] = [
    "what", "how", "when", "where", "why", "which", "that", "this", "with", "from", "they",
    "have", "been", "will", "can", "could", "would", "should",
];

/// The response skeleton a question maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateKind {
    Guide,
    Definition,
    Rationale,
    Analysis,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `AnswerService` with pure string templating.
pub struct TemplateAnswerAdapter {
    patterns: Vec<(Regex, TemplateKind)>,
}

impl Default for TemplateAnswerAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateAnswerAdapter {
    /// Creates the adapter, compiling the template-selection patterns.
    /// The patterns are tested against the raw question in order; the
    /// first match wins, and `Analysis` is the fallback.
    pub fn new() -> Self {
        let patterns = vec![
            (
                Regex::new(r"(?i)how|guide|steps|process").expect("valid pattern"),
                TemplateKind::Guide,
            ),
            (
                Regex::new(r"(?i)what|define|explain|meaning").expect("valid pattern"),
                TemplateKind::Definition,
            ),
            (
                Regex::new(r"(?i)why|reason|cause|benefit").expect("valid pattern"),
                TemplateKind::Rationale,
            ),
        ];
        Self { patterns }
    }

    /// Lowercases the question, drops stop words and short words, and
    /// keeps the first three remaining tokens in order.
    fn keywords(question: &str) -> Vec<String> {
        question
            .to_lowercase()
            .split_whitespace()
            .filter(|word| word.len() > 3 && !STOP_WORDS.contains(word))
            .take(3)
            .map(|word| word.to_string())
            .collect()
    }

    fn select_template(&self, question: &str) -> TemplateKind {
        self.patterns
            .iter()
            .find(|(pattern, _)| pattern.is_match(question))
            .map(|(_, kind)| *kind)
            .unwrap_or(TemplateKind::Analysis)
    }
}

//=========================================================================================
// `AnswerService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AnswerService for TemplateAnswerAdapter {
    /// Produces a formatted, multi-section answer for the question.
    async fn answer_question(&self, question: &str) -> PortResult<String> {
        if question.trim().is_empty() {
            return Err(PortError::Unexpected(
                "Cannot answer an empty question.".to_string(),
            ));
        }

        let keywords = Self::keywords(question);
        let answer = match self.select_template(question) {
            TemplateKind::Guide => guide_template(&keywords),
            TemplateKind::Definition => definition_template(&keywords),
            TemplateKind::Rationale => rationale_template(&keywords),
            TemplateKind::Analysis => analysis_template(&keywords),
        };
        Ok(answer)
    }
}

//=========================================================================================
// Templates
//=========================================================================================

/// The keyword at `index`, or the filler phrase when the question did not
/// yield enough keywords.
fn kw<'a>(keywords: &'a [String], index: usize, filler: &'a str) -> &'a str {
    keywords.get(index).map(String::as_str).unwrap_or(filler)
}

fn guide_template(keywords: &[String]) -> String {
    let joined = keywords.join(", ");
    format!(
        "# Step-by-Step Guide\n\n\
         Based on your question about {joined}, here's a comprehensive approach:\n\n\
         ## Overview\n\
         This process involves several key components that work together to achieve the desired outcome. The main focus areas include {joined} and their interconnected relationships.\n\n\
         ## Implementation Steps\n\n\
         • **Phase 1**: Initial assessment and planning\n\
         • **Phase 2**: Core implementation focusing on {first}\n\
         • **Phase 3**: Testing and validation\n\
         • **Phase 4**: Deployment and monitoring\n\n\
         ## Key Considerations\n\n\
         The most important factors to consider are performance, scalability, and maintainability. Special attention should be paid to {second} during the implementation phase.\n\n\
         ## Next Steps\n\n\
         1. Review the current state and requirements\n\
         2. Plan the implementation timeline\n\
         3. Execute the steps systematically\n\
         4. Monitor and adjust as needed",
        joined = joined,
        first = kw(keywords, 0, "primary objectives"),
        second = kw(keywords, 1, "secondary requirements"),
    )
}

fn definition_template(keywords: &[String]) -> String {
    let joined = keywords.join(", ");
    format!(
        "# Understanding {heading}\n\n\
         ## Definition\n\
         {subject} refers to a comprehensive framework that encompasses multiple aspects of {joined}. It's essential to understand both the theoretical foundations and practical applications.\n\n\
         ## Key Components\n\n\
         • **Core Elements**: The fundamental building blocks include {first}\n\
         • **Supporting Systems**: Secondary elements that enhance functionality\n\
         • **Integration Points**: How different parts connect and interact\n\n\
         ## Practical Applications\n\n\
         In real-world scenarios, {approach} is commonly used for:\n\n\
         - Streamlining processes and workflows\n\
         - Improving efficiency and performance\n\
         - Ensuring consistency across different systems\n\
         - Managing complexity in large-scale implementations\n\n\
         ## Benefits and Advantages\n\n\
         The primary advantages include enhanced {second}, improved {third}, and better overall system integration.",
        heading = kw(keywords, 0, "the Concept"),
        subject = kw(keywords, 0, "This concept"),
        joined = joined,
        first = kw(keywords, 0, "primary components"),
        approach = kw(keywords, 0, "this approach"),
        second = kw(keywords, 1, "performance"),
        third = kw(keywords, 2, "reliability"),
    )
}

fn rationale_template(keywords: &[String]) -> String {
    let joined = keywords.join(", ");
    format!(
        "# Why {heading} Matters\n\n\
         ## Primary Reasons\n\n\
         The main drivers behind {subject} stem from several key factors:\n\n\
         ### Business Impact\n\
         Organizations benefit significantly from implementing {solutions} because they address core operational challenges and improve overall efficiency.\n\n\
         ### Technical Advantages\n\
         From a technical perspective, {joined} provide:\n\n\
         • **Scalability**: Ability to grow with organizational needs\n\
         • **Reliability**: Consistent performance under various conditions\n\
         • **Maintainability**: Easier to update and modify over time\n\n\
         ## Long-term Benefits\n\n\
         The strategic advantages include reduced operational costs, improved user satisfaction, and better alignment with business objectives.\n\n\
         ## Risk Mitigation\n\n\
         By focusing on {second}, organizations can minimize potential issues and ensure more predictable outcomes.",
        heading = kw(keywords, 0, "This Approach"),
        subject = kw(keywords, 0, "this approach"),
        solutions = kw(keywords, 0, "these solutions"),
        joined = joined,
        second = kw(keywords, 1, "key areas"),
    )
}

fn analysis_template(keywords: &[String]) -> String {
    let joined = keywords.join(", ");
    let linked = keywords.join(" and ");
    format!(
        "# Analysis of Your Question\n\n\
         ## Overview\n\
         Your inquiry about {joined} touches on several important aspects that deserve careful consideration.\n\n\
         ## Key Points\n\n\
         • **Primary Focus**: The main area of interest appears to be {first}\n\
         • **Related Factors**: Additional considerations include {second}\n\
         • **Implementation**: Practical aspects involve {third}\n\n\
         ## Detailed Explanation\n\n\
         Based on the context of your question, the most relevant information includes both theoretical background and practical applications. The relationship between {linked} is particularly important for understanding the complete picture.\n\n\
         ## Recommendations\n\n\
         For optimal results, consider:\n\n\
         1. Thorough planning and preparation\n\
         2. Systematic implementation approach\n\
         3. Regular monitoring and adjustment\n\
         4. Continuous improvement processes\n\n\
         ## Additional Resources\n\n\
         Further exploration of {topic} would benefit from examining related case studies and best practices in similar scenarios.",
        joined = joined,
        first = kw(keywords, 0, "the core concept"),
        second = kw(keywords, 1, "supporting elements"),
        third = kw(keywords, 2, "execution strategies"),
        linked = linked,
        topic = kw(keywords, 0, "this topic"),
    )
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn answer(question: &str) -> String {
        let adapter = TemplateAnswerAdapter::new();
        adapter.answer_question(question).await.unwrap()
    }

    #[tokio::test]
    async fn same_question_always_yields_the_same_answer() {
        assert_eq!(
            answer("What is TypeScript?").await,
            answer("What is TypeScript?").await
        );
    }

    #[test]
    fn keyword_extraction_drops_stop_and_short_words() {
        let keywords = TemplateAnswerAdapter::keywords(
            "How should we design the upload simulator pipeline today?",
        );
        assert_eq!(keywords, vec!["design", "upload", "simulator"]);
    }

    #[tokio::test]
    async fn question_words_pick_their_template() {
        assert!(answer("How do I deploy this?").await.starts_with("# Step-by-Step Guide"));
        assert!(answer("What is TypeScript?").await.starts_with("# Understanding"));
        assert!(answer("Why bother with tests?").await.starts_with("# Why"));
    }

    #[tokio::test]
    async fn first_matching_pattern_wins() {
        // Contains both "how" (guide) and "why" (rationale); guide is listed first.
        assert!(answer("Why and how does caching help?")
            .await
            .starts_with("# Step-by-Step Guide"));
    }

    #[tokio::test]
    async fn unmatched_questions_fall_back_to_analysis() {
        let text = answer("Compare tokio and async-std runtimes").await;
        assert!(text.starts_with("# Analysis of Your Question"));
        assert!(text.contains("compare"));
    }

    #[tokio::test]
    async fn missing_keywords_use_filler_phrases() {
        // Every word is either a stop word or too short: no keywords at all.
        let text = answer("Why is it so?").await;
        assert!(text.contains("this approach"));
        assert!(text.contains("key areas"));
    }

    #[tokio::test]
    async fn empty_question_is_rejected() {
        let adapter = TemplateAnswerAdapter::new();
        assert!(adapter.answer_question("   ").await.is_err());
    }
}
