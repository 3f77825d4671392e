//! Prompt assembly
//!
//! Selects one of three prompt plans from the state of the request context
//! and renders it into model-ready text plus the variables sent alongside it.

use deskpilot_core::{Article, PromptVariables, Tone};

/// Opening sentence of every reply drafted without matching articles
pub const NO_RESULTS_DISCLAIMER: &str =
    "I couldn't find specific information about this in our knowledge base, but I can offer some general guidance.";

/// Rules every grounded reply must follow when citing articles
pub const CITATION_RULES: &str = r#"CITATION REQUIREMENTS:
1. You MUST use the knowledge base articles provided above to answer the question.
2. You MUST cite every article you use with the exact format (Article ID: <id>) at the point where you use its information.
3. You MUST include at least one citation, since articles were provided.
4. You MUST NOT alter the formatting of article ids in any way.
5. You MUST use the article ids exactly as they are given above."#;

/// Writing style rules for grounded replies
pub const STYLE_RULES: &str = r#"STYLE GUIDELINES:
1. Acknowledge the customer's situation with empathy.
2. Use plain language and avoid jargon.
3. Give concrete examples where they help.
4. Break complex ideas into small, clear steps.
5. Keep a supportive tone throughout the reply."#;

const TRUNCATION_MARKER: &str = "[content truncated]";

/// Which prompt strategy was selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    NoAccess,
    NoResults,
    Grounded,
}

impl PromptState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptState::NoAccess => "no_access",
            PromptState::NoResults => "no_results",
            PromptState::Grounded => "grounded",
        }
    }
}

/// The knowledge base could not be reached
#[derive(Debug, Clone, PartialEq)]
pub struct NoAccessPlan {
    pub prompt: String,
    pub tone: Tone,
}

/// The knowledge base was reachable but had nothing relevant
#[derive(Debug, Clone, PartialEq)]
pub struct NoResultsPlan {
    pub prompt: String,
    pub tone: Tone,
}

/// At least one candidate article is available
#[derive(Debug, Clone, PartialEq)]
pub struct GroundedPlan {
    pub prompt: String,
    pub tone: Tone,
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromptPlan {
    NoAccess(NoAccessPlan),
    NoResults(NoResultsPlan),
    Grounded(GroundedPlan),
}

/// Rendered prompt ready for the completion provider
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPrompt {
    pub state: PromptState,
    pub text: String,
    pub variables: PromptVariables,
}

impl PromptPlan {
    /// Pick the plan: no access beats no results beats grounded
    pub fn select(
        has_valid_db_access: bool,
        relevant_articles: &[Article],
        prompt: &str,
        tone: Tone,
    ) -> Self {
        let prompt = prompt.to_string();
        if !has_valid_db_access {
            PromptPlan::NoAccess(NoAccessPlan { prompt, tone })
        } else if relevant_articles.is_empty() {
            PromptPlan::NoResults(NoResultsPlan { prompt, tone })
        } else {
            PromptPlan::Grounded(GroundedPlan {
                prompt,
                tone,
                articles: relevant_articles.to_vec(),
            })
        }
    }

    pub fn state(&self) -> PromptState {
        match self {
            PromptPlan::NoAccess(_) => PromptState::NoAccess,
            PromptPlan::NoResults(_) => PromptState::NoResults,
            PromptPlan::Grounded(_) => PromptState::Grounded,
        }
    }

    /// Render the plan. Article context is serialized once and shared by the
    /// template body and the `context` variable.
    pub fn render(&self, max_context_length: usize) -> AssembledPrompt {
        match self {
            PromptPlan::NoAccess(plan) => AssembledPrompt {
                state: PromptState::NoAccess,
                text: no_access_prompt(&plan.prompt, plan.tone),
                variables: variables(&plan.prompt, plan.tone, String::new()),
            },
            PromptPlan::NoResults(plan) => AssembledPrompt {
                state: PromptState::NoResults,
                text: no_results_prompt(&plan.prompt, plan.tone),
                variables: variables(&plan.prompt, plan.tone, String::new()),
            },
            PromptPlan::Grounded(plan) => {
                let context = format_article_context(&plan.articles, max_context_length);
                AssembledPrompt {
                    state: PromptState::Grounded,
                    text: grounded_prompt(&plan.prompt, plan.tone, &context),
                    variables: variables(&plan.prompt, plan.tone, context),
                }
            }
        }
    }
}

fn variables(prompt: &str, tone: Tone, context: String) -> PromptVariables {
    PromptVariables {
        prompt: prompt.to_string(),
        tone: tone.to_string(),
        context,
    }
}

/// Serialize articles with per-article citation reminders, followed by the
/// citation rules. Article bodies share a budget of `max_context_length`
/// characters; ids and titles are always written.
pub fn format_article_context(articles: &[Article], max_context_length: usize) -> String {
    let mut remaining = max_context_length;
    let mut blocks = Vec::with_capacity(articles.len());

    for article in articles {
        let body_chars = article.content.chars().count();
        let body = if body_chars <= remaining {
            remaining -= body_chars;
            article.content.clone()
        } else {
            let kept: String = article.content.chars().take(remaining).collect();
            remaining = 0;
            if kept.is_empty() {
                TRUNCATION_MARKER.to_string()
            } else {
                format!("{}\n{}", kept, TRUNCATION_MARKER)
            }
        };

        blocks.push(format!(
            "Article ID: {id}\nTitle: {title}\nContent:\n{body}\nReminder: when you use this article, cite it as (Article ID: {id}).",
            id = article.id,
            title = article.title,
            body = body,
        ));
    }

    format!(
        "KNOWLEDGE BASE ARTICLES:\n\n{}\n\n{}",
        blocks.join("\n\n---\n\n"),
        CITATION_RULES
    )
}

fn no_access_prompt(prompt: &str, tone: Tone) -> String {
    format!(
        r#"You are a customer support agent drafting a reply in a {tone} tone.

Our knowledge base is currently unavailable, so you cannot look up specific articles for this request.

In your reply:
1. Acknowledge that you are unable to access our knowledge base right now.
2. Apologize for the inconvenience.
3. Offer the best general guidance you can for the customer's question.
4. Suggest alternatives, such as trying again later or contacting our support team directly.

Customer question:
{prompt}

Draft reply:"#
    )
}

fn no_results_prompt(prompt: &str, tone: Tone) -> String {
    format!(
        r#"You are a customer support agent drafting a reply in a {tone} tone.

No knowledge base articles matched this request. Begin your reply with exactly this sentence:
"{disclaimer}"

Then provide empathetic, general guidance that addresses the customer's question, and invite them to share more details if needed.

Customer question:
{prompt}

Draft reply:"#,
        disclaimer = NO_RESULTS_DISCLAIMER
    )
}

fn grounded_prompt(prompt: &str, tone: Tone, context: &str) -> String {
    format!(
        r#"You are a customer support agent drafting a reply in a {tone} tone.

Answer the customer's question using the knowledge base articles below.

{context}

{style}

Customer question:
{prompt}

Draft reply:"#,
        style = STYLE_RULES
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str, content: &str) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Guide {}", id),
            content: content.to_string(),
            category_id: Some("general".to_string()),
        }
    }

    #[test]
    fn test_no_access_takes_priority() {
        let articles = vec![article("A1", "body")];
        let plan = PromptPlan::select(false, &articles, "help", Tone::Formal);
        assert_eq!(plan.state(), PromptState::NoAccess);

        let rendered = plan.render(1000);
        assert!(rendered.text.contains("unable to access our knowledge base"));
        assert!(rendered.text.contains("Apologize"));
        assert!(rendered.text.contains("formal"));
        assert!(rendered.variables.context.is_empty());
        assert!(!rendered.text.contains("A1"));
    }

    #[test]
    fn test_no_results_opens_with_disclaimer() {
        let plan = PromptPlan::select(true, &[], "Where is my refund?", Tone::Friendly);
        assert_eq!(plan.state(), PromptState::NoResults);

        let rendered = plan.render(1000);
        assert!(rendered.text.contains(NO_RESULTS_DISCLAIMER));
        assert!(rendered.text.contains("Where is my refund?"));
        assert_eq!(rendered.variables.tone, "friendly");
    }

    #[test]
    fn test_grounded_embeds_every_article_id() {
        let articles = vec![
            article("A1", "Reset your password from the login page."),
            article("b7e0c2f4-91aa-4c2e-8d1f-0a9b8c7d6e5f", "Billing runs monthly."),
        ];
        let plan = PromptPlan::select(true, &articles, "reset password", Tone::Casual);
        assert_eq!(plan.state(), PromptState::Grounded);

        let rendered = plan.render(4000);
        for a in &articles {
            assert!(rendered.text.contains(&format!("(Article ID: {})", a.id)));
            assert!(rendered.variables.context.contains(&a.id));
        }
        assert!(rendered.text.contains(CITATION_RULES));
        assert!(rendered.text.contains(STYLE_RULES));
        assert!(rendered.text.contains(&rendered.variables.context));
        assert_eq!(rendered.variables.prompt, "reset password");
    }

    #[test]
    fn test_context_budget_truncates_bodies_but_keeps_ids() {
        let articles = vec![article("A1", "abcdefghij"), article("A2", "klmnopqrst")];
        let context = format_article_context(&articles, 15);

        assert!(context.contains("abcdefghij"));
        assert!(context.contains("klmno\n[content truncated]"));
        assert!(!context.contains("klmnop"));
        assert!(context.contains("Article ID: A2"));

        let starved = format_article_context(&articles, 0);
        assert!(starved.contains("Article ID: A1"));
        assert!(starved.contains("Article ID: A2"));
        assert!(!starved.contains("abcdefghij"));
    }
}
