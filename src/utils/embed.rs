use std::collections::HashMap;

use serenity::builder::{CreateEmbed, CreateEmbedFooter};

use crate::moderation::classifier::ClassificationResult;

/// Only categories above this score make it into the alert body.
const CATEGORY_CUTOFF: f64 = 0.2;
const MAX_CATEGORIES: usize = 5;

pub fn toxicity_alert(
    result: &ClassificationResult,
    author_name: &str,
    message_link: &str,
) -> CreateEmbed {
    CreateEmbed::new()
        .title("Toxicity Alert")
        .description(alert_body(result, message_link))
        .color(0xED4245)
        .footer(CreateEmbedFooter::new(format!(
            "Message from {author_name}"
        )))
}

pub fn alert_body(result: &ClassificationResult, message_link: &str) -> String {
    let categories = significant_categories(&result.category_scores);
    format!(
        "⚠️ **Toxic Message Detected**\n\
         Overall Score: {:.2}\n\
         Highest Category: {} ({:.1}%)\n\n\
         **Significant Categories:**\n{}\n\n\
         [View Message]({message_link})",
        result.overall_score,
        result.max_category,
        result.max_score * 100.0,
        categories.join("\n"),
    )
}

/// Categories above the cutoff, capped at five, category names descending.
pub fn significant_categories(scores: &HashMap<String, f64>) -> Vec<String> {
    let mut significant: Vec<(&str, f64)> = scores
        .iter()
        .filter(|(_, score)| **score > CATEGORY_CUTOFF)
        .map(|(name, score)| (name.as_str(), *score))
        .collect();
    significant.sort_by(|a, b| b.0.cmp(a.0));
    significant
        .into_iter()
        .take(MAX_CATEGORIES)
        .map(|(name, score)| format!("{name}: {:.1}%", score * 100.0))
        .collect()
}

pub fn analysis_started() -> CreateEmbed {
    CreateEmbed::new()
        .title("🔍 Toxicity Analysis Started")
        .description(
            "I will analyze messages in this channel for toxicity and flag toxic messages.\n\
             Use `!stop` to stop analysis.",
        )
        .color(0x57F287)
}

pub fn analysis_stopped() -> CreateEmbed {
    CreateEmbed::new()
        .title("🛑 Analysis Stopped")
        .description("I will no longer analyze messages in this channel.")
        .color(0xED4245)
}

pub fn error(message: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("❌ Error")
        .description(message)
        .color(0xED4245)
}
