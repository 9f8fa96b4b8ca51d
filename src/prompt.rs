//! Prompt construction for the generation backend.
//!
//! The prompt is a fixed five-deliverable instruction template with the
//! idea, audience, format, and tone interpolated into fixed slots. Building
//! it is pure; validation happens before this module is ever invoked.

use crate::models::OutlineRequest;

/// Render a request into the single instruction string sent to the backend.
///
/// The five deliverable labels always appear, verbatim and in order:
/// title & subtitle, format description, section headers, monetization
/// strategy, and social promos, followed by the voice line.
pub fn build_prompt(request: &OutlineRequest) -> String {
    format!(
        "You are a product strategist.\n\
         Create a {format} outline for \"{idea}\" aimed at \"{audience}\".\n\
         \n\
         Deliverables:\n\
         1. Title & subtitle\n\
         2. Format description (keep it {format})\n\
         3. 3-5 section headers with one-line summaries\n\
         4. Monetization strategy\n\
         5. 3 sample social-media promos\n\
         \n\
         Voice: {tone}\n",
        format = request.format,
        idea = request.idea,
        audience = request.audience,
        tone = request.tone,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Backend, ProductFormat, Tone};

    fn cookbook_request() -> OutlineRequest {
        OutlineRequest {
            idea: "AI Cookbook".to_string(),
            audience: "home cooks".to_string(),
            format: ProductFormat::Ebook,
            tone: Tone::Conversational,
            backend: Backend::Local,
            api_key: None,
        }
    }

    /// Assert each needle occurs in the haystack, in the given order.
    fn assert_ordered(haystack: &str, needles: &[&str]) {
        let mut from = 0;
        for needle in needles {
            let at = haystack[from..]
                .find(needle)
                .unwrap_or_else(|| panic!("{needle:?} missing or out of order"));
            from += at + needle.len();
        }
    }

    #[test]
    fn test_prompt_interpolates_all_fields_in_order() {
        let prompt = build_prompt(&cookbook_request());
        assert_ordered(
            &prompt,
            &[
                "eBook",
                "AI Cookbook",
                "home cooks",
                "Title & subtitle",
                "Format description",
                "section headers with one-line summaries",
                "Monetization strategy",
                "3 sample social-media promos",
                "Conversational",
            ],
        );
    }

    #[test]
    fn test_prompt_repeats_format_in_format_description() {
        let prompt = build_prompt(&cookbook_request());
        assert!(prompt.contains("Format description (keep it eBook)"));
    }

    #[test]
    fn test_prompt_is_pure() {
        let request = cookbook_request();
        assert_eq!(build_prompt(&request), build_prompt(&request));
    }

    #[test]
    fn test_prompt_with_empty_audience_keeps_slot() {
        let mut request = cookbook_request();
        request.audience = String::new();
        let prompt = build_prompt(&request);
        assert!(prompt.contains("aimed at \"\""));
    }
}
