//! Prompt templates for the three oracle calls
//!
//! User text is embedded verbatim between double quotes.

use sdk::types::Category;

/// Example utterances shown to the classifier for each category
const CATEGORY_EXAMPLES: [(Category, &str); 11] = [
    (Category::Greeting, r#"Inputs like "hi", "hello", "helooe", "hey""#),
    (
        Category::Morning,
        r#"Inputs like "good morning", "morning", "good mrng""#,
    ),
    (
        Category::Afternoon,
        r#"Inputs like "good afternoon", "afternoon", "good aftn""#,
    ),
    (
        Category::Evening,
        r#"Inputs like "good evening", "evening", "good evng""#,
    ),
    (
        Category::Night,
        r#"Inputs like "good night", "night", "good nite""#,
    ),
    (
        Category::Farewell,
        r#"Inputs like "bye", "by", "see you", "goodbye", "goodby""#,
    ),
    (
        Category::Thanks,
        r#"Inputs like "thank you", "thanki you", "thnx", "thanx", "thanks""#,
    ),
    (
        Category::Okay,
        r#"Inputs like "ok", "okay", "k", "alright""#,
    ),
    (
        Category::CasualQuestion,
        r#"Inputs like "how are you?", "what's up?", "how's it going?""#,
    ),
    (
        Category::PlantSymptom,
        r#"Inputs clearly describing a plant's condition, like "yellow spots on leaves", "white powdery substance", "brown spots""#,
    ),
    (
        Category::Unrelated,
        r#"Any other input, including nonsense like "hhh", off-topic questions like "how's the weather", or unrecognizable text"#,
    ),
];

/// Intent classification prompt. The reply must be `{"category": "<label>"}`.
pub fn classification(text: &str) -> String {
    let taxonomy = CATEGORY_EXAMPLES
        .iter()
        .map(|(category, examples)| format!("- \"{}\": {}", category, examples))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an assistant that categorizes user input for a plant care chatbot. \
Analyze the input and classify it into EXACTLY ONE category based on the examples provided. \
Be precise and avoid overlapping categories.

Categories and examples:
{taxonomy}

User Input: \"{text}\"

Return ONLY a JSON object with the key \"category\" and the category name. \
Example: {{\"category\": \"greeting\"}}"
    )
}

/// Spelling correction prompt, narrowed to plant, pest and disease terms
pub fn spelling_correction(text: &str) -> String {
    format!(
        "You are a plant pathology expert. Review the following user-described symptom for \
spelling and terminology errors related to plants, pests, and diseases. Correct ONLY these \
specific errors. If there are no errors or the text is not plant-related, return the original text.

Original text: \"{text}\"

Return JUST the corrected text, with no extra explanation."
    )
}

/// Diagnosis prompt. The reply must hold exactly the four diagnosis keys.
pub fn diagnosis(symptoms: &str) -> String {
    format!(
        "Act as a plant pathologist. A user has described the following symptoms:
\"{symptoms}\"

Based on these symptoms, provide a likely diagnosis and treatment plan.
Return your response as a JSON object with the following keys: \"disease\", \"organic\", \"chemical\", \"prevention\".
If the symptoms are too vague to make a diagnosis, set the \"disease\" value to \"Unknown\" \
and explain in the \"prevention\" key that more details are needed."
    )
}
