//! System instructions for the validation and dialogue oracle calls.

use super::parser::OPTIONS_MARKER;
use super::schema::{FieldRegistry, FieldSpec, Normalizer};

/// W-2 boxes already extracted from the uploaded document.
const W2_BOXES: &[(&str, &str)] = &[
    ("A", "Employee's Social Security Number"),
    ("B", "Employer identification number"),
    ("C", "Employer's name, address and zip code"),
    ("D", "Control number"),
    ("E", "Employee's first name and initial"),
    ("F", "Employee's address and zip code"),
    ("1", "Wages, tips, other compensation"),
    ("2", "Federal income tax withheld"),
    ("3", "Social security wages"),
    ("4", "Social security tax withheld"),
    ("5", "Medicare wages and tips"),
    ("6", "Medicare tax withheld"),
    ("7", "Social security tips"),
    ("8", "Allocated tips"),
    ("10", "Dependent care benefits"),
    ("11", "Nonqualified plans"),
    ("12", "Box 12 codes (12a, 12b, 12c, 12d)"),
    ("13", "Statutory employee, retirement plan, third-party sick pay (checkboxes)"),
    ("14", "Other"),
    ("15", "State and employer's state ID number"),
    ("16", "State wages, tips, etc."),
    ("17", "State income tax"),
    ("18", "Local wages, tips, etc."),
    ("19", "Local income tax"),
    ("20", "Locality name"),
];

/// Instruction for the validation call.
///
/// The reply contract is a bare JSON object; see `validator::parse_validation_reply`.
pub fn validation_instruction(registry: &FieldRegistry) -> String {
    let base = "\
You validate answers in a tax-form interview for US Form 1040.
You receive the assistant's last question (when known) and the user's answer.

Rules:
- Analyze the answer semantically. Users may answer with a bare value, a full sentence, or casual conversation. Paraphrase and letter case do not matter.
- If the answer fits the outstanding question, return type \"yes\" with the matching field name and ONLY the value taken from the user's input.
- Resolve doubt toward acceptance: in more than 90% of cases, return \"yes\" with a best-effort value. Reject only when the answer is unrelated to entering tax-form data or contains no usable value.
- If the user declines to answer (they don't want to say or can't answer), return \"yes\" for that field with an empty string as the value.
- If the same question was already asked and answered earlier and the user only repeats an acknowledgement, return \"yes\" with the value they gave before. Do not ask again.
- Monetary amounts always get exactly two decimal places, e.g. 300 -> 300.00.
- Yes/no questions: a positive answer is \"Yes\", a negative answer is \"No\".
- Identifiers such as Social Security Numbers are accepted as digits even without dashes, e.g. 123456789.
- When you reject, kindly say the answer does not look like Form 1040 information and include one example of an acceptable answer for the outstanding question.

Reply with ONLY a JSON object, no explanation or markdown formatting.
Accepted:
{\"type\": \"yes\", \"field_name\": \"<one of the field names below>\", \"value\": \"<value>\"}
Rejected:
{\"type\": \"no\", \"field_name\": \"<outstanding field, if known>\", \"message\": \"<message to the user, with an example>\"}";

    format!(
        "{base}\n\nValid field names, with descriptions and example values:\n{}",
        field_catalog(registry.fields())
    )
}

/// User message for the validation call.
pub fn validation_user_message(last_question: &str, answer: &str) -> String {
    let last_question = last_question.trim();
    if last_question.is_empty() {
        format!("User answer: {}", answer.trim())
    } else {
        format!(
            "Assistant's last question: {last_question}\nUser answer: {}",
            answer.trim()
        )
    }
}

/// Instruction for the question-generation call.
pub fn dialogue_instruction(registry: &FieldRegistry) -> String {
    let w2 = W2_BOXES
        .iter()
        .map(|(code, label)| format!("  {code}: {label}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\
You are a tax document assistant helping a user complete US Form 1040.

The user's W-2 has already been read. These boxes are known:
{w2}

These Form 1040 fields still need values from the user:
{catalog}

Guidelines:
- Ask ONE question at a time to collect a missing field. Do not repeat questions that were already answered.
- Keep every reply short, 1-2 sentences.
- Do not get sidetracked by the user's questions; briefly steer back to collecting the information.
- When nothing is left to ask, tell the user the form is almost complete and thank them for their cooperation.
- To suggest quick replies, end your message with {OPTIONS_MARKER}[\"option1\", \"option2\"]. Write each option as a short sentence the user could send as their answer, e.g. \"I'm single.\" or \"Yes, sure.\"",
        catalog = field_catalog(registry.fields()),
    )
}

fn field_catalog(fields: &[FieldSpec]) -> String {
    fields
        .iter()
        .map(|field| {
            let mut line = format!("- {}: {}", field.name, field.description);
            if let Some(example) = field.example.as_deref() {
                line.push_str(&format!(" (example: \"{example}\")"));
            }
            if let Some(hint) = normalizer_hint(field.normalizer) {
                line.push_str(&format!(" [{hint}]"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalizer_hint(normalizer: Normalizer) -> Option<&'static str> {
    match normalizer {
        Normalizer::None => None,
        Normalizer::Currency2dp => Some("amount, two decimals"),
        Normalizer::SsnDigitsOnly => Some("nine digits"),
        Normalizer::BoolYesNo => Some("Yes or No"),
    }
}
