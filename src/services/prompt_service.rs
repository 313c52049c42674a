use crate::models::question::QuestionType;

const MCQ_SHAPE: &str = r#"{"question_text": "...", "option1": "...", "option2": "...", "option3": "...", "option4": "...", "answer": "The correct option text", "explanation": "A brief explanation."}"#;
const TITA_SHAPE: &str = r#"{"question_text": "...", "answer": "The numerical or short text answer", "explanation": "A brief explanation."}"#;

/// Instruction for one new question of `question_type` in the `section_label` section,
/// anchored on retrieved `exemplars`.
pub fn build_prompt(
    exam: &str,
    section_label: &str,
    question_type: QuestionType,
    exemplars: &[String],
) -> String {
    let type_instruction = match question_type {
        QuestionType::Mcq => {
            "an MCQ (Multiple Choice Question) with exactly 4 options labeled 'option1' to 'option4' and one correct answer"
        }
        QuestionType::Tita => {
            "a TITA (Type In The Answer) question with no options, where the answer is a numerical value or short text"
        }
    };
    let shape = match question_type {
        QuestionType::Mcq => MCQ_SHAPE,
        QuestionType::Tita => TITA_SHAPE,
    };
    let forbidden = match question_type {
        QuestionType::Mcq => "",
        QuestionType::Tita => "Do NOT include any option fields.\n",
    };
    let context = exemplars.join("\n---\n");

    format!(
        r#"You are an expert question setter for the {exam} exam.
Your task is to generate a new, original question for the '{section}' section.
The question must be of type: {type_instruction}.
It should be of a similar style, topic, and difficulty level to the following examples:
---
{context}
---
Your entire response MUST be a single, valid JSON object. Do not include any other text, markdown, or explanation.
The JSON object must have exactly this structure:
{shape}
{forbidden}"#,
        exam = exam,
        section = section_label,
        type_instruction = type_instruction,
        context = context,
        shape = shape,
        forbidden = forbidden,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exemplars() -> Vec<String> {
        vec![
            "Section: QA Question: If x + 2 = 5, find x.".to_string(),
            "Section: QA Question: A train covers 60 km in 1.5 hours.".to_string(),
        ]
    }

    #[test]
    fn mcq_prompt_names_section_and_all_options() {
        let prompt = build_prompt("CAT", "QA", QuestionType::Mcq, &exemplars());
        assert!(prompt.contains("for the 'QA' section"));
        assert!(prompt.contains("exactly 4 options"));
        for key in ["option1", "option2", "option3", "option4", "answer", "explanation"] {
            assert!(prompt.contains(&format!("\"{}\"", key)), "missing {}", key);
        }
    }

    #[test]
    fn tita_prompt_has_no_option_fields_in_shape() {
        let prompt = build_prompt("CAT", "DILR", QuestionType::Tita, &exemplars());
        assert!(prompt.contains(TITA_SHAPE));
        assert!(!prompt.contains("\"option1\""));
        assert!(prompt.contains("Do NOT include any option fields"));
    }

    #[test]
    fn exemplars_are_included_verbatim() {
        let ex = exemplars();
        let prompt = build_prompt("CAT", "QA", QuestionType::Tita, &ex);
        assert!(prompt.contains(&format!("{}\n---\n{}", ex[0], ex[1])));
        assert!(prompt.contains("single, valid JSON object"));
    }
}
