use crate::features::analysis::error::AnalysisError;
use crate::features::analysis::models::ProjectAnalysis;
use crate::shared::llm::{extract_response, ParseError};

/// Pull the analysis object out of the model's answer text.
///
/// An object that mentions analysis fields but does not decode (missing field,
/// `skills` not an array) is a schema mismatch. Text with no such object at all
/// is malformed.
pub fn extract_analysis(raw_answer: &str) -> Result<ProjectAnalysis, AnalysisError> {
    extract_response::<ProjectAnalysis>(raw_answer).map_err(|e| match e {
        ParseError::SchemaMismatch(detail) => AnalysisError::SchemaMismatch(detail),
        other => AnalysisError::MalformedAnalysis(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::analysis::models::SpecValue;
    use fake::faker::lorem::en::{Sentence, Word};
    use fake::Fake;

    const LED_BLINKER: &str = r#"{"title":"LED Blinker","summary":"...","description":"d","skills":["C"],"technical_specs":{},"category":"Embedded","recruiter_insight":"x"}"#;

    fn led_blinker() -> ProjectAnalysis {
        serde_json::from_str(LED_BLINKER).unwrap()
    }

    #[test]
    fn test_fenced_answer_with_preamble() {
        let raw = format!("Sure! ```json\n{}\n```", LED_BLINKER);
        let analysis = extract_analysis(&raw).unwrap();
        assert_eq!(analysis.title, "LED Blinker");
        assert_eq!(analysis.skills, vec!["C".to_string()]);
    }

    #[test]
    fn test_embedded_object_survives_any_surrounding_prose() {
        // Prose fragments that look like JSON delimiters to a naive scanner
        let noise = [
            "",
            "{",
            "}",
            "{ not json }",
            "{\"unrelated\": true}",
            "a } b { c",
            "```json",
            "```",
            "\"quoted { brace\"",
            "{{template}}",
            "set {x: 1}",
            "I will answer in the form {\"title\": \"...\"}. Here it is:",
            "{\"title\": \"draft\", \"skills\": \"C\"}",
        ];

        let expected = led_blinker();
        for before in noise {
            for after in noise {
                let lead: String = Sentence(1..6).fake();
                let tail: String = Sentence(1..6).fake();
                let raw = format!("{} {}\n{}\n{} {}", lead, before, LED_BLINKER, after, tail);

                let analysis = extract_analysis(&raw)
                    .unwrap_or_else(|e| panic!("failed on {:?}: {}", raw, e));
                assert_eq!(analysis, expected, "input: {:?}", raw);
            }
        }
    }

    #[test]
    fn test_braces_inside_string_values() {
        let raw = r#"Result: {"title":"Parser {v2}","summary":"uses } and { freely","description":"\"quoted\" }","skills":["Rust"],"technical_specs":{"grammar":"{a|b}"},"category":"Software","recruiter_insight":"ok"} done }"#;
        let analysis = extract_analysis(raw).unwrap();
        assert_eq!(analysis.title, "Parser {v2}");
        assert_eq!(
            analysis.technical_specs["grammar"],
            SpecValue::Text("{a|b}".to_string())
        );
    }

    #[test]
    fn test_generated_titles_round_out() {
        for _ in 0..25 {
            let title: String = Sentence(2..5).fake();
            let skill: String = Word().fake();
            let object = serde_json::json!({
                "title": title,
                "summary": "s",
                "description": "d",
                "skills": [skill],
                "technical_specs": {"voltage": 5, "board": "ESP32"},
                "category": "IoT",
                "recruiter_insight": "r",
            });
            let raw = format!("Here is what I found {{ briefly }}:\n{}\nThanks!", object);

            let analysis = extract_analysis(&raw).unwrap();
            assert_eq!(analysis.title, title);
            assert_eq!(analysis.skills, vec![skill]);
        }
    }

    #[test]
    fn test_missing_skills_is_schema_mismatch() {
        let raw = r#"{"title":"LED Blinker","summary":"...","description":"d","technical_specs":{},"category":"Embedded","recruiter_insight":"x"}"#;
        let result = extract_analysis(raw);
        assert!(matches!(result, Err(AnalysisError::SchemaMismatch(msg)) if msg.contains("skills")));
    }

    #[test]
    fn test_partial_example_before_answer_is_skipped() {
        let raw = format!(
            "I will answer in the form {{\"title\": \"...\"}}. Here it is:\n{}",
            LED_BLINKER
        );
        assert_eq!(extract_analysis(&raw).unwrap(), led_blinker());
    }

    #[test]
    fn test_skills_not_array_is_schema_mismatch() {
        let raw = LED_BLINKER.replace(r#"["C"]"#, r#""C""#);
        assert!(matches!(
            extract_analysis(&raw),
            Err(AnalysisError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_no_object_is_malformed() {
        assert!(matches!(
            extract_analysis("I could not analyze this image."),
            Err(AnalysisError::MalformedAnalysis(_))
        ));
        assert!(matches!(
            extract_analysis("{\"confidence\": 0.2}"),
            Err(AnalysisError::MalformedAnalysis(_))
        ));
    }
}
