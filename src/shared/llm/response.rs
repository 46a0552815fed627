use schemars::gen::SchemaGenerator;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

/// Trait for structured model outputs
///
/// Types implementing this trait describe themselves to the model through a
/// JSON schema embedded in the prompt, and are decoded from the object the
/// model returns.
pub trait LlmResponse: DeserializeOwned + JsonSchema {
    /// Top-level keys that identify an object as this response type.
    ///
    /// Used to skip unrelated JSON the model may echo in its prose.
    fn identifying_keys() -> &'static [&'static str];

    /// Generate JSON schema string for use in LLM prompts
    fn json_schema_string() -> String {
        let mut gen = SchemaGenerator::default();
        let schema = gen.root_schema_for::<Self>();
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
    }
}
