//! Ordered content preprocessor pipeline.
//!
//! Each stage takes ownership of the content and returns the content for the
//! next stage. A stage may edit the map it received and hand it back, or
//! build a replacement; either way the pipeline threads the returned value
//! forward and gives the last one back to the caller.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use dcp_shared::{Content, DcpError, PreprocessorSpec, Result};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// One configured content transform.
pub trait Preprocessor: Send + Sync {
    /// Human-readable name for tracing.
    fn name(&self) -> &str;

    /// Transform `content` and return the result.
    fn apply(&self, content: Content) -> Content;
}

/// Builds preprocessors from their stored configuration.
///
/// Implementations own whatever backend handles the preprocessors need.
pub trait PreprocessorFactory: Send + Sync {
    /// Instantiate `specs`, preserving order.
    fn create_preprocessors(&self, specs: &[PreprocessorSpec]) -> Result<Vec<Box<dyn Preprocessor>>>;
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Instantiate the preprocessors described by `specs` and apply them in order.
#[instrument(skip_all, fields(stages = specs.len()))]
pub fn run_preprocessors(
    factory: &dyn PreprocessorFactory,
    specs: &[PreprocessorSpec],
    content: Content,
) -> Result<Content> {
    let preprocessors = factory.create_preprocessors(specs)?;

    let mut content = content;
    for (i, preprocessor) in preprocessors.iter().enumerate() {
        debug!(stage = i, name = preprocessor.name(), "running preprocessor");
        content = preprocessor.apply(content);
    }

    Ok(content)
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

type Constructor = Box<dyn Fn(&PreprocessorSpec) -> Result<Box<dyn Preprocessor>> + Send + Sync>;

/// [`PreprocessorFactory`] resolving each spec's `class` against registered constructors.
pub struct PreprocessorRegistry {
    constructors: BTreeMap<String, Constructor>,
}

impl PreprocessorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Register a constructor for `class`, replacing any previous one.
    pub fn register<F>(&mut self, class: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&PreprocessorSpec) -> Result<Box<dyn Preprocessor>> + Send + Sync + 'static,
    {
        self.constructors.insert(class.into(), Box::new(constructor));
        self
    }

    /// Registered class names, sorted.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl Default for PreprocessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PreprocessorFactory for PreprocessorRegistry {
    fn create_preprocessors(&self, specs: &[PreprocessorSpec]) -> Result<Vec<Box<dyn Preprocessor>>> {
        specs
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let class = spec.class().ok_or_else(|| {
                    DcpError::integrity(format!(
                        "Preprocessor #{i} ({}) has no 'class' configured.",
                        spec.name().unwrap_or("unnamed")
                    ))
                })?;
                let constructor = self.constructors.get(class).ok_or_else(|| {
                    DcpError::integrity(format!("Unknown preprocessor class '{class}'."))
                })?;
                constructor(spec)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    /// Edits the map it receives and hands the same map back.
    struct SetField {
        field: String,
        value: Value,
    }

    impl Preprocessor for SetField {
        fn name(&self) -> &str {
            "set"
        }

        fn apply(&self, mut content: Content) -> Content {
            content.insert(self.field.clone(), self.value.clone());
            content
        }
    }

    /// Ignores the input map and returns a freshly built one.
    struct Wrap;

    impl Preprocessor for Wrap {
        fn name(&self) -> &str {
            "wrap"
        }

        fn apply(&self, content: Content) -> Content {
            let mut replacement = Content::new();
            replacement.insert("wrapped".into(), Value::Object(content));
            replacement
        }
    }

    fn registry() -> PreprocessorRegistry {
        let mut registry = PreprocessorRegistry::new();
        registry
            .register("set", |spec: &PreprocessorSpec| {
                let settings = spec.settings().cloned().unwrap_or(Value::Null);
                let field = settings["field"]
                    .as_str()
                    .ok_or_else(|| DcpError::integrity("set preprocessor needs settings.field."))?
                    .to_string();
                Ok(Box::new(SetField {
                    field,
                    value: settings["value"].clone(),
                }) as Box<dyn Preprocessor>)
            })
            .register("wrap", |_spec: &PreprocessorSpec| {
                Ok(Box::new(Wrap) as Box<dyn Preprocessor>)
            });
        registry
    }

    fn spec(value: Value) -> PreprocessorSpec {
        serde_json::from_value(value).expect("spec object")
    }

    fn content(value: Value) -> Content {
        value.as_object().cloned().expect("content object")
    }

    #[test]
    fn in_place_edits_reach_the_caller() {
        let specs = vec![
            spec(json!({ "class": "set", "settings": { "field": "a", "value": 1 } })),
            spec(json!({ "class": "set", "settings": { "field": "b", "value": 2 } })),
        ];
        let out = run_preprocessors(&registry(), &specs, content(json!({ "title": "t" })))
            .expect("run");
        assert_eq!(Value::Object(out), json!({ "title": "t", "a": 1, "b": 2 }));
    }

    #[test]
    fn replacements_are_threaded_in_order() {
        let specs = vec![
            spec(json!({ "class": "set", "settings": { "field": "a", "value": 1 } })),
            spec(json!({ "class": "wrap" })),
            spec(json!({ "class": "set", "settings": { "field": "a", "value": 2 } })),
        ];
        let out = run_preprocessors(&registry(), &specs, content(json!({}))).expect("run");
        assert_eq!(
            Value::Object(out),
            json!({ "wrapped": { "a": 1 }, "a": 2 })
        );
    }

    #[test]
    fn later_stages_see_earlier_output() {
        let specs = vec![
            spec(json!({ "class": "set", "settings": { "field": "a", "value": "first" } })),
            spec(json!({ "class": "set", "settings": { "field": "a", "value": "second" } })),
        ];
        let out = run_preprocessors(&registry(), &specs, content(json!({}))).expect("run");
        assert_eq!(out["a"], "second");
    }

    #[test]
    fn empty_pipeline_returns_input() {
        let input = content(json!({ "x": true }));
        let out = run_preprocessors(&registry(), &[], input.clone()).expect("run");
        assert_eq!(out, input);
    }

    #[test]
    fn unknown_class_is_integrity_error() {
        let specs = vec![spec(json!({ "name": "Mystery", "class": "nope" }))];
        let err = run_preprocessors(&registry(), &specs, Content::new()).unwrap_err();
        assert!(matches!(err, DcpError::ConfigurationIntegrity { .. }));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn missing_class_names_the_preprocessor() {
        let specs = vec![spec(json!({ "name": "Orphan" }))];
        let err = run_preprocessors(&registry(), &specs, Content::new()).unwrap_err();
        assert!(err.to_string().contains("Orphan"));
    }

    #[test]
    fn registry_lists_classes() {
        let registry = registry();
        assert_eq!(registry.classes().collect::<Vec<_>>(), vec!["set", "wrap"]);
    }
}
