//! Typed execution model built from a [`PipelineDocument`].
//!
//! Step objects in documents carry several optional fields; here every step is
//! exactly one variant, and a multi-field object expands into several steps.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{AnyValue, ItemDoc, LegacyDoc, PipelineDocument, StepDoc};

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Split { delimiter: String },
    Filter(FilterStep),
    ReturnIf(ReturnIfStep),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterStep {
    pub expression: String,
    pub bind_vars: bool,
    pub raw_output: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnIfStep {
    pub condition: String,
    pub value: AnyValue,
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Split { .. } => "split",
            Step::Filter(_) => "jq",
            Step::ReturnIf(_) => "returnIf",
        }
    }

    /// The filter expression this step compiles, if any.
    pub fn expression(&self) -> Option<&str> {
        match self {
            Step::Split { .. } => None,
            Step::Filter(f) => Some(&f.expression),
            Step::ReturnIf(r) => Some(&r.condition),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Request,
    Response,
    Retry,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Request, Phase::Response, Phase::Retry];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Request => "request",
            Phase::Response => "response",
            Phase::Retry => "retry",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} steps", self.as_str())
    }
}

/// How the output of the request phase turns into an HTTP call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Decode the payload as `RequestParams`.
    Templated,
    /// Send the payload verbatim as a form-encoded POST body.
    FormPost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub url_template: String,
    pub request_steps: Vec<Step>,
    pub response_steps: Vec<Step>,
    pub retry_steps: Vec<Step>,
    pub mode: RequestMode,
}

impl Item {
    pub fn steps(&self, phase: Phase) -> &[Step] {
        match phase {
            Phase::Request => &self.request_steps,
            Phase::Response => &self.response_steps,
            Phase::Retry => &self.retry_steps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipeline {
    pub items: Vec<Item>,
}

/// Location of one step inside a pipeline, used for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepLocation {
    pub item: usize,
    pub phase: Phase,
    pub step: usize,
}

impl fmt::Display for StepLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item {}: {}: step {}", self.item, self.phase, self.step)
    }
}

impl Pipeline {
    pub fn from_document(doc: &PipelineDocument) -> Self {
        match doc {
            PipelineDocument::Pipeline(items) => Self {
                items: items.iter().map(item_from_doc).collect(),
            },
            PipelineDocument::Legacy(legacy) => Self {
                items: vec![item_from_legacy(legacy)],
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every step that references a filter expression, in declaration order.
    pub fn expressions(&self) -> impl Iterator<Item = (StepLocation, &Step)> + '_ {
        self.items.iter().enumerate().flat_map(|(item_idx, item)| {
            Phase::ALL.into_iter().flat_map(move |phase| {
                item.steps(phase)
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.expression().is_some())
                    .map(move |(step_idx, s)| {
                        (
                            StepLocation {
                                item: item_idx,
                                phase,
                                step: step_idx,
                            },
                            s,
                        )
                    })
            })
        })
    }
}

static VAR_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex"));

impl Pipeline {
    /// Every `$name` written in the pipeline's filters, excluding `$__loc__`.
    ///
    /// Purely lexical: names bound locally with `as $x` are included too.
    pub fn variable_references(&self) -> BTreeSet<String> {
        self.expressions()
            .filter_map(|(_, step)| step.expression())
            .flat_map(|expr| VAR_REF_RE.captures_iter(expr))
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|name| name != "__loc__")
            .collect()
    }
}

impl From<&PipelineDocument> for Pipeline {
    fn from(doc: &PipelineDocument) -> Self {
        Pipeline::from_document(doc)
    }
}

fn item_from_doc(doc: &ItemDoc) -> Item {
    Item {
        url_template: doc.url.clone(),
        request_steps: expand_steps(&doc.request, false),
        response_steps: expand_steps(&doc.response, false),
        retry_steps: expand_steps(&doc.retry, false),
        mode: RequestMode::Templated,
    }
}

fn item_from_legacy(doc: &LegacyDoc) -> Item {
    Item {
        url_template: doc.url.clone(),
        request_steps: expand_steps(&doc.request, true),
        response_steps: expand_steps(&doc.response, true),
        retry_steps: Vec::new(),
        mode: RequestMode::FormPost,
    }
}

fn expand_steps(docs: &[StepDoc], legacy: bool) -> Vec<Step> {
    docs.iter().flat_map(|d| expand_step(d, legacy)).collect()
}

/// Expands one step object into its active variants, in split, jq, returnIf order.
///
/// Legacy documents always bind variables into their filters.
pub fn expand_step(doc: &StepDoc, legacy: bool) -> Vec<Step> {
    let mut out = Vec::with_capacity(1);
    if let Some(delimiter) = doc.split.as_deref().filter(|s| !s.is_empty()) {
        out.push(Step::Split {
            delimiter: delimiter.to_string(),
        });
    }
    if let Some(expression) = doc.jq.as_deref().filter(|s| !s.is_empty()) {
        out.push(Step::Filter(FilterStep {
            expression: expression.to_string(),
            bind_vars: legacy || doc.bind_vars,
            raw_output: doc.raw_output,
        }));
    }
    if let Some(ri) = &doc.return_if {
        out.push(Step::ReturnIf(ReturnIfStep {
            condition: ri.condition.clone(),
            value: ri.value.clone(),
        }));
    }
    out
}
