//! Multi-step pipeline model.
//!
//! Callers submit a [`PipelineRequest`] whose steps carry an action name
//! and a loosely-typed JSON parameter map. [`PipelineRequest::into_plan`]
//! checks every action against the allow-list and converts each step into
//! a typed [`StepCommand`], filling missing or unparseable parameters
//! from [`GenerationDefaults`]. The interpreter only ever sees the typed
//! plan.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::audio::{AudioParams, DEFAULT_INTONATION, DEFAULT_PITCH, DEFAULT_SPEED, DEFAULT_VOLUME};
use crate::defaults::GenerationDefaults;
use crate::error::CoreError;
use crate::image::ImageGenerationRequest;
use crate::types::Timestamp;
use crate::validation::is_safe_file_stem;

/// `char_name` used for images generated by a pipeline step without one.
pub const DEFAULT_PIPELINE_CHAR_NAME: &str = "pipeline";

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// The allow-list of pipeline step actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineAction {
    GenerateImage,
    GenerateAudio,
    ListModels,
    ListSpeakers,
    CheckStatus,
}

impl PipelineAction {
    pub const ALL: [PipelineAction; 5] = [
        Self::GenerateImage,
        Self::GenerateAudio,
        Self::ListModels,
        Self::ListSpeakers,
        Self::CheckStatus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GenerateImage => "generate_image",
            Self::GenerateAudio => "generate_audio",
            Self::ListModels => "list_models",
            Self::ListSpeakers => "list_speakers",
            Self::CheckStatus => "check_status",
        }
    }

    /// Case-insensitive lookup against the allow-list.
    pub fn parse(name: &str) -> Option<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|a| a.as_str() == lowered)
    }
}

impl FromStr for PipelineAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            let valid: Vec<&str> = Self::ALL.iter().map(|a| a.as_str()).collect();
            CoreError::Validation(format!(
                "Unknown action: '{s}'. Valid: {}",
                valid.join(", ")
            ))
        })
    }
}

impl std::fmt::Display for PipelineAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Submission body
// ---------------------------------------------------------------------------

/// Body of a pipeline submission.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineRequest {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<PipelineStepRequest>,
}

/// One untyped step as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineStepRequest {
    pub action: String,
    #[serde(default)]
    pub params: Option<Map<String, Value>>,
}

/// Typed payload of a single step, one variant per action.
#[derive(Debug, Clone, PartialEq)]
pub enum StepCommand {
    GenerateImage(ImageGenerationRequest),
    GenerateAudio(AudioParams),
    ListModels,
    ListSpeakers,
    CheckStatus,
}

impl StepCommand {
    /// Convert an untyped parameter map into the payload for `action`.
    pub fn from_params(
        action: PipelineAction,
        params: &Map<String, Value>,
        defaults: &GenerationDefaults,
    ) -> Self {
        let p = Params(params);
        match action {
            PipelineAction::GenerateImage => Self::GenerateImage(ImageGenerationRequest {
                prompt: p.string("prompt").unwrap_or_default(),
                negative_prompt: p.string("negative_prompt").unwrap_or_default(),
                model: p.string("model").unwrap_or_else(|| defaults.model.clone()),
                lora: p.string("lora"),
                lora_weight: p.f64("lora_weight").unwrap_or(defaults.lora_weight),
                steps: p.u32("steps").unwrap_or(defaults.steps),
                cfg_scale: p.f64("cfg_scale").unwrap_or(defaults.cfg_scale),
                width: p.u32("width").unwrap_or(defaults.width),
                height: p.u32("height").unwrap_or(defaults.height),
                sampler: p.string("sampler").unwrap_or_else(|| defaults.sampler.clone()),
                char_name: p
                    .string("char_name")
                    .filter(|name| is_safe_file_stem(name))
                    .unwrap_or_else(|| DEFAULT_PIPELINE_CHAR_NAME.to_string()),
                json_file_id: None,
                batch_count: 1,
            }),
            PipelineAction::GenerateAudio => Self::GenerateAudio(AudioParams {
                text: p.string("text").unwrap_or_default(),
                speaker_id: p.i64("speaker_id").unwrap_or(defaults.speaker_id),
                speed: p.f64("speed").unwrap_or(DEFAULT_SPEED),
                pitch: p.f64("pitch").unwrap_or(DEFAULT_PITCH),
                intonation: p.f64("intonation").unwrap_or(DEFAULT_INTONATION),
                volume: p.f64("volume").unwrap_or(DEFAULT_VOLUME),
                save_file: p.bool("save_file").unwrap_or(true),
                file_name: p.string("file_name").filter(|name| is_safe_file_stem(name)),
            }),
            PipelineAction::ListModels => Self::ListModels,
            PipelineAction::ListSpeakers => Self::ListSpeakers,
            PipelineAction::CheckStatus => Self::CheckStatus,
        }
    }

    pub fn action(&self) -> PipelineAction {
        match self {
            Self::GenerateImage(_) => PipelineAction::GenerateImage,
            Self::GenerateAudio(_) => PipelineAction::GenerateAudio,
            Self::ListModels => PipelineAction::ListModels,
            Self::ListSpeakers => PipelineAction::ListSpeakers,
            Self::CheckStatus => PipelineAction::CheckStatus,
        }
    }
}

/// A validated, typed step ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStep {
    pub index: usize,
    /// Action name exactly as submitted; echoed back in the step report.
    pub action_name: String,
    pub command: StepCommand,
}

/// A validated pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelinePlan {
    pub name: String,
    pub steps: Vec<PipelineStep>,
}

impl PipelineRequest {
    /// Validate the request and convert every step into a [`StepCommand`].
    ///
    /// Fails on an empty name, an empty step list, or any action outside
    /// the allow-list. Parameter conversion itself never fails.
    pub fn into_plan(self, defaults: &GenerationDefaults) -> Result<PipelinePlan, CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("name is required".to_string()));
        }
        if self.steps.is_empty() {
            return Err(CoreError::Validation(
                "steps array must not be empty".to_string(),
            ));
        }

        let empty = Map::new();
        let mut steps = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.into_iter().enumerate() {
            let action: PipelineAction = step.action.parse()?;
            let params = step.params.as_ref().unwrap_or(&empty);
            steps.push(PipelineStep {
                index,
                command: StepCommand::from_params(action, params, defaults),
                action_name: step.action,
            });
        }

        Ok(PipelinePlan {
            name: self.name,
            steps,
        })
    }
}

// ---------------------------------------------------------------------------
// Parameter extraction
// ---------------------------------------------------------------------------

/// Lenient typed view over a JSON parameter map.
///
/// Every accessor accepts the native JSON type or its string encoding
/// and returns `None` when the key is absent, null, or unconvertible.
struct Params<'a>(&'a Map<String, Value>);

impl Params<'_> {
    fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    fn string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn i64(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn u32(&self, key: &str) -> Option<u32> {
        self.i64(key).and_then(|v| u32::try_from(v).ok())
    }

    fn f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().to_ascii_lowercase().parse().ok(),
            Value::Number(n) => n.as_i64().map(|v| v != 0),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Failed,
}

/// Per-step entry of a [`PipelineReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub action: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    pub fn completed(step: &PipelineStep, result: Value) -> Self {
        Self {
            index: step.index,
            action: step.action_name.clone(),
            status: StepStatus::Completed,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(step: &PipelineStep, error: String) -> Self {
        Self {
            index: step.index,
            action: step.action_name.clone(),
            status: StepStatus::Failed,
            result: None,
            error: Some(error),
        }
    }
}

/// Aggregate outcome of a pipeline whose steps have all been attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Completed,
    CompletedWithErrors,
}

impl PipelineStatus {
    pub fn from_steps(steps: &[StepReport]) -> Self {
        if steps.iter().all(|s| s.status == StepStatus::Completed) {
            Self::Completed
        } else {
            Self::CompletedWithErrors
        }
    }
}

/// Result payload of a pipeline job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub pipeline_id: String,
    pub name: String,
    pub status: PipelineStatus,
    pub steps: Vec<StepReport>,
    pub created_at: Timestamp,
}
