use serde::{Deserialize, Serialize};

use crate::{
    domain::{GeoPoint, RegionId, SlotCount, TaskId},
    kind::PriorityClass,
};

/// Slots requested when a task does not say otherwise.
pub const DEFAULT_REQUESTED_SLOTS: SlotCount = 512;

/// Work-type tag used when a task does not carry one.
pub const DEFAULT_TASK_TYPE: &str = "general";

/// Work item submitted by a caller.
///
/// A task is immutable once built; the core derives [`TaskMetadata`] from it and never
/// persists it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    /// Work-type tag (`"generate_content"`, `"summarize"`, `"analyze"`, ...).
    #[serde(default = "default_task_type")]
    pub task_type: String,
    /// Free-text prompt handed to the generator.
    #[serde(default)]
    pub prompt: String,
    /// Opaque payload; only its size matters to scoring.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payload: String,
    #[serde(default)]
    pub priority: PriorityClass,
    /// Caller identifier, used to resolve the caller tier.
    pub origin: String,
    /// Requested slot count.
    #[serde(default = "default_slots")]
    pub slots: SlotCount,
    /// Region the caller would prefer, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<RegionId>,
    /// Caller location used for distance/latency estimation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    /// Explicit complexity on a `1..=10` scale; estimated from the prompt when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<f64>,
    /// Optional physical-delivery sub-request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulfillment: Option<FulfillmentRequest>,
}

fn default_task_type() -> String {
    DEFAULT_TASK_TYPE.to_string()
}

fn default_slots() -> SlotCount {
    DEFAULT_REQUESTED_SLOTS
}

impl Task {
    /// Minimal task with defaults for everything but id, origin and prompt.
    pub fn new(id: impl Into<TaskId>, origin: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            task_type: default_task_type(),
            prompt: prompt.into(),
            payload: String::new(),
            priority: PriorityClass::default(),
            origin: origin.into(),
            slots: DEFAULT_REQUESTED_SLOTS,
            region: None,
            location: None,
            complexity: None,
            fulfillment: None,
        }
    }

    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_priority(mut self, priority: PriorityClass) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_slots(mut self, slots: SlotCount) -> Self {
        self.slots = slots;
        self
    }

    pub fn with_region(mut self, region: impl Into<RegionId>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.complexity = Some(complexity);
        self
    }

    pub fn with_fulfillment(mut self, request: FulfillmentRequest) -> Self {
        self.fulfillment = Some(request);
        self
    }

    /// Derive scoring inputs, stamping them with `created_at_ms`.
    pub fn metadata(&self, created_at_ms: u64) -> TaskMetadata {
        TaskMetadata::derive(self, created_at_ms)
    }
}

/// Scoring inputs derived once from a [`Task`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetadata {
    pub task_id: TaskId,
    pub task_type: String,
    pub origin: String,
    /// Complexity on a `1..=10` scale.
    pub complexity: f64,
    /// Payload size in bytes (prompt + payload).
    pub payload_bytes: u64,
    pub priority: PriorityClass,
    /// Unix timestamp (ms).
    pub created_at_ms: u64,
}

impl TaskMetadata {
    pub const MIN_COMPLEXITY: f64 = 1.0;
    pub const MAX_COMPLEXITY: f64 = 10.0;

    /// Words per complexity point when the caller gives no explicit estimate.
    const WORDS_PER_POINT: f64 = 25.0;

    fn derive(task: &Task, created_at_ms: u64) -> Self {
        let complexity = match task.complexity {
            Some(c) if c.is_finite() => c,
            Some(_) => Self::MIN_COMPLEXITY,
            None => task.prompt.split_whitespace().count() as f64 / Self::WORDS_PER_POINT,
        }
        .clamp(Self::MIN_COMPLEXITY, Self::MAX_COMPLEXITY);

        Self {
            task_id: task.id.clone(),
            task_type: task.task_type.clone(),
            origin: task.origin.clone(),
            complexity,
            payload_bytes: (task.prompt.len() + task.payload.len()) as u64,
            priority: task.priority,
            created_at_ms,
        }
    }

    /// Priority weight of the declared class.
    #[inline]
    pub fn priority_weight(&self) -> f64 {
        self.priority.weight()
    }
}

/// Physical-delivery sub-request forwarded to the fulfillment collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentRequest {
    /// External order id; defaults to `order_<task id>` when dispatched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    #[serde(default = "default_weight")]
    pub package_weight_kg: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl FulfillmentRequest {
    pub fn new(pickup: GeoPoint, dropoff: GeoPoint) -> Self {
        Self {
            order_id: None,
            pickup,
            dropoff,
            package_weight_kg: default_weight(),
        }
    }

    /// Order id to use for `task_id`.
    pub fn order_id_for(&self, task_id: &TaskId) -> String {
        self.order_id
            .clone()
            .unwrap_or_else(|| format!("order_{task_id}"))
    }
}

/// Prompt handed to the generator, shaped by the task's work type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    pub task_id: TaskId,
    pub task_type: String,
    pub prompt: String,
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// Build the generator input for `task`.
    ///
    /// `summarize` and `analyze` tasks get an instruction prefix and a smaller token budget.
    pub fn for_task(task: &Task) -> Self {
        let (prompt, max_tokens) = match task.task_type.as_str() {
            "summarize" => (format!("Summarize: {}", task.prompt), 200),
            "analyze" => (format!("Analyze: {}", task.prompt), 300),
            _ => (task.prompt.clone(), 500),
        };
        Self {
            task_id: task.id.clone(),
            task_type: task.task_type.clone(),
            prompt,
            max_tokens,
        }
    }
}
