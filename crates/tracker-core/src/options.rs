use tracker_model::{AttributeId, DataElementId, ProgramId, StageId, TrackedEntityId};

/// How a new event is checked against the events already recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateStrategy {
    /// Any event on or after `eventDate - days` in the same program stage is a
    /// duplicate.
    Threshold { days: u32 },
    /// Any event of the entity recording the same value for this element is a
    /// duplicate.
    UniqueDataElement(DataElementId),
}

impl DuplicateStrategy {
    /// Pick the strategy from the configured settings. The unique data
    /// element takes precedence over the threshold.
    pub fn select(threshold_days: Option<u32>, unique_data_element: Option<DataElementId>) -> Option<Self> {
        match (unique_data_element, threshold_days) {
            (Some(element), _) => Some(Self::UniqueDataElement(element)),
            (None, Some(days)) => Some(Self::Threshold { days }),
            (None, None) => None,
        }
    }
}

/// Per-file configuration of a [`Reconciler`](crate::Reconciler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerOptions {
    pub tracked_entity: TrackedEntityId,
    /// Enrollment runs only when set.
    pub program: Option<ProgramId>,
    /// Duplicate check and event recording run only when both program and
    /// stage are set.
    pub stage: Option<StageId>,
    pub duplicate_check: Option<DuplicateStrategy>,
    /// Threshold duplicates are recorded on this stage instead of failing.
    pub duplicate_stage: Option<StageId>,
    pub unique_attribute: Option<AttributeId>,
}

impl ReconcilerOptions {
    pub fn new(tracked_entity: TrackedEntityId) -> Self {
        Self {
            tracked_entity,
            program: None,
            stage: None,
            duplicate_check: None,
            duplicate_stage: None,
            unique_attribute: None,
        }
    }

    #[must_use]
    pub fn with_program(mut self, program: ProgramId) -> Self {
        self.program = Some(program);
        self
    }

    #[must_use]
    pub fn with_stage(mut self, stage: StageId) -> Self {
        self.stage = Some(stage);
        self
    }

    #[must_use]
    pub fn with_duplicate_check(mut self, strategy: Option<DuplicateStrategy>) -> Self {
        self.duplicate_check = strategy;
        self
    }

    #[must_use]
    pub fn with_duplicate_stage(mut self, stage: Option<StageId>) -> Self {
        self.duplicate_stage = stage;
        self
    }

    #[must_use]
    pub fn with_unique_attribute(mut self, attribute: Option<AttributeId>) -> Self {
        self.unique_attribute = attribute;
        self
    }

    /// Program and stage events are recorded against, when both are set.
    pub fn event_target(&self) -> Option<(&ProgramId, &StageId)> {
        self.program.as_ref().zip(self.stage.as_ref())
    }
}
