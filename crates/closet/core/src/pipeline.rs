//! Validate → Repair → Apply orchestration.

use crate::framework::{FrameworkAdapter, LayoutId, adapter_for};
use crate::inventory::OutfitEntry;
use crate::message::{MessageLog, Severity};
use crate::scene::{NodeId, SceneGraph};
use crate::settings::GeneratorSettings;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// Inputs of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineRequest {
    pub avatar: Option<NodeId>,
    pub closet: Option<NodeId>,
    pub outfits: Vec<OutfitEntry>,
}

impl PipelineRequest {
    pub fn new(avatar: NodeId) -> Self {
        Self {
            avatar: Some(avatar),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_closet(mut self, closet: NodeId) -> Self {
        self.closet = Some(closet);
        self
    }

    #[must_use]
    pub fn with_outfits(mut self, outfits: Vec<OutfitEntry>) -> Self {
        self.outfits = outfits;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PipelineStatus {
    #[default]
    Idle,
    Validating,
    Repairing,
    Applying,
    Done,
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Validating => write!(f, "Validating..."),
            Self::Repairing => write!(f, "Repairing..."),
            Self::Applying => write!(f, "Applying..."),
            Self::Done => write!(f, "Done"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineResult {
    pub has_error: bool,
    pub applied: bool,
    pub repaired: bool,
    pub final_status: PipelineStatus,
    pub summary: String,
    pub messages: MessageLog,
}

/// The closet generator bound to one framework adapter and naming scheme.
pub struct ClosetPipeline {
    pub(crate) adapter: Box<dyn FrameworkAdapter>,
    pub(crate) settings: GeneratorSettings,
}

impl ClosetPipeline {
    pub fn new(adapter: Box<dyn FrameworkAdapter>, settings: GeneratorSettings) -> Self {
        Self { adapter, settings }
    }

    pub fn with_layout(layout: LayoutId, settings: GeneratorSettings) -> Self {
        Self::new(adapter_for(layout), settings)
    }

    pub fn adapter(&self) -> &dyn FrameworkAdapter {
        self.adapter.as_ref()
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Run all three stages. `on_status` is called at every stage boundary.
    ///
    /// Never fails: every problem ends up in the returned messages.
    pub fn run(
        &self,
        scene: &mut dyn SceneGraph,
        request: &PipelineRequest,
        mut on_status: impl FnMut(PipelineStatus),
    ) -> PipelineResult {
        let mut messages = MessageLog::new();

        on_status(PipelineStatus::Validating);
        info!("Step 1/3: validating closet inventory");
        let validation = self.validate(scene, request);
        messages.extend(validation.messages.clone());
        if validation.has_error {
            warn!("Validation failed; apply was blocked");
            return finish(messages, false, false, "Validation failed", &mut on_status);
        }

        on_status(PipelineStatus::Repairing);
        info!("Step 2/3: repairing generated module if needed");
        let repair = self.repair_if_needed(scene, request, &validation);
        let repaired = repair.did_repair;
        messages.extend(repair.messages);
        let (Some(avatar), Some(effective)) = (request.avatar, repair.effective) else {
            warn!("Repair failed; apply was blocked");
            return finish(messages, false, repaired, "Repair failed", &mut on_status);
        };

        on_status(PipelineStatus::Applying);
        info!("Step 3/3: applying generated module");
        let outcome = self.apply(scene, avatar, &effective);
        messages.extend(outcome.messages);

        let has_error = messages.has_error();
        let status = if has_error {
            "Pipeline failed"
        } else if outcome.applied {
            "Pipeline done"
        } else {
            "Pipeline done without apply"
        };
        finish(messages, outcome.applied, repaired, status, &mut on_status)
    }
}

/// `<status>. Errors: N, Warnings: N, Info: N.`
pub fn summary_line(status: &str, messages: &MessageLog) -> String {
    format!(
        "{status}. Errors: {}, Warnings: {}, Info: {}.",
        messages.count(Severity::Error),
        messages.count(Severity::Warning),
        messages.count(Severity::Info)
    )
}

fn finish(
    messages: MessageLog,
    applied: bool,
    repaired: bool,
    status: &str,
    on_status: &mut impl FnMut(PipelineStatus),
) -> PipelineResult {
    let summary = summary_line(status, &messages);
    info!(applied, %summary, "Closet pipeline finished");
    on_status(PipelineStatus::Done);
    PipelineResult {
        has_error: messages.has_error(),
        applied,
        repaired,
        final_status: PipelineStatus::Done,
        summary,
        messages,
    }
}
