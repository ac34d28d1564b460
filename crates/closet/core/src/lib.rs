//! Avatar closet generation.
//!
//! Collects outfit inventories from a host scene graph, checks them, and
//! keeps one generated menu/toggle module per avatar in sync with them
//! through a Validate → Repair → Apply pipeline.

pub mod error;
pub mod framework;
pub mod generated;
pub mod inventory;
pub mod keys;
pub mod message;
pub mod pipeline;
pub mod reconcile;
pub mod scene;
pub mod selection;
pub mod settings;
pub mod validate;

pub use error::{ReconcileError, Result};
pub use framework::{FrameworkAdapter, FrameworkCapability, FrameworkError, LayoutId, adapter_for};
pub use inventory::{Inventory, InventoryPart, InventoryRoot, InventorySet, OutfitEntry};
pub use message::{MessageLog, PipelineMessage, Severity};
pub use pipeline::{ClosetPipeline, PipelineRequest, PipelineResult, PipelineStatus};
pub use reconcile::{ApplyOutcome, EffectiveOutfits, OutfitSource, RepairResult};
pub use scene::{NodeId, Scene, SceneError, SceneGraph};
pub use settings::GeneratorSettings;
pub use validate::ValidationResult;
