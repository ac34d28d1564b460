use crate::framework::FrameworkError;
use crate::scene::SceneError;
use thiserror::Error;

/// Failures raised inside the Repair and Apply stages.
///
/// These never reach pipeline callers as `Err`; the stage boundary turns
/// them into an Error message.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("No usable outfit data found in the tagged tree, caller input or registration store.")]
    NoOutfitSource,

    #[error(
        "Caller outfit list ({caller} entries) conflicts with the registration store ({stored} entries). \
         Make the list match the stored outfits or forget the stored registration, then run again."
    )]
    SourceConflict { caller: usize, stored: usize },

    #[error("Avatar root is missing.")]
    AvatarMissing,

    #[error("no valid outfits to apply.")]
    NothingToApply,

    #[error("outfit '{outfit}' target is outside the avatar root.")]
    TargetOutsideAvatar { outfit: String },

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Framework(#[from] FrameworkError),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
