//! Shared CLI state: the configured pipeline, the journal and scene loading.

use anyhow::{Context, Result};
use clap::Args;
use closet_config::ClosetConfig;
use closet_core::scene::{self, SceneGraph};
use closet_core::{
    ClosetPipeline, GeneratorSettings, LayoutId, NodeId, OutfitEntry, PipelineRequest, Scene,
    inventory,
};
use closet_journal::JournalWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub struct AppContext {
    pub pipeline: ClosetPipeline,
    pub journal: JournalWriter,
}

impl AppContext {
    pub fn from_config(config: &ClosetConfig) -> Result<Self> {
        let layout = LayoutId::from_str(&config.framework.layout).map_err(anyhow::Error::msg)?;
        let generator = &config.generator;
        let settings = GeneratorSettings {
            module_name: generator.module_name.clone(),
            store_name: generator.store_name.clone(),
            asset_folder: generator.asset_folder.clone(),
            closet_menu_label: generator.closet_menu_label.clone(),
            parts_menu_label: generator.parts_menu_label.clone(),
        };

        let journal = if config.journal.enabled {
            match config.journal.dir.as_deref().map(str::trim) {
                Some(dir) if !dir.is_empty() => JournalWriter::new(dir),
                _ => match closet_journal::default_journal_dir() {
                    Ok(dir) => JournalWriter::new(dir),
                    Err(e) => {
                        tracing::warn!(error = %e, "Run journal disabled");
                        JournalWriter::disabled()
                    }
                },
            }
        } else {
            JournalWriter::disabled()
        };

        Ok(Self {
            pipeline: ClosetPipeline::with_layout(layout, settings),
            journal,
        })
    }
}

/// `<name>=<path>[@group]`; `path` is looked up under the avatar first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutfitArg {
    pub name: String,
    pub path: String,
    pub group: Option<String>,
}

impl FromStr for OutfitArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, rest) = s
            .split_once('=')
            .ok_or_else(|| format!("expected <name>=<path>[@group], got '{s}'"))?;
        let (path, group) = match rest.rsplit_once('@') {
            Some((path, group)) => (path, Some(group.trim().to_string())),
            None => (rest, None),
        };
        let path = path.trim().trim_matches('/');
        if path.is_empty() {
            return Err(format!("outfit '{name}' has an empty path"));
        }
        Ok(Self {
            name: name.trim().to_string(),
            path: path.to_string(),
            group,
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct SceneArgs {
    /// Scene document (JSON)
    #[arg(long)]
    pub scene: PathBuf,

    /// Avatar root path inside the scene, e.g. `Avatar`
    #[arg(long)]
    pub avatar: String,

    /// Closet root path; outfits must be its direct children. Without
    /// --outfit, its children become the outfit list.
    #[arg(long)]
    pub closet: Option<String>,

    /// Outfit as <name>=<path>[@group]; repeatable
    #[arg(long = "outfit", value_name = "NAME=PATH[@GROUP]")]
    pub outfits: Vec<OutfitArg>,
}

/// A loaded scene plus the request built from the command line.
pub struct Loaded {
    pub scene: Scene,
    pub avatar: NodeId,
    pub request: PipelineRequest,
}

impl SceneArgs {
    pub fn load(&self) -> Result<Loaded> {
        let scene = scene::load_document(&self.scene)
            .with_context(|| format!("Failed to load scene {}", self.scene.display()))?;
        let avatar = scene
            .find_path(&self.avatar)
            .with_context(|| format!("Avatar '{}' not found in scene", self.avatar))?;

        let mut request = PipelineRequest::new(avatar);
        let closet = match &self.closet {
            Some(path) => {
                let closet = resolve(&scene, avatar, path)
                    .with_context(|| format!("Closet '{path}' not found in scene"))?;
                request = request.with_closet(closet);
                Some(closet)
            }
            None => None,
        };

        let outfits = if self.outfits.is_empty() {
            match closet {
                Some(closet) => inventory::scan_closet(&scene, closet)?,
                None => Vec::new(),
            }
        } else {
            self.outfits
                .iter()
                .map(|arg| {
                    let target = resolve(&scene, avatar, &arg.path)
                        .with_context(|| format!("Outfit target '{}' not found", arg.path))?;
                    let entry = OutfitEntry::new(&arg.name, target);
                    Ok(match &arg.group {
                        Some(group) => entry.with_group(group),
                        None => entry,
                    })
                })
                .collect::<Result<Vec<_>>>()?
        };

        Ok(Loaded {
            scene,
            avatar,
            request: request.with_outfits(outfits),
        })
    }

    pub fn save(&self, scene: &Scene) -> Result<()> {
        save_scene(scene, &self.scene)
    }
}

pub fn save_scene(scene: &Scene, path: &Path) -> Result<()> {
    scene::save_document(scene, path)
        .with_context(|| format!("Failed to save scene {}", path.display()))
}

/// Look `path` up below the avatar, then from the scene roots.
fn resolve(scene: &Scene, avatar: NodeId, path: &str) -> Option<NodeId> {
    let avatar_path = scene.full_path(avatar).ok()?;
    scene
        .find_path(&format!("{avatar_path}/{path}"))
        .or_else(|| scene.find_path(path))
}
