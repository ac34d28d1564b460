#![cfg(test)]

use closet_core::framework::FrameworkCapability;
use closet_core::message::codes;
use closet_core::scene::{load_document, save_document};
use closet_core::{
    ClosetPipeline, GeneratorSettings, LayoutId, OutfitEntry, PipelineRequest, Scene, SceneGraph,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn applied_scene() -> Scene {
    let mut scene = Scene::new();
    for capability in FrameworkCapability::REQUIRED {
        scene.register_type(capability.type_names(LayoutId::ModularAvatar.layout()).qualified);
    }
    let avatar = scene.create_root("Avatar").unwrap();
    let closet = scene.create_node(avatar, "Closet").unwrap();
    let coat = scene.create_node(closet, "Coat").unwrap();
    let hat = scene.create_node(closet, "Hat").unwrap();

    let pipeline = ClosetPipeline::with_layout(LayoutId::ModularAvatar, GeneratorSettings::default());
    let request = PipelineRequest::new(avatar).with_outfits(vec![
        OutfitEntry::new("Coat", coat),
        OutfitEntry::new("Hat", hat).with_group("Heads"),
    ]);
    let result = pipeline.run(&mut scene, &request, |_| {});
    assert!(result.applied, "{:?}", result.messages);
    scene
}

#[test]
fn test_saved_scene_reloads_identically() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("scene.json");
    let scene = applied_scene();

    save_document(&scene, &path).unwrap();
    assert!(path.exists());
    let reloaded = load_document(&path).unwrap();
    assert_eq!(reloaded.to_document().unwrap(), scene.to_document().unwrap());
}

#[test]
fn test_reloaded_scene_needs_no_repair() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("scene.json");
    save_document(&applied_scene(), &path).unwrap();

    let mut scene = load_document(&path).unwrap();
    let avatar = scene.find_path("Avatar").unwrap();
    let before = scene.to_document().unwrap();

    let pipeline = ClosetPipeline::with_layout(LayoutId::ModularAvatar, GeneratorSettings::default());
    let result = pipeline.run(&mut scene, &PipelineRequest::new(avatar), |_| {});
    assert!(!result.has_error, "{:?}", result.messages);
    assert!(!result.repaired);
    assert!(result.messages.has_code(codes::REPAIR_SKIPPED));
    assert_eq!(scene.to_document().unwrap(), before);
}

#[test]
fn test_malformed_document_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("scene.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(load_document(&path).is_err());
}

#[test]
fn test_outfit_targets_survive_reload() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("scene.json");
    save_document(&applied_scene(), &path).unwrap();

    let scene = load_document(&path).unwrap();
    let avatar = scene.find_path("Avatar").unwrap();
    let hat = scene.find_path("Avatar/Closet/Hat").unwrap();
    let pipeline = ClosetPipeline::with_layout(LayoutId::ModularAvatar, GeneratorSettings::default());
    let effective = pipeline
        .resolve_outfits(&scene, &PipelineRequest::new(avatar))
        .unwrap();
    assert_eq!(effective.outfits()[1], OutfitEntry::new("Hat", hat).with_group("Heads"));
    assert!(scene.contains(hat));
}
