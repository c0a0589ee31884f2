//! Loads a COLLADA file and prints its skeleton and animation clip
//!
//! Usage: `cargo run --example inspect -- <file.dae> [options.yaml]`
use armature::collada_import::{self, ImportOptions};
use std::path::Path;

const FILENAME: &str = "./tests/assets/rig.dae";

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let file_path = args.get(1).map_or(FILENAME, String::as_str);
    let options = args.get(2).map_or_else(ImportOptions::default, |path| {
        let file = std::fs::File::open(path).unwrap();
        ImportOptions::from_yaml(file).unwrap()
    });

    let loaded = collada_import::load(Path::new(file_path), &options).unwrap();

    let skeleton = &loaded.skeleton;
    println!("{} joints", skeleton.len());
    for joint in skeleton.collect_subtree(skeleton.root_id()) {
        let id = skeleton.find_id(joint.name()).unwrap();
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = skeleton.parent(current) {
            depth += 1;
            current = parent;
        }
        let bind = skeleton.bind_transform(id).unwrap();
        println!(
            "{:indent$}[{}] {} at ({:.3}, {:.3}, {:.3})",
            "",
            joint.index(),
            joint.name(),
            bind[(0, 3)],
            bind[(1, 3)],
            bind[(2, 3)],
            indent = depth * 2
        );
    }

    if let Some(animation) = &loaded.animation {
        println!(
            "animation: {:.3}s, {} keyframes, joints: {}",
            animation.duration(),
            animation.keyframe_count(),
            animation.joint_names().join(", ")
        );
        for frame in animation.keyframes() {
            println!("  t={:.3} joints={}", frame.time(), frame.len());
        }
    } else {
        println!("no animation");
    }
}
