//! Tests for importing whole documents

use armature::{
    arm_error::ArmError,
    collada_import::{self, ImportError, ImportOptions},
    document::{DocumentNode, XmlNode},
};
use log::info;
use nalgebra_glm as glm;
use std::{path::Path, sync::Once};

const EPSILON: f32 = 0.00001f32; // Small value for float comparisons
const RIG: &str = "tests/assets/rig.dae";
const OPTIONS: &str = "tests/assets/options.yaml";
static INIT: Once = Once::new();

/// Initializes logging in a "once per test run" manner. Call at the start of
/// each test that needs logging.
fn init_tests() {
    INIT.call_once(|| {
        env_logger::init();
    });
}

/// Compare two matrices for approximate equality
fn compare(m1: &glm::Mat4, m2: &glm::Mat4) {
    let c = glm::equal_columns_eps(m1, m2, EPSILON);
    assert!(c.x && c.y && c.z && c.w, "{m1:?} != {m2:?}");
}

fn rig_path() -> &'static Path {
    Path::new(RIG)
}

#[test]
fn load_rig() {
    init_tests();
    let loaded = collada_import::load(rig_path(), &ImportOptions::default()).unwrap();
    assert_eq!(loaded.joint_order, vec!["Hips", "Spine", "Head"]);

    let skeleton = &loaded.skeleton;
    assert_eq!(skeleton.len(), 4);
    assert_eq!(skeleton.root().name(), "Hips");
    for (index, name) in ["Hips", "Spine", "Head", "Head_end"].iter().enumerate() {
        assert_eq!(skeleton.find(name).unwrap().index(), index);
    }

    // Head_end is 2.2 units above the origin in the rest pose
    let head_end = skeleton.find("Head_end").unwrap();
    info!("Head_end inverse bind={:?}", head_end.inverse_bind_transform());
    compare(
        head_end.inverse_bind_transform(),
        &glm::translation(&glm::vec3(0.0, -2.2, 0.0)),
    );

    let animation = loaded.animation.unwrap();
    assert_eq!(animation.keyframe_count(), 3);
    assert!((animation.duration() - 1.0).abs() < f32::EPSILON);
    assert_eq!(animation.joint_names(), vec!["Hips", "Spine"]);
    compare(
        animation.keyframes()[1].joint_transform("Hips").unwrap(),
        &glm::translation(&glm::vec3(0.0, 1.5, 0.0)),
    );
    compare(
        animation.keyframes()[1].joint_transform("Spine").unwrap(),
        &glm::translation(&glm::vec3(0.25, 0.0, 0.0)),
    );

    // Every animated joint exists in the skeleton
    for name in animation.joint_names() {
        assert!(skeleton.find(name).is_some());
    }
}

#[test]
fn options_from_yaml() {
    let file = std::fs::File::open(OPTIONS).unwrap();
    let options = ImportOptions::from_yaml(file).unwrap();
    assert_eq!(
        options,
        ImportOptions {
            armature_id: "Armature".to_owned(),
            z_up_correction: true,
        }
    );

    // Missing fields take defaults
    let options = ImportOptions::from_yaml("z_up_correction: true".as_bytes()).unwrap();
    assert_eq!(options.armature_id, "Armature");

    assert!(matches!(
        ImportOptions::from_yaml("z_up_correction: [1, 2]".as_bytes()),
        Err(ArmError::SerdeYamlError(_))
    ));
}

/// With correction the root joint and its samples are rotated into Y up
#[test]
fn corrected_rig() {
    init_tests();
    let options = ImportOptions {
        z_up_correction: true,
        ..ImportOptions::default()
    };
    let loaded = collada_import::load(rig_path(), &options).unwrap();
    let hips = loaded.skeleton.root();

    // Hips sits at y=1 in the document, which becomes z=-1 after rotating
    // Z up into Y up
    let position = hips.local_bind_transform() * glm::vec4(0.0, 0.0, 0.0, 1.0);
    let c = glm::equal_eps(&position, &glm::vec4(0.0, 0.0, -1.0, 1.0), EPSILON);
    assert!(c.x && c.y && c.z && c.w);

    let animation = loaded.animation.unwrap();
    let sample = animation.keyframes()[0].joint_transform("Hips").unwrap();
    compare(sample, hips.local_bind_transform());
    compare(
        animation.keyframes()[0].joint_transform("Spine").unwrap(),
        &glm::Mat4::identity(),
    );
}

#[test]
fn missing_armature() {
    let options = ImportOptions {
        armature_id: "Rig".to_owned(),
        ..ImportOptions::default()
    };
    assert!(matches!(
        collada_import::load(rig_path(), &options),
        Err(ArmError::ImportError(ImportError::MissingNode(_)))
    ));
}

#[test]
fn missing_file() {
    assert!(matches!(
        collada_import::load(Path::new("tests/assets/none.dae"), &ImportOptions::default()),
        Err(ArmError::StdIoError(_))
    ));
}

/// Without controllers or animations joints are numbered in visiting order
/// and there is no clip
#[test]
fn skeleton_only_document() {
    let doc = XmlNode::parse_str(
        r#"<COLLADA>
  <library_visual_scenes>
    <visual_scene id="Scene">
      <node id="Armature">
        <node id="Root">
          <matrix>1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1</matrix>
          <node sid="Left">
            <matrix>1 0 0 -1 0 1 0 0 0 0 1 0 0 0 0 1</matrix>
          </node>
          <node name="Right">
            <matrix>1 0 0 1 0 1 0 0 0 0 1 0 0 0 0 1</matrix>
          </node>
        </node>
      </node>
    </visual_scene>
  </library_visual_scenes>
</COLLADA>"#,
    )
    .unwrap();
    assert!(doc.child("library_animations").is_none());

    let loaded = collada_import::process_document(&doc, &ImportOptions::default()).unwrap();
    assert!(loaded.joint_order.is_empty());
    assert!(loaded.animation.is_none());
    let names: Vec<(usize, &str)> = loaded
        .skeleton
        .collect_subtree(loaded.skeleton.root_id())
        .iter()
        .map(|j| (j.index(), j.name()))
        .collect();
    assert_eq!(names, vec![(0, "Root"), (1, "Left"), (2, "Right")]);
    compare(
        loaded.skeleton.find("Right").unwrap().inverse_bind_transform(),
        &glm::translation(&glm::vec3(-1.0, 0.0, 0.0)),
    );
}

#[test]
fn short_joint_matrix() {
    let doc = XmlNode::parse_str(
        r#"<COLLADA>
  <library_visual_scenes>
    <visual_scene id="Scene">
      <node id="Armature">
        <node id="Root"><matrix>1 0 0 0 0 1 0 0 0 0 1 0</matrix></node>
      </node>
    </visual_scene>
  </library_visual_scenes>
</COLLADA>"#,
    )
    .unwrap();
    assert!(matches!(
        collada_import::process_document(&doc, &ImportOptions::default()),
        Err(ArmError::ImportError(ImportError::NotMatrixData(12)))
    ));
}

/// A loaded rig can be written out for inspection
#[test]
fn serialize_loaded() {
    let loaded = collada_import::load(rig_path(), &ImportOptions::default()).unwrap();
    let yaml = serde_yaml::to_string(&loaded.skeleton).unwrap();
    assert!(yaml.contains("Head_end"));
    let yaml = serde_yaml::to_string(loaded.animation.as_ref().unwrap()).unwrap();
    assert!(yaml.contains("duration"));
}

/// Blender names joint nodes `Armature_Hips` with sid `Hips`, and the skin
/// lists the sids. Skin positions are found through the sid while the id
/// stays the joint name.
#[test]
fn skin_order_by_sid() {
    init_tests();
    let doc = XmlNode::parse_str(
        r##"<COLLADA>
  <library_controllers>
    <controller id="Armature_Body-skin">
      <skin source="#Body-mesh">
        <source id="Armature_Body-skin-joints">
          <Name_array id="Armature_Body-skin-joints-array" count="2">Hips Spine</Name_array>
        </source>
        <vertex_weights count="0">
          <input semantic="JOINT" source="#Armature_Body-skin-joints" offset="0"/>
        </vertex_weights>
      </skin>
    </controller>
  </library_controllers>
  <library_visual_scenes>
    <visual_scene id="Scene">
      <node id="Armature">
        <node id="Armature_Hips" name="Hips" sid="Hips" type="JOINT">
          <matrix>1 0 0 0 0 1 0 1 0 0 1 0 0 0 0 1</matrix>
          <node id="Armature_Spine" name="Spine" sid="Spine" type="JOINT">
            <matrix>1 0 0 0 0 1 0 0.5 0 0 1 0 0 0 0 1</matrix>
            <node id="Armature_Tail" name="Tail" sid="Tail" type="JOINT">
              <matrix>1 0 0 0 0 1 0 0.5 0 0 1 0 0 0 0 1</matrix>
            </node>
          </node>
        </node>
      </node>
    </visual_scene>
  </library_visual_scenes>
</COLLADA>"##,
    )
    .unwrap();

    let loaded = collada_import::process_document(&doc, &ImportOptions::default()).unwrap();
    assert_eq!(loaded.joint_order, vec!["Hips", "Spine"]);
    let skeleton = &loaded.skeleton;
    let indices: Vec<(&str, usize)> = skeleton
        .collect_subtree(skeleton.root_id())
        .iter()
        .map(|j| (j.name(), j.index()))
        .collect();
    assert_eq!(
        indices,
        vec![("Armature_Hips", 0), ("Armature_Spine", 1), ("Armature_Tail", 2)]
    );
    assert_eq!(skeleton.inverse_bind_transforms().unwrap().len(), 3);
}
