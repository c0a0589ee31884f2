use super::{
    types::ImportError,
    util::{require_attribute, require_child, strip_reference},
};
use crate::{arm_error::ArmError, document::DocumentNode};
use log::{error, info};

/// Reads the joint names of the first skin controller, in the order the skin
/// refers to them. The position of a name in this list is the joint index
/// used by vertex weights, so the skeleton loader uses it to number joints.
///
/// Expects `library_controllers`.
///
/// # Errors
/// May return `ArmError`
pub fn extract_joint_order<N: DocumentNode>(
    library_controllers: &N,
) -> Result<Vec<String>, ArmError> {
    let controller = require_child(library_controllers, "controller")?;
    let skin = require_child(controller, "skin")?;
    let weights = require_child(skin, "vertex_weights")?;
    let Some(input) = weights.child_with_attribute("input", "semantic", "JOINT")
    else {
        error!("skin vertex weights have no JOINT input");
        return Err(ImportError::MissingNode("input".to_owned()).into());
    };
    let source_id = strip_reference(require_attribute(input, "source")?)?;
    let Some(source) = skin.child_with_attribute("source", "id", source_id)
    else {
        error!("skin joint source {} not found", source_id);
        return Err(ImportError::MissingSource(source_id.to_owned()).into());
    };

    let names = require_child(source, "Name_array")?;
    let Some(text) = names.text() else {
        return Err(ImportError::MissingText("Name_array".to_owned()).into());
    };
    let order: Vec<String> =
        text.split_whitespace().map(ToString::to_string).collect();
    info!("Skin refers to {} joints", order.len());
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::XmlNode;

    fn controllers(reference: &str) -> XmlNode {
        XmlNode::new("library_controllers").with_child(
            XmlNode::new("controller").with_child(
                XmlNode::new("skin")
                    .with_child(
                        XmlNode::new("source")
                            .with_attribute("id", "skin-joints")
                            .with_child(
                                XmlNode::new("Name_array")
                                    .with_text("Hips Spine  Head\nLeftArm"),
                            ),
                    )
                    .with_child(
                        XmlNode::new("vertex_weights").with_child(
                            XmlNode::new("input")
                                .with_attribute("semantic", "JOINT")
                                .with_attribute("source", reference),
                        ),
                    ),
            ),
        )
    }

    #[test]
    fn joint_order() {
        let order = extract_joint_order(&controllers("#skin-joints")).unwrap();
        assert_eq!(order, vec!["Hips", "Spine", "Head", "LeftArm"]);
    }

    #[test]
    fn missing_joint_source() {
        let result = extract_joint_order(&controllers("#skin-bones"));
        assert!(matches!(
            result,
            Err(ArmError::ImportError(ImportError::MissingSource(_)))
        ));
    }
}
