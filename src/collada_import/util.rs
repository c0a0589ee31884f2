use super::types::ImportError;
use crate::document::DocumentNode;
use nalgebra_glm as glm;

#[allow(unused_imports)]
use log::{debug, error, trace};

/// Number of floats in one 4x4 matrix sample
pub const MATRIX_SIZE: usize = 16;

pub fn require_child<'a, N: DocumentNode>(
    node: &'a N,
    tag: &str,
) -> Result<&'a N, ImportError> {
    node.child(tag).ok_or_else(|| {
        error!("<{}> has no <{}> child", node.tag(), tag);
        ImportError::MissingNode(tag.to_owned())
    })
}

pub fn require_attribute<'a, N: DocumentNode>(
    node: &'a N,
    name: &str,
) -> Result<&'a str, ImportError> {
    node.attribute(name).ok_or_else(|| {
        error!("<{}> has no {} attribute", node.tag(), name);
        ImportError::MissingAttribute(name.to_owned())
    })
}

/// Resolves a URI fragment reference like "#Hips-output" to the id it names
pub fn strip_reference(reference: &str) -> Result<&str, ImportError> {
    reference
        .strip_prefix('#')
        .ok_or_else(|| ImportError::BadReference(reference.to_owned()))
}

/// Parses whitespace separated floats. Every token must be a finite number.
pub fn parse_floats(text: &str) -> Result<Vec<f32>, ImportError> {
    text.split_whitespace()
        .map(|token| match token.parse::<f32>() {
            Ok(x) if x.is_finite() => Ok(x),
            _ => {
                error!("bad number token {:?}", token);
                Err(ImportError::BadNumber(token.to_owned()))
            }
        })
        .collect()
}

/// Reads the `float_array` child of a `source` element. If the array declares
/// a count it must match what was read.
pub fn read_float_array<N: DocumentNode>(
    source: &N,
) -> Result<Vec<f32>, ImportError> {
    let array = require_child(source, "float_array")?;
    let values = parse_floats(array.text().unwrap_or_default())?;
    if let Some(count) = array.attribute("count") {
        if count.trim().parse::<usize>().ok() != Some(values.len()) {
            let id = array.attribute("id").unwrap_or("float_array");
            error!(
                "{} declares count={} but holds {} values",
                id,
                count,
                values.len()
            );
            return Err(ImportError::CountMismatch(id.to_owned()));
        }
    }
    trace!("read {} floats", values.len());
    Ok(values)
}

/// Builds a matrix from 16 floats in document order. The document stores
/// matrices row by row, so they are loaded as columns then transposed.
#[must_use]
pub fn load_matrix(values: &[f32; MATRIX_SIZE]) -> glm::Mat4 {
    glm::make_mat4(values).transpose()
}

/// Rotation taking a Z axis up document into Y axis up
#[must_use]
pub fn z_up_correction() -> glm::Mat4 {
    glm::rotation(-std::f32::consts::FRAC_PI_2, &glm::vec3(1.0, 0.0, 0.0))
}
