//! Image sampling at patient coordinates.
//!
//! A point maps to the continuous index `(p - origin) / (resolution * direction)`
//! per axis. The slice is that index truncated toward zero; column and row are
//! rounded half to even. The clinical system samples the same way, so values
//! taken here compare exactly with the declared ones.

use rtprep_core::Point3;

use crate::error::StoreError;
use crate::model::Image;

/// Largest continuous index magnitude accepted. Far beyond any real image,
/// small enough that the block around the index cannot overflow.
const MAX_INDEX: f64 = 2_147_483_647.0;

/// Integer voxel index `(x, y, z)` of a point.
///
/// Fails when an axis index is not finite or lies beyond [`MAX_INDEX`]; an
/// index that is merely outside the image is returned and rejected on lookup.
#[allow(clippy::cast_possible_truncation)]
pub fn voxel_index(image: &Image, point: Point3) -> Result<(i64, i64, i64), StoreError> {
    let origin = image.origin.to_array();
    let coordinates = point.to_array();
    let continuous = |axis: usize| {
        let index = (coordinates[axis] - origin[axis])
            / (image.resolution[axis] * image.direction[axis]);
        if index.is_finite() && index.abs() <= MAX_INDEX {
            Ok(index)
        } else {
            Err(StoreError::PointOutsideImage {
                image: image.id.clone(),
                point,
            })
        }
    };
    let index = [continuous(0)?, continuous(1)?, continuous(2)?];
    Ok((
        index[0].round_ties_even() as i64,
        index[1].round_ties_even() as i64,
        index[2].trunc() as i64,
    ))
}

/// Display value at `point`.
pub fn sample(image: &Image, point: Point3) -> Result<f64, StoreError> {
    let (x, y, z) = voxel_index(image, point)?;
    image.display_value(x, y, z)
}

/// The 27 display values of the 3×3×3 block centred on `point`.
///
/// Ordered by slice, then column, then row. Any voxel outside the image fails
/// the whole block.
pub fn neighbourhood(image: &Image, point: Point3) -> Result<Vec<f64>, StoreError> {
    let (x, y, z) = voxel_index(image, point)?;
    let mut values = Vec::with_capacity(27);
    for slice in z - 1..=z + 1 {
        for column in x - 1..=x + 1 {
            for row in y - 1..=y + 1 {
                values.push(image.display_value(column, row, slice)?);
            }
        }
    }
    Ok(values)
}
