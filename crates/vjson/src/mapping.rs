//! Computes which fields are copied between two shapes.

use crate::error::{Error, FieldMismatch};
use crate::shape::{FieldMapping, Layout, Source};

/// Whether rename directives on the target shape apply.
///
/// Directives on a version shape name a field of the previous version, so
/// they only mean something between adjacent versions. Mapping between the
/// live type and the latest version always goes by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Directives {
    Honor,
    Ignore,
}

/// Compute the copy instructions from `src` into `dst`, ordered by source
/// field index.
pub(crate) fn compute_mappings(
    src: &Layout,
    dst: &Layout,
    directives: Directives,
) -> Result<Vec<FieldMapping>, Error> {
    let mut mappings = Vec::new();

    for (target, dst_field) in dst.fields.iter().enumerate() {
        let (source_name, explicit) = match (directives, dst_field.source()) {
            (Directives::Honor, Source::Skip) => continue,
            (Directives::Honor, Source::Renamed(name)) => (name, true),
            _ => (dst_field.name(), false),
        };

        let Some(source) = src.position(source_name) else {
            if explicit {
                return Err(Error::FieldTypeMismatch(FieldMismatch::MissingSource {
                    source_field: source_name,
                    source_shape: src.name,
                    target_field: dst_field.name(),
                    target_shape: dst.name,
                }));
            }
            continue;
        };
        let src_field = &src.fields[source];

        if !src_field.same_type(dst_field) {
            let mismatch = if src_field.name() == dst_field.name() {
                FieldMismatch::SameName {
                    field: dst_field.name(),
                    source_shape: src.name,
                    source_type: src_field.type_name(),
                    target_shape: dst.name,
                    target_type: dst_field.type_name(),
                }
            } else {
                FieldMismatch::Renamed {
                    source_field: src_field.name(),
                    source_type: src_field.type_name(),
                    source_shape: src.name,
                    target_field: dst_field.name(),
                    target_type: dst_field.type_name(),
                    target_shape: dst.name,
                }
            };
            return Err(Error::FieldTypeMismatch(mismatch));
        }

        mappings.push(FieldMapping { source, target });
    }

    mappings.sort_by_key(|m| m.source);
    Ok(mappings)
}
