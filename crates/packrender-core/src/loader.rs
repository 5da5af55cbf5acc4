//! Loading a pack from a working directory and resolving its parameters

use std::path::Path;

use crate::error::{CoreError, Result, SchemaViolation};
use crate::pack::{LoadedPack, PackKind};
use crate::schema::SchemaValidator;
use crate::values::Values;

/// Load a renderable pack and its default values.
///
/// Library packs only provide helpers and are rejected here.
pub fn load<P: AsRef<Path>>(path: P) -> Result<(LoadedPack, Values)> {
    let pack = LoadedPack::load(path)?;

    if pack.pack.kind == PackKind::Library {
        return Err(CoreError::InvalidPack {
            message: format!("'{}' is a library pack and cannot be rendered", pack.name()),
        });
    }

    let defaults = if pack.values_path.is_file() {
        Values::from_file(&pack.values_path)?
    } else {
        Values::new()
    };

    tracing::debug!(pack = pack.name(), root = %pack.root.display(), "loaded pack");
    Ok((pack, defaults))
}

/// Merge schema defaults, pack defaults and the caller overlay, then validate.
pub fn resolve_parameters(pack: &LoadedPack, defaults: &Values, overlay: &Values) -> Result<Values> {
    let Some(schema) = pack.load_schema()? else {
        return Ok(defaults.clone().merged(overlay));
    };

    let validator = SchemaValidator::new(&schema)?;
    let values = validator.defaults().clone().merged(defaults).merged(overlay);

    let result = validator.validate(values.inner());
    if !result.is_valid {
        return Err(SchemaViolation {
            pack: pack.name().to_string(),
            errors: result.errors,
        }
        .into());
    }

    Ok(values)
}
