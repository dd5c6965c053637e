//! Encoding and decoding every modality of a [`MultiTable`].

use std::collections::BTreeMap;

use ehr_model::{ModalitySettings, MultiTable};
use tracing::{debug, warn};

use crate::decode::{DecodeScope, decode};
use crate::encode::encode;
use crate::error::{EncodeError, Result};
use crate::plan::EncodingSpec;

/// Encodes each modality with its resolved autodetect flag and spec.
///
/// Modalities without autodetect and without a spec are skipped with a
/// warning. The container is only updated when every modality encodes.
pub fn encode_multi(
    data: &mut MultiTable,
    autodetect: &ModalitySettings<bool>,
    specs: &BTreeMap<String, EncodingSpec>,
) -> Result<()> {
    let mut encoded = BTreeMap::new();
    for (name, table) in &data.modalities {
        let auto = autodetect.resolve(name).copied().unwrap_or(false);
        let spec = specs.get(name);
        if auto && matches!(spec, Some(EncodingSpec::Columns(_))) {
            return Err(EncodeError::InvalidInput(format!(
                "modality {name} uses autodetect and only accepts an encoding mode"
            )));
        }
        if !auto && spec.is_none() {
            warn!(modality = %name, "no autodetect and no encodings given, skipping modality");
            continue;
        }
        debug!(modality = %name, autodetect = auto, "encoding modality");
        encoded.insert(name.clone(), encode(table, auto, spec)?);
    }
    data.modalities.extend(encoded);
    Ok(())
}

/// Decodes every encoded modality, leaving the others untouched.
pub fn decode_multi(data: &mut MultiTable) -> Result<()> {
    let mut decoded = BTreeMap::new();
    for (name, table) in &data.modalities {
        if !table.is_encoded() {
            debug!(modality = %name, "modality is not encoded");
            continue;
        }
        if let Some(table) = decode(table, &DecodeScope::All)? {
            decoded.insert(name.clone(), table);
        }
    }
    data.modalities.extend(decoded);
    Ok(())
}
