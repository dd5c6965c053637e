//! JSON archives of annotated tables.
//!
//! Text cells cannot be stored in the numeric matrix of an archive, so a
//! table with pending text columns is label-encoded before writing and the
//! archive is flagged. Reading a flagged archive decodes it again.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use ehr_encode::{DecodeScope, decode, encode};
use ehr_model::{AnnotatedTable, TableMetadata, Value};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::frame::{FrameColumn, columns_to_frame, frame_to_columns};

pub const ARCHIVE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct TableArchive {
    version: u32,
    /// Set when text columns were label-encoded for writing.
    encoded_on_write: bool,
    obs_names: Vec<String>,
    var_names: Vec<String>,
    x: Array2<Value>,
    layers: BTreeMap<String, Array2<Value>>,
    obs: Vec<FrameColumn>,
    var: Vec<FrameColumn>,
    uns: TableMetadata,
}

impl TableArchive {
    fn from_table(table: &AnnotatedTable, encoded_on_write: bool) -> Result<Self> {
        Ok(Self {
            version: ARCHIVE_FORMAT_VERSION,
            encoded_on_write,
            obs_names: table.obs_names.clone(),
            var_names: table.var_names.clone(),
            x: table.x.clone(),
            layers: table.layers.clone(),
            obs: frame_to_columns(&table.obs).context("serialize obs")?,
            var: frame_to_columns(&table.var).context("serialize var")?,
            uns: table.uns.clone(),
        })
    }

    fn into_table(self) -> Result<AnnotatedTable> {
        let table = AnnotatedTable {
            x: self.x,
            obs_names: self.obs_names,
            obs: columns_to_frame(self.obs).context("restore obs")?,
            var_names: self.var_names,
            var: columns_to_frame(self.var).context("restore var")?,
            layers: self.layers,
            uns: self.uns,
        };
        table.validate()?;
        Ok(table)
    }
}

/// Label-encodes text columns of a table that has not been encoded yet.
fn prepare_for_write(table: &AnnotatedTable) -> Result<(Cow<'_, AnnotatedTable>, bool)> {
    if table.is_encoded() || !table.has_text_cells() {
        return Ok((Cow::Borrowed(table), false));
    }
    let mut pending = table.clone();
    for name in pending.text_columns() {
        if !pending.uns.is_non_numerical(&name) {
            pending.uns.unclassify(&name);
            pending.uns.non_numerical_columns.push(name);
        }
    }
    warn!(
        columns = ?pending.uns.non_numerical_columns,
        "table has text columns, label-encoding them for the archive"
    );
    let encoded = encode(&pending, true, None).context("encode text columns for writing")?;
    Ok((Cow::Owned(encoded), true))
}

/// Writes `table` as a JSON archive.
pub fn write_archive(path: &Path, table: &AnnotatedTable) -> Result<()> {
    let (table, encoded_on_write) = prepare_for_write(table)?;
    let archive = TableArchive::from_table(&table, encoded_on_write)?;

    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &archive)
        .with_context(|| format!("write archive {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;

    info!(
        path = %path.display(),
        n_obs = table.n_obs(),
        n_vars = table.n_vars(),
        encoded_on_write,
        "wrote table archive"
    );
    Ok(())
}

/// Reads a JSON archive written by [`write_archive`].
pub fn read_archive(path: &Path) -> Result<AnnotatedTable> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let archive: TableArchive = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse archive {}", path.display()))?;
    if archive.version != ARCHIVE_FORMAT_VERSION {
        bail!(
            "unsupported archive version {} in {} (expected {ARCHIVE_FORMAT_VERSION})",
            archive.version,
            path.display()
        );
    }

    let encoded_on_write = archive.encoded_on_write;
    let table = archive
        .into_table()
        .with_context(|| format!("restore table from {}", path.display()))?;
    if encoded_on_write && let Some(decoded) = decode(&table, &DecodeScope::All)? {
        info!(path = %path.display(), "decoded columns encoded on write");
        return Ok(decoded);
    }
    Ok(table)
}
