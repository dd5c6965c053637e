//! Data model shared by the EHR toolkit: cell values, the annotated table,
//! its typed metadata and the multi-modality container.

pub mod error;
pub mod metadata;
pub mod multi;
pub mod table;
pub mod value;

pub use error::{ModelError, Result};
pub use metadata::{
    ArchivedColumn, ColumnSelection, ENCODED_PREFIX, EncodingHistory, EncodingMode,
    NormalizationMethod, TableMetadata, is_encoded_name,
};
pub use multi::{ModalitySettings, MultiTable};
pub use table::{AnnotatedTable, LAYER_ORIGINAL, LAYER_RAW, stack_columns};
pub use value::Value;
