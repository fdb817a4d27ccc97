//! Validation configuration for mapping extraction.
//!
//! Decoding already validates everything structural: record grammar, dead-record
//! confirmations, the weak-table kind restriction, and the global uniqueness invariant. The
//! options here only widen or narrow the discovery behavior around that core - the invariant
//! checks themselves are not configurable, since a corrupt artifact must never load.

/// Configuration for metadata-mapping extraction.
///
/// The defaults mirror the producing toolchain: the marker type is required to exist, and
/// table sizes are unbounded (the scan is always bounded by the stream length regardless).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Require the reserved mapping marker type to exist in the metadata-describing module.
    ///
    /// When disabled, a module without the marker yields an empty snapshot instead of a
    /// format error - useful for hosts that probe modules without checking
    /// [`crate::metadata::manager::MetadataManager::module_has_metadata_mappings`] first.
    pub require_mapping_type: bool,

    /// Upper bound on the number of records accepted per table.
    ///
    /// A corrupt artifact can declare absurdly large tables; hosts that load untrusted
    /// images can bound the decode cost. `None` accepts any count the stream actually
    /// contains.
    pub max_table_records: Option<usize>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            require_mapping_type: true,
            max_table_records: None,
        }
    }
}

impl ValidationConfig {
    /// Creates a configuration that tolerates modules without the mapping marker type.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            require_mapping_type: false,
            max_table_records: None,
        }
    }

    /// Creates a configuration bounding every table to `max_records` records.
    ///
    /// # Arguments
    /// * `max_records` - The record bound applied to each decoded table
    #[must_use]
    pub fn bounded(max_records: usize) -> Self {
        Self {
            require_mapping_type: true,
            max_table_records: Some(max_records),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let default = ValidationConfig::default();
        assert!(default.require_mapping_type);
        assert_eq!(default.max_table_records, None);

        assert!(!ValidationConfig::minimal().require_mapping_type);
        assert_eq!(ValidationConfig::bounded(16).max_table_records, Some(16));
    }
}
