//! Tunables for the engine.
//!
//! Every constant the original implementation hardcoded is exposed here so
//! tests can shrink them (a B+tree with order 8 exercises the same splitting
//! logic as one with order 1024, far more cheaply).

/// Tunable knobs for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// B+tree order: a node splits once it holds this many keys.
    pub max_node_keys: usize,
    /// How many comparators a shared-scan bucket may fuse into one pass.
    pub max_shared_per_pass: usize,
    /// Worker cap for the batch scheduler.
    pub max_select_threads: usize,
    /// Tile width (in elements) for a shared-scan pass over a base vector.
    pub select_vector_size: usize,
    /// Rows per tile in the multi-row print wire format.
    pub print_tile_rows: usize,
    /// Tile width (in tuples) for the nested-loop join.
    pub nested_loop_tile: usize,
    /// Initial table-array capacity for a freshly created database.
    pub default_db_tables_capacity: usize,
    /// Initial row capacity for a freshly created table.
    pub default_table_capacity: usize,
    /// Initial handle-table capacity for a freshly created client context.
    pub default_client_handles: usize,
    /// Top-level bucket count for the join hash map.
    pub hashmap_size: usize,
    /// Entries per hash-map bucket node before chaining to an overflow node.
    pub hashmap_node_size: usize,
    /// Directory persistence dumps/restores the catalog from.
    pub database_home_directory: String,
}

/// Upper bound on the batch scheduler's worker pool, mirroring the
/// teacher's `ParallelizationPolicy::Auto` cap on logical CPUs.
const MAX_SELECT_THREADS_CAP: usize = 16;

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_node_keys: 1024,
            max_shared_per_pass: 1,
            max_select_threads: num_cpus::get().clamp(1, MAX_SELECT_THREADS_CAP),
            select_vector_size: 8096,
            print_tile_rows: 512,
            nested_loop_tile: 1024,
            default_db_tables_capacity: 16,
            default_table_capacity: 1_000_000,
            default_client_handles: 8,
            hashmap_size: 4096,
            hashmap_node_size: 8,
            database_home_directory: "./databases".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for [`EngineConfig`], following the same construct-then-`build`
/// shape the engine uses for its thread-pool policy.
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: Option<EngineConfig>,
}

macro_rules! setter {
    ($field:ident, $ty:ty) => {
        pub fn $field(mut self, value: $ty) -> Self {
            let mut cfg = self.config.take().unwrap_or_default();
            cfg.$field = value;
            self.config = Some(cfg);
            self
        }
    };
}

impl EngineConfigBuilder {
    setter!(max_node_keys, usize);
    setter!(max_shared_per_pass, usize);
    setter!(max_select_threads, usize);
    setter!(select_vector_size, usize);
    setter!(print_tile_rows, usize);
    setter!(nested_loop_tile, usize);
    setter!(default_db_tables_capacity, usize);
    setter!(default_table_capacity, usize);
    setter!(default_client_handles, usize);
    setter!(hashmap_size, usize);
    setter!(hashmap_node_size, usize);

    pub fn database_home_directory(mut self, value: impl Into<String>) -> Self {
        let mut cfg = self.config.take().unwrap_or_default();
        cfg.database_home_directory = value.into();
        self.config = Some(cfg);
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_source_constants() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_node_keys, 1024);
        assert_eq!(cfg.select_vector_size, 8096);
        assert_eq!(cfg.print_tile_rows, 512);
    }

    #[test]
    fn builder_overrides_selectively() {
        let cfg = EngineConfig::builder().max_node_keys(8).build();
        assert_eq!(cfg.max_node_keys, 8);
        assert_eq!(cfg.select_vector_size, 8096);
    }
}
