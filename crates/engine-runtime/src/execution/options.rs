use engine_core::retry::RetryPolicy;

/// Knobs for a single run. Defaults run mappings one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Upper bound on mappings processed concurrently.
    pub max_parallel_mappings: usize,
    /// Explicit table list replacing the `selected` flags when set.
    pub tables: Option<Vec<String>>,
    pub retry: RetryPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_parallel_mappings: 1,
            tables: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl RunOptions {
    pub fn with_parallelism(mut self, max_parallel_mappings: usize) -> Self {
        self.max_parallel_mappings = max_parallel_mappings.max(1);
        self
    }

    pub fn with_tables(mut self, tables: Vec<String>) -> Self {
        self.tables = (!tables.is_empty()).then_some(tables);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_list_keeps_selection() {
        let options = RunOptions::default().with_tables(Vec::new());
        assert_eq!(options.tables, None);

        let options = options.with_tables(vec!["dbo.Orders".into()]);
        assert_eq!(options.tables.as_deref(), Some(&["dbo.Orders".to_string()][..]));
    }

    #[test]
    fn test_parallelism_is_at_least_one() {
        assert_eq!(RunOptions::default().with_parallelism(0).max_parallel_mappings, 1);
        assert_eq!(RunOptions::default().with_parallelism(4).max_parallel_mappings, 4);
    }
}
