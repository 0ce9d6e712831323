// crates/puckboard-orchestrator/src/registry.rs
// ============================================================================
// Module: Tool Registry
// Description: Registry of query tools with plan selection.
// Purpose: Route a classified query to the tools that should run.
// Dependencies: puckboard-core
// ============================================================================

//! ## Overview
//! The registry holds the available query tools behind trait objects and
//! produces a tool plan for a classified query: every tool whose
//! [`puckboard_core::QueryTool::handles`] accepts the query type. Tool names
//! are unique within the registry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use puckboard_core::QueryTool;
use puckboard_core::QueryType;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A tool with this name is already registered.
    #[error("tool already registered: {0}")]
    DuplicateTool(String),
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Query tool registry.
///
/// # Invariants
/// - Tool names are unique within the registry.
#[derive(Default)]
pub struct ToolRegistry {
    /// Registered tools in registration order.
    tools: Vec<Arc<dyn QueryTool>>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTool`] when the name is taken.
    pub fn register(&mut self, tool: Arc<dyn QueryTool>) -> Result<(), RegistryError> {
        if self.tools.iter().any(|existing| existing.name() == tool.name()) {
            return Err(RegistryError::DuplicateTool(tool.name().to_string()));
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Returns the tools that should run for a query type, in registration
    /// order.
    #[must_use]
    pub fn plan(&self, query_type: QueryType) -> Vec<Arc<dyn QueryTool>> {
        self.tools.iter().filter(|tool| tool.handles(query_type)).cloned().collect()
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true when no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        clippy::unwrap_used,
        reason = "Test assertions use expect/unwrap for clarity."
    )]

    use std::sync::Arc;

    use puckboard_core::QueryTool;
    use puckboard_core::QueryType;
    use puckboard_core::ToolError;
    use puckboard_core::ToolOutput;
    use puckboard_core::ToolRequest;
    use puckboard_core::User;

    use super::ToolRegistry;

    /// Tool that handles one query type.
    struct FixedTool {
        /// Registered name.
        name: &'static str,
        /// Query type accepted.
        accepts: QueryType,
    }

    #[async_trait::async_trait]
    impl QueryTool for FixedTool {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handles(&self, query_type: QueryType) -> bool {
            query_type == self.accepts
        }

        async fn invoke(
            &self,
            _request: &ToolRequest,
            _user: &User,
        ) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput {
                data: serde_json::json!({}),
                citations: vec![],
                evidence: vec![],
            })
        }
    }

    #[test]
    fn plan_selects_handling_tools_in_registration_order() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(FixedTool {
                name: "metrics",
                accepts: QueryType::TeamAnalytics,
            }))
            .expect("register");
        registry
            .register(Arc::new(FixedTool {
                name: "clips",
                accepts: QueryType::ClipRetrieval,
            }))
            .expect("register");
        registry
            .register(Arc::new(FixedTool {
                name: "metrics_secondary",
                accepts: QueryType::TeamAnalytics,
            }))
            .expect("register");

        let plan = registry.plan(QueryType::TeamAnalytics);
        let names: Vec<&str> = plan.iter().map(|tool| tool.name()).collect();
        assert_eq!(names, vec!["metrics", "metrics_secondary"]);
        assert!(registry.plan(QueryType::Tactical).is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(FixedTool {
                name: "metrics",
                accepts: QueryType::TeamAnalytics,
            }))
            .expect("register");
        let error = registry
            .register(Arc::new(FixedTool {
                name: "metrics",
                accepts: QueryType::Tactical,
            }))
            .expect_err("duplicate");
        assert!(error.to_string().contains("metrics"));
    }
}
