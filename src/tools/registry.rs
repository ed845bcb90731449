//! Tool registries.
//!
//! A [`ToolRegistry`] is one module's bundle: the ordered schemas it
//! advertises plus the name -> tool map used for dispatch. At startup every
//! module registry is folded into a single [`GlobalRegistry`], with the
//! handling of duplicate names chosen explicitly through [`ConflictPolicy`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::Tool;
use crate::schema::ToolSchema;

// --- Per-module registry ---

/// One module's schemas and tool implementations.
///
/// Every schema name should have a matching entry in the call map. A
/// missing entry is not checked here; it surfaces as "not found" at
/// dispatch time.
#[derive(Clone)]
pub struct ToolRegistry {
    name: String,
    tools: Vec<ToolSchema>,
    call_map: IndexMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry for the module `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tools: Vec::new(),
            call_map: IndexMap::new(),
        }
    }

    /// Assemble a registry from separately declared schemas and tools.
    pub fn from_parts(
        name: impl Into<String>,
        tools: Vec<ToolSchema>,
        call_map: IndexMap<String, Arc<dyn Tool>>,
    ) -> Self {
        Self {
            name: name.into(),
            tools,
            call_map,
        }
    }

    /// Register a tool, advertising its schema. Re-registering a name
    /// replaces the earlier entry.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        let name = schema.name().to_string();
        match self.tools.iter_mut().find(|s| s.name() == name) {
            Some(existing) => *existing = schema,
            None => self.tools.push(schema),
        }
        self.call_map.insert(name, tool);
    }

    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.register(Arc::new(tool));
        self
    }

    /// Module name (e.g. "file").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schemas in declaration order.
    pub fn tools(&self) -> &[ToolSchema] {
        &self.tools
    }

    pub fn call_map(&self) -> &IndexMap<String, Arc<dyn Tool>> {
        &self.call_map
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.call_map.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(ToolSchema::name).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("name", &self.name)
            .field("tools", &self.names())
            .field("callables", &self.call_map.keys().collect::<Vec<_>>())
            .finish()
    }
}

// --- Conflict policy ---

/// How a name declared by more than one module is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// The module merged later replaces the earlier one.
    #[default]
    LastWins,
    /// The first module to declare a name keeps it.
    FirstWins,
    /// Building the registry fails.
    Reject,
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "last_wins" | "last" => Ok(Self::LastWins),
            "first_wins" | "first" => Ok(Self::FirstWins),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unknown conflict policy '{other}' (expected last_wins, first_wins or reject)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("tool '{name}' is declared by both module '{first}' and module '{second}'")]
    Conflict {
        name: String,
        first: String,
        second: String,
    },
}

// --- Global registry ---

/// The process-wide union of all module registries.
///
/// Built once at startup and read-only afterwards.
pub struct GlobalRegistry {
    schemas: IndexMap<String, ToolSchema>,
    call_map: IndexMap<String, Arc<dyn Tool>>,
    origins: HashMap<String, String>,
}

impl GlobalRegistry {
    /// A registry with no tools.
    pub fn empty() -> Self {
        Self {
            schemas: IndexMap::new(),
            call_map: IndexMap::new(),
            origins: HashMap::new(),
        }
    }

    /// Fold `modules`, in order, into one registry.
    ///
    /// A schema or tool keeps the position where its name was first seen;
    /// which module's entry ends up there is decided by `policy`.
    pub fn build(
        modules: impl IntoIterator<Item = ToolRegistry>,
        policy: ConflictPolicy,
    ) -> Result<Self, RegistryError> {
        let mut global = Self::empty();
        let mut module_count = 0usize;
        for module in modules {
            global.merge(module, policy)?;
            module_count += 1;
        }
        info!(
            modules = module_count,
            tools = global.call_map.len(),
            schemas = global.schemas.len(),
            ?policy,
            "tool registry built"
        );
        Ok(global)
    }

    fn merge(&mut self, module: ToolRegistry, policy: ConflictPolicy) -> Result<(), RegistryError> {
        let ToolRegistry {
            name: module_name,
            tools,
            call_map,
        } = module;
        debug!(module = %module_name, tools = tools.len(), "merging tool module");

        let mut declared: Vec<String> = tools.iter().map(|s| s.name().to_string()).collect();
        for name in call_map.keys() {
            if !declared.contains(name) {
                declared.push(name.clone());
            }
        }

        let mut skipped = Vec::new();
        for name in &declared {
            // Names are unique within one module, so any hit comes from an
            // earlier merge step, even when both modules share a name.
            let Some(previous) = self.origins.get(name) else {
                continue;
            };
            match policy {
                ConflictPolicy::Reject => {
                    return Err(RegistryError::Conflict {
                        name: name.clone(),
                        first: previous.clone(),
                        second: module_name,
                    });
                }
                ConflictPolicy::LastWins => {
                    warn!(tool = %name, replaced = %previous, by = %module_name, "duplicate tool name, later module wins");
                }
                ConflictPolicy::FirstWins => {
                    warn!(tool = %name, kept = %previous, ignored = %module_name, "duplicate tool name, earlier module kept");
                    skipped.push(name.clone());
                }
            }
        }

        for schema in tools {
            if !skipped.iter().any(|n| n == schema.name()) {
                self.schemas.insert(schema.name().to_string(), schema);
            }
        }
        for (name, tool) in call_map {
            if !skipped.contains(&name) {
                self.call_map.insert(name, tool);
            }
        }
        for name in declared {
            if !skipped.contains(&name) {
                self.origins.insert(name, module_name.clone());
            }
        }
        Ok(())
    }

    /// Merged schemas, one per name.
    pub fn schemas(&self) -> impl Iterator<Item = &ToolSchema> {
        self.schemas.values()
    }

    /// Merged schemas as the JSON array sent to the LLM.
    pub fn schemas_json(&self) -> Value {
        Value::Array(self.schemas().map(ToolSchema::to_json).collect())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.call_map.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.call_map.contains_key(name)
    }

    /// Module that supplied `name`.
    pub fn origin(&self, name: &str) -> Option<&str> {
        self.origins.get(name).map(String::as_str)
    }

    /// Callable tool names, in merge order.
    pub fn names(&self) -> Vec<&str> {
        self.call_map.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.call_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.call_map.is_empty()
    }
}

impl Default for GlobalRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for GlobalRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalRegistry")
            .field("schemas", &self.schemas.keys().collect::<Vec<_>>())
            .field("callables", &self.names())
            .finish()
    }
}
