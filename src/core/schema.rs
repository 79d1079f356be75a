use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::core::{OptionValue, UpdateStage, Validator};
use crate::error::{PlotError, PlotResult};

type KeyList = SmallVec<[String; 2]>;
type IndexList = SmallVec<[usize; 2]>;

/// Declaration of a single formatoption within a plotter schema.
///
/// Dependency relations are declared by key and resolved to indices when the
/// schema is built, so no string lookup happens on the update path.
#[derive(Debug, Clone)]
pub struct OptionSpec {
    key: String,
    stage: UpdateStage,
    default: OptionValue,
    validator: Validator,
    children: KeyList,
    dependencies: KeyList,
    parents: KeyList,
    connections: KeyList,
    triggers_replot: bool,
    data_dependent: bool,
}

impl OptionSpec {
    #[must_use]
    pub fn new(key: &str, stage: UpdateStage, default: impl Into<OptionValue>) -> Self {
        Self {
            key: key.to_owned(),
            stage,
            default: default.into(),
            validator: Validator::Any,
            children: KeyList::new(),
            dependencies: KeyList::new(),
            parents: KeyList::new(),
            connections: KeyList::new(),
            triggers_replot: false,
            data_dependent: false,
        }
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Keys that must be applied before this option (order only).
    #[must_use]
    pub fn with_children(mut self, keys: &[&str]) -> Self {
        self.children = keys.iter().map(|&key| key.to_owned()).collect();
        self
    }

    /// Keys that must be applied before this option and whose change forces
    /// this option to be re-applied.
    #[must_use]
    pub fn with_dependencies(mut self, keys: &[&str]) -> Self {
        self.dependencies = keys.iter().map(|&key| key.to_owned()).collect();
        self
    }

    /// Keys whose change suppresses this option's update in the same batch.
    #[must_use]
    pub fn with_parents(mut self, keys: &[&str]) -> Self {
        self.parents = keys.iter().map(|&key| key.to_owned()).collect();
        self
    }

    /// Reference-only relations; never influence scheduling.
    #[must_use]
    pub fn with_connections(mut self, keys: &[&str]) -> Self {
        self.connections = keys.iter().map(|&key| key.to_owned()).collect();
        self
    }

    /// Marks this option as requiring a full replot whenever it is applied,
    /// regardless of its stage.
    #[must_use]
    pub fn with_triggers_replot(mut self) -> Self {
        self.triggers_replot = true;
        self
    }

    /// Marks this option for re-application whenever a data-stage option
    /// changes.
    #[must_use]
    pub fn with_data_dependent(mut self) -> Self {
        self.data_dependent = true;
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn stage(&self) -> UpdateStage {
        self.stage
    }

    #[must_use]
    pub const fn default_value(&self) -> &OptionValue {
        &self.default
    }

    #[must_use]
    pub const fn validator(&self) -> &Validator {
        &self.validator
    }

    #[must_use]
    pub const fn triggers_replot(&self) -> bool {
        self.triggers_replot
    }

    #[must_use]
    pub const fn data_dependent(&self) -> bool {
        self.data_dependent
    }

    #[must_use]
    pub fn children(&self) -> &[String] {
        &self.children
    }

    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    #[must_use]
    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    #[must_use]
    pub fn connections(&self) -> &[String] {
        &self.connections
    }
}

#[derive(Debug, Clone)]
struct ResolvedSpec {
    spec: OptionSpec,
    children: IndexList,
    dependencies: IndexList,
    parents: IndexList,
    /// Transitive closure over `dependencies`, used for forced re-application.
    deep_dependencies: IndexList,
    /// Options listing this one among their children or dependencies.
    dependents: IndexList,
}

/// Builder collecting [`OptionSpec`] declarations for one visualization type.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    specs: Vec<OptionSpec>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn option(mut self, spec: OptionSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Validates all declarations and resolves references.
    ///
    /// Fails fast on duplicate keys, references to unknown keys, defaults
    /// rejected by their own validator, children/dependencies in a later
    /// stage, and cycles in the children/dependencies graph.
    pub fn build(self) -> PlotResult<PlotterSchema> {
        PlotterSchema::from_specs(self.specs)
    }
}

/// Immutable, validated registry of the formatoptions of one visualization
/// type. Built once per plot method, shared by every plotter instance.
#[derive(Debug)]
pub struct PlotterSchema {
    index: IndexMap<String, usize>,
    resolved: Vec<ResolvedSpec>,
}

impl PlotterSchema {
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    fn from_specs(specs: Vec<OptionSpec>) -> PlotResult<Self> {
        let mut index: IndexMap<String, usize> = IndexMap::with_capacity(specs.len());
        for (position, spec) in specs.iter().enumerate() {
            if index.insert(spec.key.clone(), position).is_some() {
                return Err(PlotError::DuplicateOption {
                    key: spec.key.clone(),
                });
            }
        }

        let resolve = |owner: &OptionSpec, keys: &[String], relation: &'static str| {
            keys.iter()
                .map(|key| {
                    index
                        .get(key)
                        .copied()
                        .ok_or_else(|| PlotError::UnknownReference {
                            key: owner.key.clone(),
                            referenced: key.clone(),
                            relation,
                        })
                })
                .collect::<PlotResult<IndexList>>()
        };

        let mut resolved = Vec::with_capacity(specs.len());
        for spec in &specs {
            if let Err(expected) = spec.validator.check(&spec.validator.normalize(&spec.default)) {
                return Err(PlotError::InvalidValue {
                    key: spec.key.clone(),
                    expected,
                    got: spec.default.to_string(),
                });
            }
            let children = resolve(spec, &spec.children, "children")?;
            let dependencies = resolve(spec, &spec.dependencies, "dependencies")?;
            let parents = resolve(spec, &spec.parents, "parents")?;
            resolve(spec, &spec.connections, "connections")?;

            for &before in children.iter().chain(&dependencies) {
                let before_spec = &specs[before];
                if before_spec.stage > spec.stage {
                    return Err(PlotError::StageConflict {
                        key: spec.key.clone(),
                        stage: spec.stage,
                        child: before_spec.key.clone(),
                        child_stage: before_spec.stage,
                    });
                }
            }

            resolved.push(ResolvedSpec {
                spec: spec.clone(),
                children,
                dependencies,
                parents,
                deep_dependencies: IndexList::new(),
                dependents: IndexList::new(),
            });
        }

        let schema = Self { index, resolved };
        if let Some(cycle) = schema.find_cycle() {
            return Err(PlotError::CyclicDependency { cycle });
        }
        Ok(schema.with_closures())
    }

    /// Depth-first search over the children/dependencies graph; returns the
    /// key path of the first cycle found.
    fn find_cycle(&self) -> Option<Vec<String>> {
        const WHITE: u8 = 0;
        const GRAY: u8 = 1;
        const BLACK: u8 = 2;

        fn visit(
            schema: &PlotterSchema,
            node: usize,
            color: &mut [u8],
            path: &mut Vec<usize>,
        ) -> Option<Vec<usize>> {
            color[node] = GRAY;
            path.push(node);
            let resolved = &schema.resolved[node];
            for &next in resolved.children.iter().chain(&resolved.dependencies) {
                match color[next] {
                    GRAY => {
                        let start = path.iter().position(|&seen| seen == next)?;
                        let mut cycle = path[start..].to_vec();
                        cycle.push(next);
                        return Some(cycle);
                    }
                    WHITE => {
                        if let Some(cycle) = visit(schema, next, color, path) {
                            return Some(cycle);
                        }
                    }
                    _ => {}
                }
            }
            path.pop();
            color[node] = BLACK;
            None
        }

        let mut color = vec![WHITE; self.resolved.len()];
        let mut path = Vec::new();
        for node in 0..self.resolved.len() {
            if color[node] == WHITE
                && let Some(cycle) = visit(self, node, &mut color, &mut path)
            {
                return Some(
                    cycle
                        .into_iter()
                        .map(|idx| self.resolved[idx].spec.key.clone())
                        .collect(),
                );
            }
        }
        None
    }

    fn with_closures(mut self) -> Self {
        let len = self.resolved.len();
        for idx in 0..len {
            let mut deep = IndexList::new();
            let mut stack: Vec<usize> = self.resolved[idx].dependencies.to_vec();
            while let Some(dep) = stack.pop() {
                if deep.contains(&dep) {
                    continue;
                }
                deep.push(dep);
                stack.extend(self.resolved[dep].dependencies.iter().copied());
            }
            self.resolved[idx].deep_dependencies = deep;
        }
        for idx in 0..len {
            let before: IndexList = self.resolved[idx]
                .children
                .iter()
                .chain(&self.resolved[idx].dependencies)
                .copied()
                .collect();
            for target in before {
                if !self.resolved[target].dependents.contains(&idx) {
                    self.resolved[target].dependents.push(idx);
                }
            }
        }
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    #[must_use]
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    #[must_use]
    pub fn key_at(&self, idx: usize) -> &str {
        &self.resolved[idx].spec.key
    }

    #[must_use]
    pub fn spec(&self, key: &str) -> Option<&OptionSpec> {
        self.index_of(key).map(|idx| &self.resolved[idx].spec)
    }

    #[must_use]
    pub fn spec_at(&self, idx: usize) -> &OptionSpec {
        &self.resolved[idx].spec
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.resolved.iter().map(|resolved| resolved.spec.key())
    }

    pub fn specs(&self) -> impl Iterator<Item = &OptionSpec> {
        self.resolved.iter().map(|resolved| &resolved.spec)
    }

    /// Default values in declaration order, normalized by each validator.
    #[must_use]
    pub fn default_values(&self) -> IndexMap<String, OptionValue> {
        self.resolved
            .iter()
            .map(|resolved| {
                (
                    resolved.spec.key.clone(),
                    resolved.spec.validator.normalize(&resolved.spec.default),
                )
            })
            .collect()
    }

    pub(crate) fn children_of(&self, idx: usize) -> &[usize] {
        &self.resolved[idx].children
    }

    pub(crate) fn dependencies_of(&self, idx: usize) -> &[usize] {
        &self.resolved[idx].dependencies
    }

    pub(crate) fn parents_of(&self, idx: usize) -> &[usize] {
        &self.resolved[idx].parents
    }

    pub(crate) fn deep_dependencies_of(&self, idx: usize) -> &[usize] {
        &self.resolved[idx].deep_dependencies
    }

    pub(crate) fn dependents_of(&self, idx: usize) -> &[usize] {
        &self.resolved[idx].dependents
    }
}
