//! # Schema Registry
//!
//! Holds published model schemas and named casters, and turns
//! [`SchemaDocument`]s into schemas.
//!
//! ## Type Resolution
//!
//! A named type resolves, in order, to a built-in caster (`string`/`str`,
//! `integer`/`int`, `float`, `boolean`/`bool`, `any`, `date`, `datetime`),
//! a caster registered with [`SchemaRegistry::register_caster`], or a
//! model registered earlier (including earlier in the same document).
//!
//! ## Atomic Loading
//!
//! A document is loaded into a staged copy of the registry, which replaces
//! the live one only if every model of the document was declared. A failed
//! load leaves the registry untouched.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use smodel_core::{AttributeDescriptor, Caster, Instance, InputMap, ModelSchema, Value};
use tracing::{debug, info};

use crate::document::{AttributeDocument, ModelDocument, SchemaDocument, TypeSpec};
use crate::error::RegistryError;
use crate::input;

const BUILTIN_TYPES: &[&str] = &[
    "string", "str", "integer", "int", "float", "boolean", "bool", "any", "date", "datetime",
];

/// Named model schemas and casters.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    models: BTreeMap<String, Arc<ModelSchema>>,
    casters: BTreeMap<String, Caster>,
}

impl SchemaRegistry {
    /// Create an empty registry with the built-in casters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema declared in code.
    ///
    /// # Errors
    ///
    /// `DuplicateModel` if the name is taken.
    pub fn register(&mut self, schema: Arc<ModelSchema>) -> Result<(), RegistryError> {
        let name = schema.name().to_string();
        if self.models.contains_key(&name) {
            return Err(RegistryError::DuplicateModel { name });
        }
        debug!(model = %name, "registered model");
        self.models.insert(name, schema);
        Ok(())
    }

    /// Make a caster available to documents under `name`.
    ///
    /// # Errors
    ///
    /// `DuplicateCaster` if the name is taken or is a built-in type name.
    pub fn register_caster(
        &mut self,
        name: impl Into<String>,
        caster: Caster,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if BUILTIN_TYPES.contains(&name.as_str()) || self.casters.contains_key(&name) {
            return Err(RegistryError::DuplicateCaster { name });
        }
        self.casters.insert(name, caster);
        Ok(())
    }

    /// Look up a registered model.
    pub fn get(&self, name: &str) -> Option<&Arc<ModelSchema>> {
        self.models.get(name)
    }

    /// Registered model names, sorted.
    pub fn model_names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns true if no model is registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Resolve a type spec into a caster.
    ///
    /// `model` and `attribute` only label the error.
    ///
    /// # Errors
    ///
    /// `UnknownType` if a name resolves to nothing.
    pub fn resolve_type(
        &self,
        model: &str,
        attribute: &str,
        spec: &TypeSpec,
    ) -> Result<Caster, RegistryError> {
        match spec {
            TypeSpec::Named(name) => match name.as_str() {
                "string" | "str" => Ok(Caster::String),
                "integer" | "int" => Ok(Caster::Integer),
                "float" => Ok(Caster::Float),
                "boolean" | "bool" => Ok(Caster::Boolean),
                "any" => Ok(Caster::Any),
                "date" => Ok(Caster::date(smodel_core::temporal::ISO_DATE)),
                "datetime" => Ok(Caster::datetime()),
                other => self
                    .casters
                    .get(other)
                    .cloned()
                    .or_else(|| self.models.get(other).map(Caster::model))
                    .ok_or_else(|| RegistryError::UnknownType {
                        model: model.to_string(),
                        attribute: attribute.to_string(),
                        type_name: other.to_string(),
                    }),
            },
            TypeSpec::List { list } => Ok(Caster::list(self.resolve_type(model, attribute, list)?)),
            TypeSpec::OneOf { one_of } => Ok(Caster::one_of(one_of.iter().map(Value::from))),
            TypeSpec::Date { date } => Ok(Caster::date(date.clone())),
        }
    }

    /// Build the schema a model document describes, without registering it.
    ///
    /// # Errors
    ///
    /// `UnknownParent`, `UnknownType` or `Declaration`.
    pub fn declare(&self, doc: &ModelDocument) -> Result<ModelSchema, RegistryError> {
        let mut schema = match &doc.extends {
            Some(parent) => {
                let parent_schema =
                    self.models
                        .get(parent)
                        .ok_or_else(|| RegistryError::UnknownParent {
                            model: doc.name.clone(),
                            parent: parent.clone(),
                        })?;
                ModelSchema::extending(doc.name.clone(), parent_schema)
            }
            None => ModelSchema::new(doc.name.clone()),
        };
        if let Some(policy) = doc.policy {
            schema = schema.with_policy(policy);
        }

        for attr in &doc.attributes {
            let descriptor = self.descriptor(&doc.name, attr)?;
            schema
                .declare_attribute(descriptor)
                .map_err(|source| RegistryError::Declaration {
                    model: doc.name.clone(),
                    source,
                })?;
        }
        Ok(schema)
    }

    fn descriptor(
        &self,
        model: &str,
        attr: &AttributeDocument,
    ) -> Result<AttributeDescriptor, RegistryError> {
        let caster = self.resolve_type(model, &attr.name, &attr.type_spec)?;
        let mut builder = AttributeDescriptor::new(attr.name.clone(), caster);
        if let Some(alias) = &attr.alias {
            builder = builder.alias(alias.clone());
        }
        if attr.optional {
            builder = builder.optional();
        }
        if attr.nullable {
            builder = builder.nullable();
        }
        if let Some(default) = &attr.default {
            builder = builder.default(Value::from(default));
        }
        if let Some(mutable) = attr.mutable {
            builder = builder.mutable(mutable);
        }
        if attr.by_reference {
            builder = builder.by_reference();
        }
        if let Some(help) = &attr.help {
            builder = builder.help(help.clone());
        }
        builder.build().map_err(|source| RegistryError::Declaration {
            model: model.to_string(),
            source,
        })
    }

    /// Declare and register every model of `doc`, in order.
    ///
    /// Returns the names of the loaded models.
    ///
    /// # Errors
    ///
    /// The first failing model aborts the load and nothing is registered.
    pub fn load_document(&mut self, doc: &SchemaDocument) -> Result<Vec<String>, RegistryError> {
        let mut staged = self.clone();
        let mut loaded = Vec::with_capacity(doc.models.len());
        for model in &doc.models {
            let schema = staged.declare(model)?;
            staged.register(schema.shared())?;
            loaded.push(model.name.clone());
        }
        *self = staged;
        info!(models = loaded.len(), "loaded schema document");
        Ok(loaded)
    }

    /// Load a YAML schema document.
    ///
    /// # Errors
    ///
    /// `Yaml` for malformed text, otherwise as [`SchemaRegistry::load_document`].
    pub fn load_yaml_str(&mut self, text: &str) -> Result<Vec<String>, RegistryError> {
        let doc: SchemaDocument = serde_yaml::from_str(text)?;
        self.load_document(&doc)
    }

    /// Load a JSON schema document.
    ///
    /// # Errors
    ///
    /// `Json` for malformed text, otherwise as [`SchemaRegistry::load_document`].
    pub fn load_json_str(&mut self, text: &str) -> Result<Vec<String>, RegistryError> {
        let doc: SchemaDocument = serde_json::from_str(text)?;
        self.load_document(&doc)
    }

    /// Load a schema file, choosing the format by extension (`.json` is
    /// JSON, anything else YAML).
    ///
    /// # Errors
    ///
    /// `DocumentLoad` if the file cannot be read or parsed.
    pub fn load_file(&mut self, path: &Path) -> Result<Vec<String>, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|e| RegistryError::DocumentLoad {
            path: path.display().to_string(),
            reason: format!("cannot read file: {e}"),
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let doc: SchemaDocument = match ext {
            "json" => serde_json::from_str(&content).map_err(|e| RegistryError::DocumentLoad {
                path: path.display().to_string(),
                reason: format!("invalid JSON: {e}"),
            })?,
            _ => serde_yaml::from_str(&content).map_err(|e| RegistryError::DocumentLoad {
                path: path.display().to_string(),
                reason: format!("invalid YAML: {e}"),
            })?,
        };

        debug!(path = %path.display(), "loading schema file");
        self.load_document(&doc)
    }

    /// Load every `*.yaml`, `*.yml` and `*.json` file of `dir`, in file-name
    /// order.
    ///
    /// # Errors
    ///
    /// `Io` if the directory cannot be read, otherwise the first file error.
    /// Files loaded before the failing one stay registered.
    pub fn load_dir(&mut self, dir: &Path) -> Result<Vec<String>, RegistryError> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_schema = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e, "yaml" | "yml" | "json"));
            if is_schema && path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        let mut loaded = Vec::new();
        for path in &files {
            loaded.extend(self.load_file(path)?);
        }
        Ok(loaded)
    }

    /// Construct an instance of a registered model.
    ///
    /// # Errors
    ///
    /// `UnknownModel` or `Construction`.
    pub fn construct(&self, model: &str, input: InputMap) -> Result<Instance, RegistryError> {
        let schema = self.models.get(model).ok_or_else(|| RegistryError::UnknownModel {
            name: model.to_string(),
        })?;
        Ok(schema.construct(input)?)
    }

    /// Construct an instance of a registered model from a YAML document.
    ///
    /// # Errors
    ///
    /// `Decode`, `UnknownModel` or `Construction`.
    pub fn construct_yaml(&self, model: &str, text: &str) -> Result<Instance, RegistryError> {
        let input = input::from_yaml_str(text)?;
        self.construct(model, input)
    }
}
