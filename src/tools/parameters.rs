/*
This code is part of the GP Tools geoprocessing runtime.
Authors: GP Tools developers
Created: 29/09/2026
Last Modified: 14/10/2026
License: MIT
*/

use super::coded_values::CodedValueMap;
use super::errors::DescriptorError;
use super::values::ParamValue;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterRole {
    /// Must be supplied before execution.
    Required,
    /// May be omitted; the engine applies its own default.
    Optional,
    /// Output only; populated after a successful execution.
    Derived,
}

impl fmt::Display for ParameterRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParameterRole::Required => write!(f, "required"),
            ParameterRole::Optional => write!(f, "optional"),
            ParameterRole::Derived => write!(f, "derived"),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Boolean,
    Long,
    Double,
    Date,
    EncryptedString,
}

/// The geoprocessing data type of a parameter.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum GpType {
    Scalar(ScalarType),
    LinearUnit,
    SpatialReference,
    Extent,
    FeatureLayer,
    Table,
    Field,
    File,
    Folder,
    /// Accepts a value of any of the member types.
    Composite(Vec<GpType>),
    /// Rows of fixed arity; one type per column.
    ValueTable(Vec<GpType>),
    MultiValue(Box<GpType>),
}

impl GpType {
    pub fn string() -> GpType {
        GpType::Scalar(ScalarType::String)
    }

    pub fn boolean() -> GpType {
        GpType::Scalar(ScalarType::Boolean)
    }

    pub fn long() -> GpType {
        GpType::Scalar(ScalarType::Long)
    }

    pub fn double() -> GpType {
        GpType::Scalar(ScalarType::Double)
    }

    pub fn multi_value(inner: GpType) -> GpType {
        GpType::MultiValue(Box::new(inner))
    }

    /// The element type for multivalues, the type itself otherwise.
    pub fn element(&self) -> &GpType {
        match self {
            GpType::MultiValue(inner) => inner.element(),
            other => other,
        }
    }

    /// Whether a raw engine value can be decoded into this type.
    pub fn is_decodable(&self) -> bool {
        match self {
            GpType::Composite(_) => false,
            GpType::MultiValue(inner) => inner.is_decodable(),
            GpType::ValueTable(columns) => columns.iter().all(|c| c.is_decodable()),
            _ => true,
        }
    }

    fn accepts_coded_values(&self) -> bool {
        matches!(
            self.element(),
            GpType::Scalar(ScalarType::String)
                | GpType::Scalar(ScalarType::Boolean)
                | GpType::Scalar(ScalarType::Long)
        )
    }

    fn accepts_range(&self) -> bool {
        matches!(
            self.element(),
            GpType::Scalar(ScalarType::Long) | GpType::Scalar(ScalarType::Double) | GpType::LinearUnit
        )
    }
}

impl fmt::Display for GpType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GpType::Scalar(s) => write!(f, "{:?}", s),
            GpType::Composite(members) => {
                let names: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                write!(f, "Composite({})", names.join(" | "))
            }
            GpType::ValueTable(columns) => {
                let names: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
                write!(f, "ValueTable({})", names.join(", "))
            }
            GpType::MultiValue(inner) => write!(f, "MultiValue({})", inner),
            other => write!(f, "{:?}", other),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    Short,
    Long,
    Float,
    Double,
    Text,
    Date,
    ObjectId,
    Guid,
    GlobalId,
    Blob,
    Raster,
    Geometry,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorGeometryType {
    Point,
    Multipoint,
    Polyline,
    Polygon,
    Multipatch,
}

/// Inclusive numeric bounds. Either side may be open.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumericRange {
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |m| value >= m) && self.max.map_or(true, |m| value <= m)
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.min, self.max) {
            (Some(lo), Some(hi)) => write!(f, "[{}, {}]", lo, hi),
            (Some(lo), None) => write!(f, ">= {}", lo),
            (None, Some(hi)) => write!(f, "<= {}", hi),
            (None, None) => write!(f, "any value"),
        }
    }
}

/// Domain constraints of a parameter. Field, geometry and file filters
/// describe the data the engine will accept; only file extensions and
/// coded values/ranges can be checked without opening the data.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct ParameterDomain {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coded_values: Option<Arc<CodedValueMap>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<NumericRange>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_types: Vec<AttributeType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub geometry_types: Vec<VectorGeometryType>,
}

impl ParameterDomain {
    /// Checks a file path against the allowed extensions (case-insensitive).
    pub fn accepts_file(&self, path: &str) -> bool {
        if self.file_types.is_empty() {
            return true;
        }
        let ext = std::path::Path::new(path.trim())
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        self.file_types.iter().any(|ft| ft.eq_ignore_ascii_case(ext))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub role: ParameterRole,
    pub data_type: GpType,
    pub domain: ParameterDomain,
    pub default_value: Option<String>,
}

impl ParameterDescriptor {
    pub fn new(name: &str, role: ParameterRole, data_type: GpType) -> ParameterDescriptor {
        ParameterDescriptor {
            name: name.to_string(),
            display_name: name.to_string(),
            description: String::new(),
            role,
            data_type,
            domain: ParameterDomain::default(),
            default_value: None,
        }
    }

    pub fn required(name: &str, data_type: GpType) -> ParameterDescriptor {
        ParameterDescriptor::new(name, ParameterRole::Required, data_type)
    }

    pub fn optional(name: &str, data_type: GpType) -> ParameterDescriptor {
        ParameterDescriptor::new(name, ParameterRole::Optional, data_type)
    }

    pub fn derived(name: &str, data_type: GpType) -> ParameterDescriptor {
        ParameterDescriptor::new(name, ParameterRole::Derived, data_type)
    }

    pub fn display_name(mut self, display_name: &str) -> ParameterDescriptor {
        self.display_name = display_name.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> ParameterDescriptor {
        self.description = description.to_string();
        self
    }

    pub fn coded_values(mut self, map: Arc<CodedValueMap>) -> ParameterDescriptor {
        self.domain.coded_values = Some(map);
        self
    }

    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> ParameterDescriptor {
        self.domain.range = Some(NumericRange { min, max });
        self
    }

    pub fn field_types(mut self, field_types: &[AttributeType]) -> ParameterDescriptor {
        self.domain.field_types = field_types.to_vec();
        self
    }

    pub fn file_types(mut self, extensions: &[&str]) -> ParameterDescriptor {
        self.domain.file_types = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn geometry_types(mut self, geometry_types: &[VectorGeometryType]) -> ParameterDescriptor {
        self.domain.geometry_types = geometry_types.to_vec();
        self
    }

    pub fn default_value(mut self, literal: &str) -> ParameterDescriptor {
        self.default_value = Some(literal.to_string());
        self
    }

    /// Command-line flag for this parameter, e.g. `--in_base_features`.
    pub fn flag(&self) -> String {
        format!("--{}", self.name)
    }

    fn invalid_domain(&self, reason: &str) -> DescriptorError {
        DescriptorError::InvalidDomain {
            parameter: self.name.clone(),
            reason: reason.to_string(),
        }
    }

    /// Construction-time checks for a single parameter.
    fn validate(&self) -> Result<(), DescriptorError> {
        if self.role == ParameterRole::Derived
            && !self.data_type.is_decodable()
            && self.default_value.is_none()
        {
            return Err(DescriptorError::IncompatibleRole {
                parameter: self.name.clone(),
                role: self.role.to_string(),
                reason: format!("values of type {} cannot be decoded and no default is given", self.data_type),
            });
        }

        if let Some(map) = &self.domain.coded_values {
            if !self.data_type.accepts_coded_values() {
                return Err(self.invalid_domain(&format!(
                    "coded values are not supported on {}",
                    self.data_type
                )));
            }
            if *self.data_type.element() == GpType::boolean() && !map.is_boolean() {
                return Err(self.invalid_domain("boolean coded values need exactly the tokens 'true' and 'false'"));
            }
            if *self.data_type.element() == GpType::long()
                && map.entries().iter().any(|e| e.token.parse::<i64>().is_err())
            {
                return Err(self.invalid_domain("long coded values need integer tokens"));
            }
        }

        if let Some(range) = &self.domain.range {
            if !self.data_type.accepts_range() {
                return Err(self.invalid_domain(&format!("ranges are not supported on {}", self.data_type)));
            }
            if let (Some(lo), Some(hi)) = (range.min, range.max) {
                if lo > hi {
                    return Err(self.invalid_domain("range minimum exceeds its maximum"));
                }
            }
        }

        if !self.domain.file_types.is_empty() && *self.data_type.element() != GpType::File {
            return Err(self.invalid_domain("file type filters only apply to files"));
        }
        if !self.domain.geometry_types.is_empty() && *self.data_type.element() != GpType::FeatureLayer {
            return Err(self.invalid_domain("geometry type filters only apply to feature layers"));
        }
        if !self.domain.field_types.is_empty() && *self.data_type.element() != GpType::Field {
            return Err(self.invalid_domain("field type filters only apply to fields"));
        }

        if let Some(literal) = &self.default_value {
            ParamValue::parse_literal(self, literal).map_err(|e| DescriptorError::InvalidDefault {
                parameter: self.name.clone(),
                value: literal.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}

/// Immutable metadata for one tool. Built once and shared across every
/// invocation of that tool.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    name: String,
    display_name: String,
    description: String,
    toolbox_name: String,
    toolbox_alias: String,
    parameters: Vec<ParameterDescriptor>,
    environments: BTreeSet<String>,
}

impl ToolDescriptor {
    pub fn builder(name: &str, toolbox_alias: &str) -> ToolDescriptorBuilder {
        ToolDescriptorBuilder {
            descriptor: ToolDescriptor {
                name: name.to_string(),
                display_name: name.to_string(),
                description: String::new(),
                toolbox_name: toolbox_alias.to_string(),
                toolbox_alias: toolbox_alias.to_string(),
                parameters: vec![],
                environments: BTreeSet::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn toolbox_name(&self) -> &str {
        &self.toolbox_name
    }

    pub fn toolbox_alias(&self) -> &str {
        &self.toolbox_alias
    }

    /// Qualified execution name, `toolboxAlias.toolName`.
    pub fn execute_name(&self) -> String {
        format!("{}.{}", self.toolbox_alias, self.name)
    }

    /// Parameters in declaration order. The engine is positional.
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn environments(&self) -> &BTreeSet<String> {
        &self.environments
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.parameters
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.position(name).map(|i| &self.parameters[i])
    }

    pub fn resolve_type(&self, name: &str) -> Option<&GpType> {
        self.parameter(name).map(|p| &p.data_type)
    }
}

pub struct ToolDescriptorBuilder {
    descriptor: ToolDescriptor,
}

impl ToolDescriptorBuilder {
    pub fn display_name(mut self, display_name: &str) -> ToolDescriptorBuilder {
        self.descriptor.display_name = display_name.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> ToolDescriptorBuilder {
        self.descriptor.description = description.to_string();
        self
    }

    pub fn toolbox_name(mut self, toolbox_name: &str) -> ToolDescriptorBuilder {
        self.descriptor.toolbox_name = toolbox_name.to_string();
        self
    }

    pub fn environments(mut self, keys: &[&str]) -> ToolDescriptorBuilder {
        self.descriptor
            .environments
            .extend(keys.iter().map(|k| k.to_string()));
        self
    }

    /// Appends a parameter, rejecting duplicates and role/type/domain
    /// combinations the runtime cannot honour.
    pub fn register_parameter(
        mut self,
        parameter: ParameterDescriptor,
    ) -> Result<ToolDescriptorBuilder, DescriptorError> {
        if self.descriptor.position(&parameter.name).is_some() {
            return Err(DescriptorError::DuplicateParameter {
                parameter: parameter.name,
            });
        }
        parameter.validate()?;
        self.descriptor.parameters.push(parameter);
        Ok(self)
    }

    pub fn build(self) -> ToolDescriptor {
        self.descriptor
    }
}
