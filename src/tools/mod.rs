pub mod coded_values;
pub mod data_management;
pub mod environments;
pub mod errors;
pub mod invocation;
pub mod network_diagram;
pub mod parameters;
pub mod process;
pub mod results;
pub mod values;

pub use self::coded_values::{CodedEnum, CodedValue, CodedValueMap};
pub use self::environments::{EnvironmentSettings, FilteredEnvironment};
pub use self::errors::{CodecError, DescriptorError, ExecutorError, ProcessError};
pub use self::invocation::{InvocationRequest, WireValue};
pub use self::parameters::{
    AttributeType, GpType, ParameterDescriptor, ParameterRole, ScalarType, ToolDescriptor,
    VectorGeometryType,
};
pub use self::process::{ExecutionReport, Executor, InvocationState, ProcessRuntime};
pub use self::results::{DecodeWarning, ExecutionStatus, InvocationResult};
pub use self::values::{Extent, LinearUnit, LinearUnitKind, ParamValue, ParameterValue, ParameterValues};

use gp_common::utils::wrapped_text;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A tool's shared descriptor together with the values one caller has
/// assigned to it. Configure it, then hand it to `ProcessRuntime::execute`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInstance {
    descriptor: Arc<ToolDescriptor>,
    values: ParameterValues,
}

impl ToolInstance {
    pub fn new(descriptor: Arc<ToolDescriptor>) -> ToolInstance {
        let values = ParameterValues::for_parameters(descriptor.parameters());
        ToolInstance { descriptor, values }
    }

    pub fn descriptor(&self) -> &Arc<ToolDescriptor> {
        &self.descriptor
    }

    pub fn values(&self) -> &ParameterValues {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut ParameterValues {
        &mut self.values
    }

    fn input_position(&self, name: &str) -> Result<usize, ProcessError> {
        let position = self
            .descriptor
            .position(name)
            .ok_or_else(|| ProcessError::UnknownParameter {
                tool: self.descriptor.name().to_string(),
                parameter: name.to_string(),
            })?;
        if self.descriptor.parameters()[position].role == ParameterRole::Derived {
            return Err(ProcessError::ReadOnlyParameter {
                parameter: self.descriptor.parameters()[position].name.clone(),
            });
        }
        Ok(position)
    }

    /// Assigns an input parameter. Derived parameters are read-only.
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<&mut ToolInstance, ProcessError> {
        let position = self.input_position(name)?;
        self.values.put(position, ParameterValue::Present(value));
        Ok(self)
    }

    /// Parses `literal` by the parameter's type and domain, then assigns it.
    pub fn set_literal(&mut self, name: &str, literal: &str) -> Result<&mut ToolInstance, ProcessError> {
        let position = self.input_position(name)?;
        let value = ParamValue::parse_literal(&self.descriptor.parameters()[position], literal)?;
        self.values.put(position, ParameterValue::Present(value));
        Ok(self)
    }

    pub fn set_member<E: CodedEnum>(&mut self, name: &str, member: E) -> Result<&mut ToolInstance, ProcessError> {
        self.set(name, ParamValue::Member(member.member().to_string()))
    }

    /// Returns an input parameter to its unset state.
    pub fn clear(&mut self, name: &str) -> Result<&mut ToolInstance, ProcessError> {
        let position = self.input_position(name)?;
        self.values.put(position, ParameterValue::Absent);
        Ok(self)
    }

    pub fn slot(&self, name: &str) -> Option<&ParameterValue> {
        self.descriptor.position(name).and_then(|i| self.values.get(i))
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.slot(name).and_then(|s| s.value())
    }

    pub fn member<E: CodedEnum>(&self, name: &str) -> Option<E> {
        match self.get(name) {
            Some(ParamValue::Member(m)) => E::from_member(m),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(ParamValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(ParamValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn long(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(ParamValue::Long(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn double(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(ParamValue::Double(d)) => Some(*d),
            Some(ParamValue::Long(n)) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn linear_unit(&self, name: &str) -> Option<LinearUnit> {
        match self.get(name) {
            Some(ParamValue::LinearUnit(lu)) => Some(*lu),
            _ => None,
        }
    }
}

/// Common surface of every tool wrapper.
pub trait GeoprocessingTool {
    fn instance(&self) -> &ToolInstance;

    fn instance_mut(&mut self) -> &mut ToolInstance;

    fn descriptor(&self) -> &ToolDescriptor {
        self.instance().descriptor()
    }

    fn tool_name(&self) -> &str {
        self.descriptor().name()
    }

    fn execute_name(&self) -> String {
        self.descriptor().execute_name()
    }

    fn toolbox_alias(&self) -> &str {
        self.descriptor().toolbox_alias()
    }

    fn toolbox_name(&self) -> &str {
        self.descriptor().toolbox_name()
    }

    fn description(&self) -> &str {
        self.descriptor().description()
    }

    fn valid_environments(&self) -> Vec<&str> {
        self.descriptor().environments().iter().map(|e| e.as_str()).collect()
    }

    /// Current values in declaration order.
    fn parameters(&self) -> &[ParameterValue] {
        self.instance().values().as_slice()
    }
}

impl GeoprocessingTool for ToolInstance {
    fn instance(&self) -> &ToolInstance {
        self
    }

    fn instance_mut(&mut self) -> &mut ToolInstance {
        self
    }
}

#[derive(Serialize)]
struct ToolParameter<'a> {
    name: &'a str,
    flags: Vec<String>,
    description: &'a str,
    parameter_type: &'a GpType,
    role: ParameterRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    coded_values: Option<&'a CodedValueMap>,
    default_value: &'a Option<String>,
    optional: bool,
}

/// Registry of tool descriptors, filled once at start-up and read-only
/// afterwards. Lookups accept the tool name or its qualified execute name,
/// ignoring case.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<ToolDescriptor>>,
}

impl ToolRegistry {
    pub fn new() -> ToolRegistry {
        ToolRegistry::default()
    }

    /// A registry holding every built-in tool wrapper.
    pub fn with_builtin_tools() -> Result<ToolRegistry, DescriptorError> {
        let mut registry = ToolRegistry::new();
        registry.register(data_management::FeatureCompare::tool_descriptor()?)?;
        registry.register(data_management::TableCompare::tool_descriptor()?)?;
        registry.register(data_management::PackageLayer::tool_descriptor()?)?;
        registry.register(network_diagram::ApplyForceDirectedLayout::tool_descriptor()?)?;
        Ok(registry)
    }

    pub fn register(&mut self, descriptor: Arc<ToolDescriptor>) -> Result<(), DescriptorError> {
        let key = descriptor.execute_name().to_lowercase();
        if self.tools.contains_key(&key) {
            return Err(DescriptorError::DuplicateTool {
                tool: descriptor.execute_name(),
            });
        }
        self.tools.insert(key, descriptor);
        Ok(())
    }

    pub fn get(&self, tool_name: &str) -> Option<&Arc<ToolDescriptor>> {
        let key = tool_name.trim().to_lowercase();
        self.tools.get(&key).or_else(|| {
            self.tools
                .values()
                .find(|d| d.name().eq_ignore_ascii_case(tool_name.trim()))
        })
    }

    fn get_or_err(&self, tool_name: &str) -> Result<&Arc<ToolDescriptor>, ProcessError> {
        self.get(tool_name)
            .ok_or_else(|| ProcessError::UnknownTool(tool_name.to_string()))
    }

    /// A fresh, unconfigured instance of the named tool.
    pub fn create(&self, tool_name: &str) -> Result<ToolInstance, ProcessError> {
        Ok(ToolInstance::new(self.get_or_err(tool_name)?.clone()))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// `(name, description)` pairs sorted by tool name.
    pub fn list_tools(&self) -> Vec<(String, String)> {
        let mut ret: Vec<(String, String)> = self
            .tools
            .values()
            .map(|d| (d.name().to_string(), d.description().to_string()))
            .collect();
        ret.sort();
        ret
    }

    /// Tools whose name, description or toolbox contains any of the keywords.
    pub fn list_tools_with_keywords(&self, keywords: &[String]) -> Vec<(String, String)> {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        let mut ret: Vec<(String, String)> = self
            .tools
            .values()
            .filter(|d| {
                let haystacks = [
                    d.name().to_lowercase(),
                    d.description().to_lowercase(),
                    d.toolbox_name().to_lowercase(),
                ];
                keywords.iter().any(|kw| haystacks.iter().any(|h| h.contains(kw)))
            })
            .map(|d| (d.name().to_string(), d.description().to_string()))
            .collect();
        ret.sort();
        ret
    }

    /// The parameter table of a tool as JSON, `{"parameters": [...]}`.
    pub fn tool_parameters(&self, tool_name: &str) -> Result<String, ProcessError> {
        let descriptor = self.get_or_err(tool_name)?;
        let parameters: Vec<ToolParameter> = descriptor
            .parameters()
            .iter()
            .map(|p| ToolParameter {
                name: &p.display_name,
                flags: vec![p.flag()],
                description: &p.description,
                parameter_type: &p.data_type,
                role: p.role,
                coded_values: p.domain.coded_values.as_deref(),
                default_value: &p.default_value,
                optional: p.role != ParameterRole::Required,
            })
            .collect();
        let ret = serde_json::json!({ "parameters": parameters });
        Ok(ret.to_string())
    }

    pub fn tool_help(&self, tool_name: &str) -> Result<String, ProcessError> {
        let d = self.get_or_err(tool_name)?;
        let mut p = String::new();
        p.push_str("Flag                         Description\n");
        p.push_str("---------------------------  -----------\n");
        for param in d.parameters() {
            let mut description = param.description.clone();
            if param.role == ParameterRole::Derived {
                description = format!("(output) {}", description);
            }
            if let Some(map) = &param.domain.coded_values {
                let members: Vec<&str> = map.members().collect();
                description.push_str(&format!(" Options: {}.", members.join(", ")));
            }
            if let Some(default) = &param.default_value {
                description.push_str(&format!(" Default: {}.", default));
            }
            let wrapped = wrapped_text(description.trim(), 50);
            let mut lines = wrapped.lines();
            p.push_str(&format!("{:28} {}\n", param.flag(), lines.next().unwrap_or("")));
            for line in lines {
                p.push_str(&format!("{:28} {}\n", "", line));
            }
        }
        let environments: Vec<&str> = d.environments().iter().map(|e| e.as_str()).collect();
        let environments = if environments.is_empty() {
            "none".to_string()
        } else {
            environments.join(", ")
        };
        Ok(format!(
            "{}\n\nDescription:\n{}\nToolbox: {} ({})\nExecute name: {}\nEnvironments: {}\nParameters:\n\n{}",
            d.display_name(),
            wrapped_text(d.description(), 80),
            d.toolbox_name(),
            d.toolbox_alias(),
            d.execute_name(),
            environments,
            p
        ))
    }

    pub fn toolbox(&self, tool_name: &str) -> Result<String, ProcessError> {
        Ok(self.get_or_err(tool_name)?.toolbox_name().to_string())
    }

    /// `(tool, toolbox)` pairs for every registered tool.
    pub fn toolboxes(&self) -> Vec<(String, String)> {
        let mut ret: Vec<(String, String)> = self
            .tools
            .values()
            .map(|d| (d.name().to_string(), d.toolbox_name().to_string()))
            .collect();
        ret.sort();
        ret
    }
}
