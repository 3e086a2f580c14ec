/*
This tool is part of the GP Tools geoprocessing runtime.
Authors: GP Tools developers
Created: 07/10/2026
Last Modified: 12/10/2026
License: MIT
*/

use super::{TOOLBOX_ALIAS, TOOLBOX_NAME};
use crate::tools::coded_values::CodedEnum;
use crate::tools::errors::{DescriptorError, ProcessError};
use crate::tools::parameters::{GpType, ParameterDescriptor, ToolDescriptor};
use crate::tools::values::ParamValue;
use crate::tools::{GeoprocessingTool, ToolInstance};
use std::sync::{Arc, OnceLock};

crate::coded_enum! {
    pub enum DegreeOfFreedom {
        Free => ("FREE", "FREE", "Nodes move freely"),
        Medium => ("MEDIUM", "MEDIUM", "Nodes move within a medium radius"),
        Low => ("LOW", "LOW", "Nodes stay near their current position"),
    }
}

crate::coded_enum! {
    pub enum RunAsync {
        Asynchronously => ("RUN_ASYNCHRONOUSLY", "true", "Run the layout on the server asynchronously"),
        Synchronously => ("RUN_SYNCHRONOUSLY", "false", "Run the layout synchronously"),
    }
}

/// Applies the Force Directed layout algorithm to a network diagram. The
/// algorithm itself runs in the engine; this wrapper only describes its
/// configuration.
pub struct ApplyForceDirectedLayout {
    instance: ToolInstance,
}

fn build_descriptor() -> Result<ToolDescriptor, DescriptorError> {
    let builder = ToolDescriptor::builder("ApplyForceDirectedLayout", TOOLBOX_ALIAS)
        .display_name("Apply Force Directed Layout")
        .description("Applies the Force Directed layout algorithm to the network diagram.")
        .toolbox_name(TOOLBOX_NAME)
        .register_parameter(
            ParameterDescriptor::required("in_network_diagram_layer", GpType::FeatureLayer)
                .display_name("Input Network Diagram Layer"),
        )?
        .register_parameter(
            ParameterDescriptor::optional("repel_factor", GpType::long())
                .display_name("Repel Factor")
                .description("Intensity of the repulsion between nodes.")
                .range(Some(1.0), Some(9.0))
                .default_value("1"),
        )?
        .register_parameter(
            ParameterDescriptor::optional("degree_freedom", GpType::string())
                .display_name("Degree of Freedom")
                .coded_values(Arc::new(DegreeOfFreedom::coded_value_map()?))
                .default_value("MEDIUM"),
        )?
        .register_parameter(
            ParameterDescriptor::optional("number_iterations", GpType::long())
                .display_name("Number of Iterations")
                .range(Some(1.0), None)
                .default_value("20"),
        )?
        .register_parameter(
            ParameterDescriptor::optional("run_async", GpType::boolean())
                .display_name("Run in asynchronous mode on the server")
                .coded_values(Arc::new(RunAsync::coded_value_map()?))
                .default_value("RUN_SYNCHRONOUSLY"),
        )?
        .register_parameter(
            ParameterDescriptor::derived("out_network_diagram_layer", GpType::FeatureLayer)
                .display_name("Output Network Diagram Layer"),
        )?;
    Ok(builder.build())
}

impl ApplyForceDirectedLayout {
    pub fn tool_descriptor() -> Result<Arc<ToolDescriptor>, DescriptorError> {
        static DESCRIPTOR: OnceLock<Result<Arc<ToolDescriptor>, DescriptorError>> = OnceLock::new();
        DESCRIPTOR
            .get_or_init(|| build_descriptor().map(Arc::new))
            .clone()
    }

    pub fn new() -> Result<ApplyForceDirectedLayout, DescriptorError> {
        Ok(ApplyForceDirectedLayout {
            instance: ToolInstance::new(ApplyForceDirectedLayout::tool_descriptor()?),
        })
    }

    pub fn set_in_network_diagram_layer(&mut self, layer: &str) -> Result<&mut ApplyForceDirectedLayout, ProcessError> {
        self.instance.set("in_network_diagram_layer", ParamValue::text(layer))?;
        Ok(self)
    }

    pub fn set_repel_factor(&mut self, factor: i64) -> Result<&mut ApplyForceDirectedLayout, ProcessError> {
        self.instance.set("repel_factor", ParamValue::Long(factor))?;
        Ok(self)
    }

    pub fn set_degree_freedom(&mut self, degree: DegreeOfFreedom) -> Result<&mut ApplyForceDirectedLayout, ProcessError> {
        self.instance.set_member("degree_freedom", degree)?;
        Ok(self)
    }

    pub fn set_number_iterations(&mut self, iterations: i64) -> Result<&mut ApplyForceDirectedLayout, ProcessError> {
        self.instance.set("number_iterations", ParamValue::Long(iterations))?;
        Ok(self)
    }

    pub fn set_run_async(&mut self, run_async: RunAsync) -> Result<&mut ApplyForceDirectedLayout, ProcessError> {
        self.instance.set_member("run_async", run_async)?;
        Ok(self)
    }

    pub fn out_network_diagram_layer(&self) -> Option<&str> {
        self.instance.text("out_network_diagram_layer")
    }
}

impl GeoprocessingTool for ApplyForceDirectedLayout {
    fn instance(&self) -> &ToolInstance {
        &self.instance
    }

    fn instance_mut(&mut self) -> &mut ToolInstance {
        &mut self.instance
    }
}
