/*
This tool is part of the GP Tools geoprocessing runtime.
Authors: GP Tools developers
Created: 06/10/2026
Last Modified: 13/10/2026
License: MIT
*/

use super::{TOOLBOX_ALIAS, TOOLBOX_NAME};
use crate::tools::coded_values::CodedEnum;
use crate::tools::environments;
use crate::tools::errors::{DescriptorError, ProcessError};
use crate::tools::parameters::{GpType, ParameterDescriptor, ToolDescriptor, VectorGeometryType};
use crate::tools::values::{Extent, ParamValue};
use crate::tools::{GeoprocessingTool, ToolInstance};
use std::sync::{Arc, OnceLock};

crate::coded_enum! {
    pub enum ConvertData {
        Convert => ("CONVERT", "true", "Convert data to a file geodatabase"),
        Preserve => ("PRESERVE", "false", "Preserve the input data format"),
    }
}

crate::coded_enum! {
    pub enum ConvertArcSdeData {
        ConvertArcSde => ("CONVERT_ARCSDE", "true", "Convert enterprise geodatabase data"),
        PreserveArcSde => ("PRESERVE_ARCSDE", "false", "Reference enterprise geodatabase data"),
    }
}

crate::coded_enum! {
    pub enum SchemaOnly {
        SchemaOnly => ("SCHEMA_ONLY", "true", "Only the schema is packaged"),
        All => ("ALL", "false", "All features are packaged"),
    }
}

crate::coded_enum! {
    pub enum PackageVersion {
        Current => ("CURRENT", "CURRENT", "Current version"),
        V21 => ("2.1", "2.1", "Compatible with version 2.1"),
        V22 => ("2.2", "2.2", "Compatible with version 2.2"),
        V23 => ("2.3", "2.3", "Compatible with version 2.3"),
    }
}

/// Packages one or more layers and all referenced data sources into a
/// single compressed layer package (`.lpkx`).
///
/// The package is written to `--output_file`. Data can be converted to a file
/// geodatabase (`CONVERT`) or kept in its input format (`PRESERVE`), and can be
/// clipped to `--extent`. Honours the `workspace`, `scratchWorkspace` and
/// `parallelProcessingFactor` environments.
pub struct PackageLayer {
    instance: ToolInstance,
}

fn build_descriptor() -> Result<ToolDescriptor, DescriptorError> {
    let builder = ToolDescriptor::builder("PackageLayer", TOOLBOX_ALIAS)
        .display_name("Package Layer")
        .description("Packages one or more layers and all referenced data sources into a single compressed file.")
        .toolbox_name(TOOLBOX_NAME)
        .environments(&[
            environments::WORKSPACE,
            environments::SCRATCH_WORKSPACE,
            environments::PARALLEL_PROCESSING_FACTOR,
        ])
        .register_parameter(
            ParameterDescriptor::required("in_layer", GpType::multi_value(GpType::FeatureLayer))
                .display_name("Input Layer")
                .description("Layers to package.")
                .geometry_types(&[
                    VectorGeometryType::Point,
                    VectorGeometryType::Multipoint,
                    VectorGeometryType::Polyline,
                    VectorGeometryType::Polygon,
                    VectorGeometryType::Multipatch,
                ]),
        )?
        .register_parameter(
            ParameterDescriptor::required("output_file", GpType::File)
                .display_name("Output File")
                .description("Layer package to create.")
                .file_types(&["lpkx"]),
        )?
        .register_parameter(
            ParameterDescriptor::optional("convert_data", GpType::boolean())
                .display_name("Convert data to file geodatabase")
                .coded_values(Arc::new(ConvertData::coded_value_map()?))
                .default_value("PRESERVE"),
        )?
        .register_parameter(
            ParameterDescriptor::optional("convert_arcsde_data", GpType::boolean())
                .display_name("Include Enterprise Geodatabase data")
                .coded_values(Arc::new(ConvertArcSdeData::coded_value_map()?))
                .default_value("CONVERT_ARCSDE"),
        )?
        .register_parameter(
            ParameterDescriptor::optional("extent", GpType::Extent)
                .display_name("Extent")
                .description("Area of interest used to clip the packaged data."),
        )?
        .register_parameter(
            ParameterDescriptor::optional("schema_only", GpType::boolean())
                .display_name("Schema only")
                .coded_values(Arc::new(SchemaOnly::coded_value_map()?))
                .default_value("ALL"),
        )?
        .register_parameter(
            ParameterDescriptor::optional("version", GpType::string())
                .display_name("Package version")
                .coded_values(Arc::new(PackageVersion::coded_value_map()?))
                .default_value("CURRENT"),
        )?
        .register_parameter(
            ParameterDescriptor::optional("additional_files", GpType::multi_value(GpType::File))
                .display_name("Additional Files")
                .description("Documents and other files added to the package."),
        )?
        .register_parameter(ParameterDescriptor::optional("summary", GpType::string()).display_name("Summary"))?
        .register_parameter(ParameterDescriptor::optional("tags", GpType::string()).display_name("Tags"))?;
    Ok(builder.build())
}

impl PackageLayer {
    pub fn tool_descriptor() -> Result<Arc<ToolDescriptor>, DescriptorError> {
        static DESCRIPTOR: OnceLock<Result<Arc<ToolDescriptor>, DescriptorError>> = OnceLock::new();
        DESCRIPTOR
            .get_or_init(|| build_descriptor().map(Arc::new))
            .clone()
    }

    pub fn new() -> Result<PackageLayer, DescriptorError> {
        Ok(PackageLayer {
            instance: ToolInstance::new(PackageLayer::tool_descriptor()?),
        })
    }

    pub fn set_in_layer(&mut self, layers: &[&str]) -> Result<&mut PackageLayer, ProcessError> {
        let layers = layers.iter().map(|l| ParamValue::text(l)).collect();
        self.instance.set("in_layer", ParamValue::List(layers))?;
        Ok(self)
    }

    pub fn set_output_file(&mut self, file: &str) -> Result<&mut PackageLayer, ProcessError> {
        self.instance.set("output_file", ParamValue::text(file))?;
        Ok(self)
    }

    pub fn set_convert_data(&mut self, convert: ConvertData) -> Result<&mut PackageLayer, ProcessError> {
        self.instance.set_member("convert_data", convert)?;
        Ok(self)
    }

    pub fn set_convert_arcsde_data(&mut self, convert: ConvertArcSdeData) -> Result<&mut PackageLayer, ProcessError> {
        self.instance.set_member("convert_arcsde_data", convert)?;
        Ok(self)
    }

    pub fn set_extent(&mut self, extent: Extent) -> Result<&mut PackageLayer, ProcessError> {
        self.instance.set("extent", ParamValue::Extent(extent))?;
        Ok(self)
    }

    pub fn set_schema_only(&mut self, schema_only: SchemaOnly) -> Result<&mut PackageLayer, ProcessError> {
        self.instance.set_member("schema_only", schema_only)?;
        Ok(self)
    }

    pub fn set_version(&mut self, version: PackageVersion) -> Result<&mut PackageLayer, ProcessError> {
        self.instance.set_member("version", version)?;
        Ok(self)
    }

    pub fn set_additional_files(&mut self, files: &[&str]) -> Result<&mut PackageLayer, ProcessError> {
        let files = files.iter().map(|f| ParamValue::text(f)).collect();
        self.instance.set("additional_files", ParamValue::List(files))?;
        Ok(self)
    }

    pub fn set_summary(&mut self, summary: &str) -> Result<&mut PackageLayer, ProcessError> {
        self.instance.set("summary", ParamValue::text(summary))?;
        Ok(self)
    }

    pub fn set_tags(&mut self, tags: &str) -> Result<&mut PackageLayer, ProcessError> {
        self.instance.set("tags", ParamValue::text(tags))?;
        Ok(self)
    }
}

impl GeoprocessingTool for PackageLayer {
    fn instance(&self) -> &ToolInstance {
        &self.instance
    }

    fn instance_mut(&mut self) -> &mut ToolInstance {
        &mut self.instance
    }
}
