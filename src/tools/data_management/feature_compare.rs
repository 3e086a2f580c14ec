/*
This tool is part of the GP Tools geoprocessing runtime.
Authors: GP Tools developers
Created: 05/10/2026
Last Modified: 14/10/2026
License: MIT
*/

use super::{field_list, tolerance_table, CompareStatus, ContinueCompare, TOOLBOX_ALIAS, TOOLBOX_NAME};
use crate::tools::coded_values::CodedEnum;
use crate::tools::environments;
use crate::tools::errors::{DescriptorError, ProcessError};
use crate::tools::parameters::{GpType, ParameterDescriptor, ToolDescriptor};
use crate::tools::values::{LinearUnit, ParamValue};
use crate::tools::{GeoprocessingTool, ToolInstance};
use std::sync::{Arc, OnceLock};

crate::coded_enum! {
    pub enum FeatureCompareType {
        All => ("ALL", "ALL", "All properties"),
        GeometryOnly => ("GEOMETRY_ONLY", "GEOMETRY_ONLY", "Only feature geometries"),
        AttributesOnly => ("ATTRIBUTES_ONLY", "ATTRIBUTES_ONLY", "Only attribute values"),
        SchemaOnly => ("SCHEMA_ONLY", "SCHEMA_ONLY", "Only the schema"),
        SpatialReferenceOnly => ("SPATIAL_REFERENCE_ONLY", "SPATIAL_REFERENCE_ONLY", "Only the spatial reference"),
    }
}

crate::coded_enum! {
    pub enum FeatureIgnoreOption {
        IgnoreM => ("IGNORE_M", "IGNORE_M", "Ignore m-values"),
        IgnoreZ => ("IGNORE_Z", "IGNORE_Z", "Ignore z-values"),
        IgnorePointId => ("IGNORE_POINTID", "IGNORE_POINTID", "Ignore point ID values"),
        IgnoreExtensionProperties => ("IGNORE_EXTENSION_PROPERTIES", "IGNORE_EXTENSION_PROPERTIES", "Ignore extension properties"),
        IgnoreSubtypes => ("IGNORE_SUBTYPES", "IGNORE_SUBTYPES", "Ignore subtypes"),
        IgnoreRelationshipClasses => ("IGNORE_RELATIONSHIPCLASSES", "IGNORE_RELATIONSHIPCLASSES", "Ignore relationship classes"),
        IgnoreRepresentationClass => ("IGNORE_REPRESENTATIONCLASS", "IGNORE_REPRESENTATIONCLASS", "Ignore representation classes"),
        IgnoreFieldAlias => ("IGNORE_FIELDALIAS", "IGNORE_FIELDALIAS", "Ignore field aliases"),
    }
}

/// Compares two feature classes or layers and reports differences in
/// geometry, tabular values, spatial reference and field definitions.
///
/// The base features (`--in_base_features`) are compared against the test
/// features (`--in_test_features`) after both are sorted by `--sort_field`.
/// Differences are written to `--out_compare_file` when one is given, and the
/// derived `compare_status` reports `NO_DIFFERENCES_FOUND` or
/// `DIFFERENCES_FOUND`.
///
/// # See Also
/// `TableCompare`
pub struct FeatureCompare {
    instance: ToolInstance,
}

fn build_descriptor() -> Result<ToolDescriptor, DescriptorError> {
    let builder = ToolDescriptor::builder("FeatureCompare", TOOLBOX_ALIAS)
        .display_name("Feature Compare")
        .description("Compares two feature classes or layers and returns the comparison results.")
        .toolbox_name(TOOLBOX_NAME)
        .environments(&[environments::EXTENT])
        .register_parameter(
            ParameterDescriptor::required("in_base_features", GpType::FeatureLayer)
                .display_name("Input Base Features")
                .description("Features compared against the test features."),
        )?
        .register_parameter(
            ParameterDescriptor::required("in_test_features", GpType::FeatureLayer)
                .display_name("Input Test Features")
                .description("Features compared against the base features."),
        )?
        .register_parameter(
            ParameterDescriptor::required("sort_field", GpType::multi_value(GpType::Field))
                .display_name("Sort Field")
                .description("Field or fields used to sort records in both inputs."),
        )?
        .register_parameter(
            ParameterDescriptor::optional("compare_type", GpType::string())
                .display_name("Compare Type")
                .description("Comparison type.")
                .coded_values(Arc::new(FeatureCompareType::coded_value_map()?))
                .default_value("ALL"),
        )?
        .register_parameter(
            ParameterDescriptor::optional("ignore_options", GpType::multi_value(GpType::string()))
                .display_name("Ignore Options")
                .description("Properties that will not be compared.")
                .coded_values(Arc::new(FeatureIgnoreOption::coded_value_map()?)),
        )?
        .register_parameter(
            ParameterDescriptor::optional("xy_tolerance", GpType::LinearUnit)
                .display_name("XY Tolerance")
                .description("Distance that determines the range in which features are considered equal.")
                .range(Some(0.0), None)
                .default_value("0 Unknown"),
        )?
        .register_parameter(
            ParameterDescriptor::optional("m_tolerance", GpType::double())
                .display_name("M Tolerance")
                .description("Range in which m-values are considered equal.")
                .range(Some(0.0), None)
                .default_value("0"),
        )?
        .register_parameter(
            ParameterDescriptor::optional("z_tolerance", GpType::double())
                .display_name("Z Tolerance")
                .description("Range in which z-values are considered equal.")
                .range(Some(0.0), None)
                .default_value("0"),
        )?
        .register_parameter(
            ParameterDescriptor::optional(
                "attribute_tolerances",
                GpType::ValueTable(vec![GpType::Field, GpType::double()]),
            )
            .display_name("Attribute Tolerances")
            .description("Numeric fields paired with the tolerance within which their values are equal."),
        )?
        .register_parameter(
            ParameterDescriptor::optional("omit_field", GpType::multi_value(GpType::Field))
                .display_name("Omit Fields")
                .description("Fields excluded from the comparison."),
        )?
        .register_parameter(
            ParameterDescriptor::optional("continue_compare", GpType::boolean())
                .display_name("Continue Comparison")
                .description("Whether to compare all properties after the first miscompare is found.")
                .coded_values(Arc::new(ContinueCompare::coded_value_map()?))
                .default_value("NO_CONTINUE_COMPARE"),
        )?
        .register_parameter(
            ParameterDescriptor::optional("out_compare_file", GpType::File)
                .display_name("Output Compare File")
                .description("Text file receiving the full comparison results.")
                .file_types(&["txt"]),
        )?
        .register_parameter(
            ParameterDescriptor::derived("compare_status", GpType::boolean())
                .display_name("Compare Status")
                .description("Whether any differences were found.")
                .coded_values(Arc::new(CompareStatus::coded_value_map()?)),
        )?;
    Ok(builder.build())
}

impl FeatureCompare {
    pub fn tool_descriptor() -> Result<Arc<ToolDescriptor>, DescriptorError> {
        static DESCRIPTOR: OnceLock<Result<Arc<ToolDescriptor>, DescriptorError>> = OnceLock::new();
        DESCRIPTOR
            .get_or_init(|| build_descriptor().map(Arc::new))
            .clone()
    }

    pub fn new() -> Result<FeatureCompare, DescriptorError> {
        Ok(FeatureCompare {
            instance: ToolInstance::new(FeatureCompare::tool_descriptor()?),
        })
    }

    pub fn set_in_base_features(&mut self, features: &str) -> Result<&mut FeatureCompare, ProcessError> {
        self.instance.set("in_base_features", ParamValue::text(features))?;
        Ok(self)
    }

    pub fn set_in_test_features(&mut self, features: &str) -> Result<&mut FeatureCompare, ProcessError> {
        self.instance.set("in_test_features", ParamValue::text(features))?;
        Ok(self)
    }

    pub fn set_sort_field(&mut self, fields: &[&str]) -> Result<&mut FeatureCompare, ProcessError> {
        self.instance.set("sort_field", field_list(fields))?;
        Ok(self)
    }

    pub fn set_compare_type(&mut self, compare_type: FeatureCompareType) -> Result<&mut FeatureCompare, ProcessError> {
        self.instance.set_member("compare_type", compare_type)?;
        Ok(self)
    }

    pub fn set_ignore_options(&mut self, options: &[FeatureIgnoreOption]) -> Result<&mut FeatureCompare, ProcessError> {
        let members = options
            .iter()
            .map(|o| ParamValue::Member(o.member().to_string()))
            .collect();
        self.instance.set("ignore_options", ParamValue::List(members))?;
        Ok(self)
    }

    pub fn set_xy_tolerance(&mut self, tolerance: LinearUnit) -> Result<&mut FeatureCompare, ProcessError> {
        self.instance.set("xy_tolerance", ParamValue::LinearUnit(tolerance))?;
        Ok(self)
    }

    pub fn set_m_tolerance(&mut self, tolerance: f64) -> Result<&mut FeatureCompare, ProcessError> {
        self.instance.set("m_tolerance", ParamValue::Double(tolerance))?;
        Ok(self)
    }

    pub fn set_z_tolerance(&mut self, tolerance: f64) -> Result<&mut FeatureCompare, ProcessError> {
        self.instance.set("z_tolerance", ParamValue::Double(tolerance))?;
        Ok(self)
    }

    pub fn set_attribute_tolerances(&mut self, tolerances: &[(&str, f64)]) -> Result<&mut FeatureCompare, ProcessError> {
        self.instance.set("attribute_tolerances", tolerance_table(tolerances))?;
        Ok(self)
    }

    pub fn set_omit_field(&mut self, fields: &[&str]) -> Result<&mut FeatureCompare, ProcessError> {
        self.instance.set("omit_field", field_list(fields))?;
        Ok(self)
    }

    pub fn set_continue_compare(&mut self, continue_compare: ContinueCompare) -> Result<&mut FeatureCompare, ProcessError> {
        self.instance.set_member("continue_compare", continue_compare)?;
        Ok(self)
    }

    pub fn set_out_compare_file(&mut self, file: &str) -> Result<&mut FeatureCompare, ProcessError> {
        self.instance.set("out_compare_file", ParamValue::text(file))?;
        Ok(self)
    }

    /// Set after a successful execution.
    pub fn compare_status(&self) -> Option<CompareStatus> {
        self.instance.member("compare_status")
    }
}

impl GeoprocessingTool for FeatureCompare {
    fn instance(&self) -> &ToolInstance {
        &self.instance
    }

    fn instance_mut(&mut self) -> &mut ToolInstance {
        &mut self.instance
    }
}
