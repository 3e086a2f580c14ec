/*
This tool is part of the GP Tools geoprocessing runtime.
Authors: GP Tools developers
Created: 05/10/2026
Last Modified: 12/10/2026
License: MIT
*/

use super::{field_list, tolerance_table, CompareStatus, ContinueCompare, TOOLBOX_ALIAS, TOOLBOX_NAME};
use crate::tools::coded_values::CodedEnum;
use crate::tools::errors::{DescriptorError, ProcessError};
use crate::tools::parameters::{GpType, ParameterDescriptor, ToolDescriptor};
use crate::tools::values::ParamValue;
use crate::tools::{GeoprocessingTool, ToolInstance};
use std::sync::{Arc, OnceLock};

crate::coded_enum! {
    pub enum TableCompareType {
        All => ("ALL", "ALL", "All properties"),
        AttributesOnly => ("ATTRIBUTES_ONLY", "ATTRIBUTES_ONLY", "Only attribute values"),
        SchemaOnly => ("SCHEMA_ONLY", "SCHEMA_ONLY", "Only the schema"),
    }
}

crate::coded_enum! {
    pub enum TableIgnoreOption {
        IgnoreExtensionProperties => ("IGNORE_EXTENSION_PROPERTIES", "IGNORE_EXTENSION_PROPERTIES", "Ignore extension properties"),
        IgnoreSubtypes => ("IGNORE_SUBTYPES", "IGNORE_SUBTYPES", "Ignore subtypes"),
        IgnoreRelationshipClasses => ("IGNORE_RELATIONSHIPCLASSES", "IGNORE_RELATIONSHIPCLASSES", "Ignore relationship classes"),
        IgnoreFieldAlias => ("IGNORE_FIELDALIAS", "IGNORE_FIELDALIAS", "Ignore field aliases"),
    }
}

/// Compares two tables or table views and reports differences in field
/// definitions and tabular values. Takes no environment settings.
pub struct TableCompare {
    instance: ToolInstance,
}

fn build_descriptor() -> Result<ToolDescriptor, DescriptorError> {
    let builder = ToolDescriptor::builder("TableCompare", TOOLBOX_ALIAS)
        .display_name("Table Compare")
        .description("Compares two tables or table views and returns the comparison results.")
        .toolbox_name(TOOLBOX_NAME)
        .register_parameter(
            ParameterDescriptor::required("in_base_table", GpType::Table)
                .display_name("Input Base Table")
                .description("Table compared against the test table."),
        )?
        .register_parameter(
            ParameterDescriptor::required("in_test_table", GpType::Table)
                .display_name("Input Test Table")
                .description("Table compared against the base table."),
        )?
        .register_parameter(
            ParameterDescriptor::required("sort_field", GpType::multi_value(GpType::Field))
                .display_name("Sort Field")
                .description("Field or fields used to sort records in both tables."),
        )?
        .register_parameter(
            ParameterDescriptor::optional("compare_type", GpType::string())
                .display_name("Compare Type")
                .description("Comparison type.")
                .coded_values(Arc::new(TableCompareType::coded_value_map()?))
                .default_value("ALL"),
        )?
        .register_parameter(
            ParameterDescriptor::optional("ignore_options", GpType::multi_value(GpType::string()))
                .display_name("Ignore Options")
                .description("Properties that will not be compared.")
                .coded_values(Arc::new(TableIgnoreOption::coded_value_map()?)),
        )?
        .register_parameter(
            ParameterDescriptor::optional(
                "attribute_tolerances",
                GpType::ValueTable(vec![GpType::Field, GpType::double()]),
            )
            .display_name("Attribute Tolerances"),
        )?
        .register_parameter(
            ParameterDescriptor::optional("omit_field", GpType::multi_value(GpType::Field)).display_name("Omit Fields"),
        )?
        .register_parameter(
            ParameterDescriptor::optional("continue_compare", GpType::boolean())
                .display_name("Continue Comparison")
                .coded_values(Arc::new(ContinueCompare::coded_value_map()?))
                .default_value("NO_CONTINUE_COMPARE"),
        )?
        .register_parameter(
            ParameterDescriptor::optional("out_compare_file", GpType::File)
                .display_name("Output Compare File")
                .file_types(&["txt"]),
        )?
        .register_parameter(
            ParameterDescriptor::derived("compare_status", GpType::boolean())
                .display_name("Compare Status")
                .coded_values(Arc::new(CompareStatus::coded_value_map()?)),
        )?;
    Ok(builder.build())
}

impl TableCompare {
    pub fn tool_descriptor() -> Result<Arc<ToolDescriptor>, DescriptorError> {
        static DESCRIPTOR: OnceLock<Result<Arc<ToolDescriptor>, DescriptorError>> = OnceLock::new();
        DESCRIPTOR
            .get_or_init(|| build_descriptor().map(Arc::new))
            .clone()
    }

    pub fn new() -> Result<TableCompare, DescriptorError> {
        Ok(TableCompare {
            instance: ToolInstance::new(TableCompare::tool_descriptor()?),
        })
    }

    pub fn set_in_base_table(&mut self, table: &str) -> Result<&mut TableCompare, ProcessError> {
        self.instance.set("in_base_table", ParamValue::text(table))?;
        Ok(self)
    }

    pub fn set_in_test_table(&mut self, table: &str) -> Result<&mut TableCompare, ProcessError> {
        self.instance.set("in_test_table", ParamValue::text(table))?;
        Ok(self)
    }

    pub fn set_sort_field(&mut self, fields: &[&str]) -> Result<&mut TableCompare, ProcessError> {
        self.instance.set("sort_field", field_list(fields))?;
        Ok(self)
    }

    pub fn set_compare_type(&mut self, compare_type: TableCompareType) -> Result<&mut TableCompare, ProcessError> {
        self.instance.set_member("compare_type", compare_type)?;
        Ok(self)
    }

    pub fn set_ignore_options(&mut self, options: &[TableIgnoreOption]) -> Result<&mut TableCompare, ProcessError> {
        let members = options
            .iter()
            .map(|o| ParamValue::Member(o.member().to_string()))
            .collect();
        self.instance.set("ignore_options", ParamValue::List(members))?;
        Ok(self)
    }

    pub fn set_attribute_tolerances(&mut self, tolerances: &[(&str, f64)]) -> Result<&mut TableCompare, ProcessError> {
        self.instance.set("attribute_tolerances", tolerance_table(tolerances))?;
        Ok(self)
    }

    pub fn set_omit_field(&mut self, fields: &[&str]) -> Result<&mut TableCompare, ProcessError> {
        self.instance.set("omit_field", field_list(fields))?;
        Ok(self)
    }

    pub fn set_continue_compare(&mut self, continue_compare: ContinueCompare) -> Result<&mut TableCompare, ProcessError> {
        self.instance.set_member("continue_compare", continue_compare)?;
        Ok(self)
    }

    pub fn set_out_compare_file(&mut self, file: &str) -> Result<&mut TableCompare, ProcessError> {
        self.instance.set("out_compare_file", ParamValue::text(file))?;
        Ok(self)
    }

    pub fn compare_status(&self) -> Option<CompareStatus> {
        self.instance.member("compare_status")
    }
}

impl GeoprocessingTool for TableCompare {
    fn instance(&self) -> &ToolInstance {
        &self.instance
    }

    fn instance_mut(&mut self) -> &mut ToolInstance {
        &mut self.instance
    }
}
