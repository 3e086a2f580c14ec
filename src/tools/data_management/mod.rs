// private sub-module defined in other files
mod feature_compare;
mod package_layer;
mod table_compare;

// exports identifiers from private sub-modules in the current module namespace
pub use self::feature_compare::{FeatureCompare, FeatureCompareType, FeatureIgnoreOption};
pub use self::package_layer::{ConvertArcSdeData, ConvertData, PackageLayer, PackageVersion, SchemaOnly};
pub use self::table_compare::{TableCompare, TableCompareType, TableIgnoreOption};

use crate::tools::values::ParamValue;

pub const TOOLBOX_NAME: &str = "Data Management Tools";
pub const TOOLBOX_ALIAS: &str = "management";

crate::coded_enum! {
    /// Derived result of the comparison tools.
    pub enum CompareStatus {
        NoDifferencesFound => ("NO_DIFFERENCES_FOUND", "true", "No differences were found"),
        DifferencesFound => ("DIFFERENCES_FOUND", "false", "Differences were found"),
    }
}

crate::coded_enum! {
    pub enum ContinueCompare {
        Continue => ("CONTINUE_COMPARE", "true", "Compare all properties after the first miscompare"),
        Stop => ("NO_CONTINUE_COMPARE", "false", "Stop after the first miscompare"),
    }
}

fn field_list(fields: &[&str]) -> ParamValue {
    ParamValue::List(fields.iter().map(|f| ParamValue::text(f)).collect())
}

/// Rows of `field tolerance` for the attribute tolerance value tables.
fn tolerance_table(tolerances: &[(&str, f64)]) -> ParamValue {
    ParamValue::Table(
        tolerances
            .iter()
            .map(|(field, tolerance)| vec![ParamValue::text(field), ParamValue::Double(*tolerance)])
            .collect(),
    )
}
