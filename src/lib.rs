/*
This code is part of the GP Tools geoprocessing runtime.
Authors: GP Tools developers
Created: 28/09/2026
Last Modified: 16/10/2026
License: MIT
*/

/*!
GP Tools is a metadata-driven runtime for invoking geoprocessing tools that
run inside an external engine.

Every tool is described by an immutable `ToolDescriptor`: its qualified
execute name, its ordered parameters (type, role, domain and default) and
the environment settings it honours. A `ToolInstance` holds one caller's
values for a tool; `ProcessRuntime::execute` validates and marshals them
into a positional `InvocationRequest`, hands it to an `Executor` and decodes
the engine's reply back onto the tool's derived parameters.

```no_run
use gp_tools::executors::CommandExecutor;
use gp_tools::tools::data_management::{CompareStatus, FeatureCompare};
use gp_tools::tools::{EnvironmentSettings, ProcessRuntime};

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let mut tool = FeatureCompare::new()?;
tool.set_in_base_features("base.shp")?
    .set_in_test_features("test.shp")?
    .set_sort_field(&["OBJECTID"])?;

let runtime = ProcessRuntime::new(CommandExecutor::new("gp_engine"));
let report = runtime.execute(&mut tool, &EnvironmentSettings::new())?;
assert!(!report.has_warnings());
assert_eq!(tool.compare_status(), Some(CompareStatus::NoDifferencesFound));
# Ok(())
# }
```
*/

pub mod executors;
pub mod tools;

pub use crate::tools::{
    GeoprocessingTool, ProcessError, ProcessRuntime, ToolInstance, ToolRegistry,
};
