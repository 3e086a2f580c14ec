use gp_tools::tools::data_management::{
    CompareStatus, ContinueCompare, ConvertArcSdeData, ConvertData, FeatureCompare, FeatureCompareType,
    FeatureIgnoreOption, PackageLayer, PackageVersion, SchemaOnly, TableCompare, TableCompareType,
    TableIgnoreOption,
};
use gp_tools::tools::network_diagram::{ApplyForceDirectedLayout, DegreeOfFreedom, RunAsync};
use gp_tools::tools::{
    CodedEnum, CodedValueMap, EnvironmentSettings, ExecutorError, Executor, GeoprocessingTool, GpType,
    InvocationRequest, InvocationResult, LinearUnit, ParamValue, ParameterDescriptor, ParameterValue,
    ProcessError, ProcessRuntime, ToolDescriptor, ToolInstance, ToolRegistry, WireValue,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

/// Records every submitted request and answers with a fixed result.
struct Spy {
    requests: Mutex<Vec<InvocationRequest>>,
    result: InvocationResult,
}

impl Spy {
    fn new(result: InvocationResult) -> Spy {
        Spy {
            requests: Mutex::new(vec![]),
            result,
        }
    }

    fn requests(&self) -> Vec<InvocationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Executor for Spy {
    fn submit(&self, request: &InvocationRequest) -> Result<InvocationResult, ExecutorError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.result.clone())
    }
}

fn text(s: &str) -> WireValue {
    WireValue::Text(s.to_string())
}

fn feature_compare() -> FeatureCompare {
    let mut tool = FeatureCompare::new().unwrap();
    tool.set_in_base_features("/data/base.gdb/roads")
        .unwrap()
        .set_in_test_features("/data/test.gdb/roads")
        .unwrap()
        .set_sort_field(&["OBJECTID"])
        .unwrap();
    tool
}

#[test]
fn missing_required_parameter_never_reaches_the_executor() {
    let runtime = ProcessRuntime::new(Spy::new(InvocationResult::succeeded(vec![text("true")])));
    let mut tool = FeatureCompare::new().unwrap();
    tool.set_in_base_features("base").unwrap();

    match runtime.execute(&mut tool, &EnvironmentSettings::new()) {
        Err(ProcessError::MissingRequiredParameter { parameter, .. }) => {
            assert_eq!(parameter, "in_test_features")
        }
        other => panic!("expected MissingRequiredParameter, got {:?}", other),
    }
    assert!(runtime.executor().requests().is_empty());
    assert_eq!(tool.compare_status(), None);
}

#[test]
fn every_builtin_member_round_trips() {
    fn check<E: CodedEnum + std::fmt::Debug + PartialEq>() {
        let map = E::coded_value_map().unwrap();
        for (member, _, _) in E::MEMBERS {
            let token = map.encode(member).unwrap();
            assert_eq!(map.decode(token).unwrap(), *member);
            assert_eq!(E::from_member(member).map(|e| e.member()), Some(*member));
        }
    }
    check::<CompareStatus>();
    check::<ContinueCompare>();
    check::<FeatureCompareType>();
    check::<FeatureIgnoreOption>();
    check::<TableCompareType>();
    check::<TableIgnoreOption>();
    check::<ConvertData>();
    check::<ConvertArcSdeData>();
    check::<SchemaOnly>();
    check::<PackageVersion>();
    check::<DegreeOfFreedom>();
    check::<RunAsync>();
}

#[test]
fn every_registered_coded_parameter_round_trips() {
    let registry = ToolRegistry::with_builtin_tools().unwrap();
    let mut maps = 0;
    for (name, _) in registry.list_tools() {
        let descriptor = registry.get(&name).unwrap();
        for parameter in descriptor.parameters() {
            let map = match &parameter.domain.coded_values {
                Some(map) => map,
                None => continue,
            };
            maps += 1;
            for entry in map.entries() {
                let token = map.encode(&entry.member).unwrap();
                assert_eq!(token, entry.token, "{}.{}", name, parameter.name);
                assert_eq!(map.decode(token).unwrap(), entry.member, "{}.{}", name, parameter.name);
            }
        }
    }
    assert_eq!(maps, 14);
}

#[test]
fn linear_unit_without_a_unit_is_sent_as_unknown() {
    let runtime = ProcessRuntime::new(Spy::new(InvocationResult::succeeded(vec![text("true")])));
    let mut tool = feature_compare();
    tool.set_xy_tolerance(LinearUnit::unknown(5.0)).unwrap();
    runtime.execute(&mut tool, &EnvironmentSettings::new()).unwrap();

    let requests = runtime.executor().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].parameters[5], text("5 Unknown"));
}

#[test]
fn required_search_distance_falls_back_to_its_default() {
    let descriptor = ToolDescriptor::builder("SelectLayerByLocation", "management")
        .register_parameter(ParameterDescriptor::required("in_layer", GpType::FeatureLayer))
        .unwrap()
        .register_parameter(ParameterDescriptor::required("search_distance", GpType::string()).default_value("0 Unknown"))
        .unwrap()
        .build();
    let mut tool = ToolInstance::new(Arc::new(descriptor));
    tool.set_literal("in_layer", "parcels").unwrap();

    let runtime = ProcessRuntime::new(Spy::new(InvocationResult::succeeded(vec![])));
    let request = runtime.prepare(&tool, &EnvironmentSettings::new()).unwrap();
    assert_eq!(request.parameters, vec![text("parcels"), text("0 Unknown")]);
}

#[test]
fn environment_overrides_are_filtered_by_the_tool() {
    let runtime = ProcessRuntime::new(Spy::new(InvocationResult::succeeded(vec![])));
    let mut tool = PackageLayer::new().unwrap();
    tool.set_in_layer(&["roads"]).unwrap().set_output_file("/out/roads.lpkx").unwrap();

    let allowed = EnvironmentSettings::new()
        .with("workspace", ParamValue::text("/data/city.gdb"))
        .with("scratchWorkspace", ParamValue::text("/scratch"));
    let report = runtime.execute(&mut tool, &allowed).unwrap();
    assert_eq!(report.applied_environment, vec!["scratchWorkspace", "workspace"]);

    let mixed = allowed.with("cellSize", ParamValue::Double(10.0));
    match runtime.execute(&mut tool, &mixed) {
        Err(ProcessError::InvalidEnvironmentKey { keys, .. }) => assert_eq!(keys, vec!["cellSize"]),
        other => panic!("expected InvalidEnvironmentKey, got {:?}", other),
    }
    assert_eq!(runtime.executor().requests().len(), 1);
}

#[test]
fn environment_keys_are_case_sensitive() {
    let runtime = ProcessRuntime::new(Spy::new(InvocationResult::succeeded(vec![])));
    let mut tool = PackageLayer::new().unwrap();
    tool.set_in_layer(&["roads"]).unwrap().set_output_file("/out/roads.lpkx").unwrap();
    let env = EnvironmentSettings::new().with("Workspace", ParamValue::text("/data"));
    assert!(matches!(
        runtime.execute(&mut tool, &env),
        Err(ProcessError::InvalidEnvironmentKey { .. })
    ));
    assert!(runtime.executor().requests().is_empty());
}

#[test]
fn identical_configuration_gives_identical_payloads() {
    let runtime = ProcessRuntime::new(Spy::new(InvocationResult::succeeded(vec![text("true")])));
    let env = EnvironmentSettings::new().with("extent", ParamValue::text("0 0 100 100"));
    let mut tool = feature_compare();
    tool.set_compare_type(FeatureCompareType::GeometryOnly)
        .unwrap()
        .set_attribute_tolerances(&[("ELEV", 0.5), ("LENGTH", 0.01)])
        .unwrap()
        .set_continue_compare(ContinueCompare::Continue)
        .unwrap();

    runtime.execute(&mut tool, &env).unwrap();
    runtime.execute(&mut tool, &env).unwrap();

    let requests = runtime.executor().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        String::from_utf8(requests[0].to_payload().unwrap()).unwrap(),
        String::from_utf8(requests[1].to_payload().unwrap()).unwrap()
    );
    assert_eq!(requests[0].parameters[3], text("GEOMETRY_ONLY"));
    assert_eq!(requests[0].parameters[10], text("true"));
}

#[test]
fn derived_token_decodes_to_its_member() {
    let runtime = ProcessRuntime::new(Spy::new(InvocationResult::succeeded(vec![text("true")])));
    let mut tool = feature_compare();
    let report = runtime.execute(&mut tool, &EnvironmentSettings::new()).unwrap();
    assert!(!report.has_warnings());
    assert_eq!(tool.compare_status(), Some(CompareStatus::NoDifferencesFound));

    let runtime = ProcessRuntime::new(Spy::new(
        InvocationResult::succeeded(vec![]).with_output("compare_status", text("false")),
    ));
    let mut tool = TableCompare::new().unwrap();
    tool.set_in_base_table("base.dbf")
        .unwrap()
        .set_in_test_table("test.dbf")
        .unwrap()
        .set_sort_field(&["ID"])
        .unwrap();
    runtime.execute(&mut tool, &EnvironmentSettings::new()).unwrap();
    assert_eq!(tool.compare_status(), Some(CompareStatus::DifferencesFound));
}

#[test]
fn unrecognized_token_is_a_warning_not_a_failure() {
    let state = Arc::new(CodedValueMap::boolean(("VALID", "Valid"), ("INVALID", "Invalid")).unwrap());
    let descriptor = ToolDescriptor::builder("ValidateTopology", "management")
        .register_parameter(ParameterDescriptor::required("in_topology", GpType::string()))
        .unwrap()
        .register_parameter(ParameterDescriptor::derived("state", GpType::boolean()).coded_values(state))
        .unwrap()
        .register_parameter(ParameterDescriptor::derived("error_count", GpType::long()))
        .unwrap()
        .build();
    let mut tool = ToolInstance::new(Arc::new(descriptor));
    tool.set_literal("in_topology", "city_topology").unwrap();

    let runtime = ProcessRuntime::new(Spy::new(InvocationResult::succeeded(vec![text("PARTIAL"), text("7")])));
    let report = runtime.execute(&mut tool, &EnvironmentSettings::new()).unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].parameter, "state");
    assert_eq!(report.warnings[0].token, "PARTIAL");
    assert_eq!(tool.slot("state"), Some(&ParameterValue::Unrecognized("PARTIAL".to_string())));
    assert_eq!(tool.long("error_count"), Some(7));
}

#[test]
fn failed_execution_leaves_derived_values_untouched() {
    let runtime = ProcessRuntime::new(Spy::new(InvocationResult::failed(vec![
        "ERROR 000732: Input Network Diagram Layer: Dataset Diagram does not exist".to_string(),
    ])));
    let mut tool = ApplyForceDirectedLayout::new().unwrap();
    tool.set_in_network_diagram_layer("Diagram").unwrap();
    let err = runtime.execute(&mut tool, &EnvironmentSettings::new()).unwrap_err();
    assert!(!err.is_configuration_error());
    assert_eq!(tool.out_network_diagram_layer(), None);
    assert_eq!(tool.execute_name(), "nd.ApplyForceDirectedLayout");
}
