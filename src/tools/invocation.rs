/*
This code is part of the GP Tools geoprocessing runtime.
Authors: GP Tools developers
Created: 01/10/2026
Last Modified: 16/10/2026
License: MIT
*/

use super::environments::{self, EnvironmentSettings};
use super::errors::ProcessError;
use super::parameters::{GpType, ParameterDescriptor, ParameterRole, ScalarType, ToolDescriptor};
use super::values::{quote_cell, type_mismatch, ParamValue, ParameterValue, ParameterValues, DATE_FORMAT, LIST_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const REDACTED: &str = "********";

/// A parameter value as transmitted to the engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum WireValue {
    /// Positional "no value".
    Empty,
    Text(String),
    /// Multivalue items, in order.
    List(Vec<String>),
    /// Value-table rows of fixed arity.
    Table(Vec<Vec<String>>),
}

impl WireValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, WireValue::Empty)
    }

    /// Flat text form: list items and table rows joined by `;`, table cells by
    /// spaces. Items and cells holding a space or `;` are single-quoted.
    pub fn to_wire_string(&self) -> String {
        let sep = LIST_SEPARATOR.to_string();
        match self {
            WireValue::Empty => String::new(),
            WireValue::Text(s) => s.clone(),
            WireValue::List(items) => items.iter().map(|i| quote_cell(i)).collect::<Vec<String>>().join(&sep),
            WireValue::Table(rows) => rows
                .iter()
                .map(|row| row.iter().map(|c| quote_cell(c)).collect::<Vec<String>>().join(" "))
                .collect::<Vec<String>>()
                .join(&sep),
        }
    }
}

/// One tool invocation: the qualified tool name, the positional parameter
/// values and the environment overrides the tool accepts. Built fresh for
/// every call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    pub tool: String,
    pub parameters: Vec<WireValue>,
    pub environment: BTreeMap<String, WireValue>,
}

impl InvocationRequest {
    /// The JSON payload sent to the engine. Deterministic for equal requests.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// A copy safe to log: encrypted-string parameters are masked.
    pub fn redacted(&self, descriptor: &ToolDescriptor) -> InvocationRequest {
        let mut ret = self.clone();
        for (i, p) in descriptor.parameters().iter().enumerate() {
            if *p.data_type.element() == GpType::Scalar(ScalarType::EncryptedString) {
                if let Some(v) = ret.parameters.get_mut(i) {
                    if !v.is_empty() {
                        *v = WireValue::Text(REDACTED.to_string());
                    }
                }
            }
        }
        ret
    }
}

fn domain_violation(parameter: &ParameterDescriptor, reason: String) -> ProcessError {
    ProcessError::DomainViolation {
        parameter: parameter.name.clone(),
        reason,
    }
}

fn check_range(parameter: &ParameterDescriptor, value: f64) -> Result<(), ProcessError> {
    if !value.is_finite() {
        return Err(domain_violation(parameter, format!("{} is not a finite number", value)));
    }
    match &parameter.domain.range {
        Some(range) if !range.contains(value) => Err(domain_violation(
            parameter,
            format!("{} is outside the range {}", value, range),
        )),
        _ => Ok(()),
    }
}

/// Encodes a value through the parameter's coded-value map.
fn marshal_coded(parameter: &ParameterDescriptor, ty: &GpType, value: &ParamValue) -> Result<String, ProcessError> {
    let map = match &parameter.domain.coded_values {
        Some(map) => map,
        None => return Err(type_mismatch(parameter, ty, value.kind())),
    };
    match value {
        ParamValue::Member(member) => map
            .encode(member)
            .map(|t| t.to_string())
            .map_err(|e| ProcessError::from_codec(&parameter.name, e)),
        // Raw tokens are accepted as long as they belong to the domain.
        ParamValue::Text(_) | ParamValue::Boolean(_) | ParamValue::Long(_) => {
            let literal = value.to_literal();
            map.decode(&literal)
                .and_then(|member| map.encode(member))
                .map(|t| t.to_string())
                .map_err(|e| ProcessError::from_codec(&parameter.name, e))
        }
        other => Err(type_mismatch(parameter, ty, other.kind())),
    }
}

/// Marshals a single (non-collection) value of type `ty` into its wire text.
fn marshal_text(
    parameter: &ParameterDescriptor,
    ty: &GpType,
    value: &ParamValue,
    apply_domain: bool,
) -> Result<String, ProcessError> {
    if apply_domain && parameter.domain.coded_values.is_some() {
        return marshal_coded(parameter, ty, value);
    }
    match (ty, value) {
        (GpType::Scalar(ScalarType::Boolean), ParamValue::Boolean(b)) => Ok(b.to_string()),
        (GpType::Scalar(ScalarType::Long), ParamValue::Long(n)) => {
            if apply_domain {
                check_range(parameter, *n as f64)?;
            }
            Ok(n.to_string())
        }
        (GpType::Scalar(ScalarType::Double), ParamValue::Long(n)) => {
            marshal_text(parameter, ty, &ParamValue::Double(*n as f64), apply_domain)
        }
        (GpType::Scalar(ScalarType::Double), ParamValue::Double(d)) => {
            if apply_domain {
                check_range(parameter, *d)?;
            } else if !d.is_finite() {
                return Err(domain_violation(parameter, format!("{} is not a finite number", d)));
            }
            Ok(d.to_string())
        }
        (GpType::Scalar(ScalarType::Date), ParamValue::Date(d)) => Ok(d.format(DATE_FORMAT).to_string()),
        (GpType::LinearUnit, ParamValue::LinearUnit(lu)) => {
            if apply_domain {
                check_range(parameter, lu.value)?;
            }
            Ok(lu.to_string())
        }
        (GpType::LinearUnit, ParamValue::Text(s)) => {
            let lu: super::values::LinearUnit = s
                .parse()
                .map_err(|e: String| type_mismatch(parameter, ty, &e))?;
            marshal_text(parameter, ty, &ParamValue::LinearUnit(lu), apply_domain)
        }
        (GpType::Extent, ParamValue::Extent(e)) => Ok(e.to_string()),
        (GpType::Extent, ParamValue::Text(s)) => {
            let e: super::values::Extent = s.parse().map_err(|e: String| type_mismatch(parameter, ty, &e))?;
            Ok(e.to_string())
        }
        (GpType::File, ParamValue::Text(s)) => {
            if apply_domain && !parameter.domain.accepts_file(s) {
                return Err(domain_violation(
                    parameter,
                    format!(
                        "'{}' does not have one of the extensions {}",
                        s.trim(),
                        parameter.domain.file_types.join(", ")
                    ),
                ));
            }
            Ok(s.trim().to_string())
        }
        (GpType::Scalar(ScalarType::String), ParamValue::Text(s))
        | (GpType::Scalar(ScalarType::EncryptedString), ParamValue::Text(s)) => Ok(s.clone()),
        (GpType::SpatialReference, ParamValue::Text(s))
        | (GpType::FeatureLayer, ParamValue::Text(s))
        | (GpType::Table, ParamValue::Text(s))
        | (GpType::Field, ParamValue::Text(s))
        | (GpType::Folder, ParamValue::Text(s)) => Ok(s.trim().to_string()),
        (GpType::Composite(members), v) => members
            .iter()
            .find_map(|m| marshal_text(parameter, m, v, false).ok())
            .ok_or_else(|| type_mismatch(parameter, ty, v.kind())),
        (_, v) => Err(type_mismatch(parameter, ty, v.kind())),
    }
}

/// Applies the type-specific marshaling rule for one parameter value.
pub fn marshal(parameter: &ParameterDescriptor, value: &ParamValue) -> Result<WireValue, ProcessError> {
    let ty = &parameter.data_type;
    match ty {
        GpType::MultiValue(inner) => {
            let items: Vec<&ParamValue> = match value {
                ParamValue::List(items) => items.iter().collect(),
                single => vec![single],
            };
            let marshaled = items
                .into_iter()
                .map(|item| marshal_text(parameter, inner, item, true))
                .collect::<Result<Vec<String>, ProcessError>>()?;
            Ok(WireValue::List(marshaled))
        }
        GpType::ValueTable(columns) => {
            let rows = match value {
                ParamValue::Table(rows) => rows,
                other => return Err(type_mismatch(parameter, ty, other.kind())),
            };
            let mut marshaled = Vec::with_capacity(rows.len());
            for row in rows {
                if row.len() != columns.len() {
                    return Err(type_mismatch(
                        parameter,
                        ty,
                        &format!("a row of {} cells", row.len()),
                    ));
                }
                let cells = row
                    .iter()
                    .zip(columns.iter())
                    .map(|(cell, column)| marshal_text(parameter, column, cell, false))
                    .collect::<Result<Vec<String>, ProcessError>>()?;
                marshaled.push(cells);
            }
            Ok(WireValue::Table(marshaled))
        }
        _ => marshal_text(parameter, ty, value, true).map(WireValue::Text),
    }
}

/// Wire form of an environment override. Environments carry no coded
/// values, so members are sent by name.
fn marshal_environment(value: &ParamValue) -> WireValue {
    match value {
        ParamValue::List(items) => WireValue::List(items.iter().map(|i| i.to_literal()).collect()),
        ParamValue::Table(rows) => WireValue::Table(
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_literal()).collect())
                .collect(),
        ),
        other => WireValue::Text(other.to_literal()),
    }
}

/// Assembles the positional request for `descriptor` from the instance's
/// current values and the caller's environment.
///
/// Fails before anything is sent when a required value is missing, a value
/// does not fit its type or domain, or an environment key is not valid for
/// the tool.
pub fn build_request(
    descriptor: &ToolDescriptor,
    values: &ParameterValues,
    environment: &EnvironmentSettings,
) -> Result<InvocationRequest, ProcessError> {
    let mut parameters = Vec::with_capacity(descriptor.parameters().len());
    for (i, p) in descriptor.parameters().iter().enumerate() {
        let value = match values.get(i) {
            Some(ParameterValue::Present(v)) if !v.is_blank() => Some(v),
            _ => None,
        };
        let wire = match (p.role, value) {
            (ParameterRole::Derived, _) => WireValue::Empty,
            (_, Some(v)) => marshal(p, v)?,
            (ParameterRole::Required, None) => match &p.default_value {
                Some(literal) => marshal(p, &ParamValue::parse_literal(p, literal)?)?,
                None => {
                    return Err(ProcessError::MissingRequiredParameter {
                        tool: descriptor.name().to_string(),
                        parameter: p.name.clone(),
                    })
                }
            },
            (ParameterRole::Optional, None) => WireValue::Empty,
        };
        parameters.push(wire);
    }

    let filtered = environments::filter(environment, descriptor.environments());
    if !filtered.rejected.is_empty() {
        let keys: Vec<String> = filtered.rejected.keys().cloned().collect();
        log::warn!(
            "{}: rejecting environment setting(s) {}",
            descriptor.name(),
            keys.join(", ")
        );
        return Err(ProcessError::InvalidEnvironmentKey {
            tool: descriptor.name().to_string(),
            keys,
        });
    }

    Ok(InvocationRequest {
        tool: descriptor.execute_name(),
        parameters,
        environment: filtered
            .applied
            .iter()
            .map(|(k, v)| (k.clone(), marshal_environment(v)))
            .collect(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tools::coded_values::CodedValueMap;
    use crate::tools::values::{LinearUnit, LinearUnitKind};
    use std::sync::Arc;

    fn tool() -> ToolDescriptor {
        let compare = Arc::new(
            CodedValueMap::new([
                ("ALL", "ALL", "All"),
                ("GEOMETRY_ONLY", "GEOMETRY_ONLY", "Geometry only"),
            ])
            .unwrap(),
        );
        ToolDescriptor::builder("Compare", "management")
            .environments(&[environments::WORKSPACE])
            .register_parameter(ParameterDescriptor::required("in_features", GpType::FeatureLayer))
            .unwrap()
            .register_parameter(ParameterDescriptor::optional("compare_type", GpType::string()).coded_values(compare))
            .unwrap()
            .register_parameter(ParameterDescriptor::optional("xy_tolerance", GpType::LinearUnit))
            .unwrap()
            .register_parameter(
                ParameterDescriptor::optional("iterations", GpType::long()).range(Some(1.0), Some(100.0)),
            )
            .unwrap()
            .register_parameter(ParameterDescriptor::derived("status", GpType::boolean()))
            .unwrap()
            .build()
    }

    fn values_with(tool: &ToolDescriptor, assignments: &[(&str, ParamValue)]) -> ParameterValues {
        let mut values = ParameterValues::for_parameters(tool.parameters());
        for (name, v) in assignments {
            let i = tool.position(name).unwrap();
            values.put(i, ParameterValue::Present(v.clone()));
        }
        values
    }

    #[test]
    fn test_linear_unit_unknown() {
        let p = ParameterDescriptor::optional("xy_tolerance", GpType::LinearUnit);
        let wire = marshal(&p, &ParamValue::LinearUnit(LinearUnit::unknown(0.001))).unwrap();
        assert_eq!(wire, WireValue::Text("0.001 Unknown".to_string()));
    }

    #[test]
    fn test_booleans_are_literal_strings() {
        let p = ParameterDescriptor::optional("flag", GpType::boolean());
        assert_eq!(marshal(&p, &ParamValue::Boolean(false)).unwrap(), WireValue::Text("false".to_string()));
    }

    #[test]
    fn test_enum_sends_token_not_label() {
        let map = Arc::new(CodedValueMap::boolean(("CONVERT", "Convert data"), ("PRESERVE", "Preserve")).unwrap());
        let p = ParameterDescriptor::optional("convert_data", GpType::boolean()).coded_values(map);
        assert_eq!(
            marshal(&p, &ParamValue::Member("PRESERVE".to_string())).unwrap(),
            WireValue::Text("false".to_string())
        );
        assert_eq!(
            marshal(&p, &ParamValue::Boolean(true)).unwrap(),
            WireValue::Text("true".to_string())
        );
        assert!(matches!(
            marshal(&p, &ParamValue::Member("MAYBE".to_string())),
            Err(ProcessError::UnknownEnumMember { .. })
        ));
    }

    #[test]
    fn test_raw_token_outside_domain() {
        let t = tool();
        let p = t.parameter("compare_type").unwrap();
        assert!(matches!(
            marshal(p, &ParamValue::text("SCHEMA_ONLY")),
            Err(ProcessError::DomainViolation { .. })
        ));
    }

    #[test]
    fn test_range_violation() {
        let t = tool();
        let p = t.parameter("iterations").unwrap();
        assert!(matches!(
            marshal(p, &ParamValue::Long(0)),
            Err(ProcessError::DomainViolation { .. })
        ));
        assert_eq!(marshal(p, &ParamValue::Long(100)).unwrap(), WireValue::Text("100".to_string()));
    }

    #[test]
    fn test_type_mismatch() {
        let t = tool();
        let p = t.parameter("iterations").unwrap();
        assert!(matches!(
            marshal(p, &ParamValue::text("many")),
            Err(ProcessError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_multivalue_and_value_table() {
        let p = ParameterDescriptor::required("sort_field", GpType::multi_value(GpType::Field));
        let wire = marshal(
            &p,
            &ParamValue::List(vec![ParamValue::text("OBJECTID"), ParamValue::text("NAME")]),
        )
        .unwrap();
        assert_eq!(wire.to_wire_string(), "OBJECTID;NAME");

        let p = ParameterDescriptor::optional(
            "attribute_tolerances",
            GpType::ValueTable(vec![GpType::Field, GpType::double()]),
        );
        let wire = marshal(
            &p,
            &ParamValue::Table(vec![vec![ParamValue::text("LAND USE"), ParamValue::Double(0.5)]]),
        )
        .unwrap();
        assert_eq!(wire, WireValue::Table(vec![vec!["LAND USE".to_string(), "0.5".to_string()]]));
        assert_eq!(wire.to_wire_string(), "'LAND USE' 0.5");

        assert!(matches!(
            marshal(&p, &ParamValue::Table(vec![vec![ParamValue::text("AREA")]])),
            Err(ProcessError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_list_item_with_separator_is_quoted() {
        let p = ParameterDescriptor::required("sort_field", GpType::multi_value(GpType::Field));
        let value = ParamValue::List(vec![ParamValue::text("a;b"), ParamValue::text("c")]);
        let wire = marshal(&p, &value).unwrap();
        assert_eq!(wire.to_wire_string(), "'a;b';c");
        assert_eq!(ParamValue::parse_literal(&p, &wire.to_wire_string()).unwrap(), value);
    }

    #[test]
    fn test_file_extension_domain() {
        let p = ParameterDescriptor::optional("out_compare_file", GpType::File).file_types(&["txt"]);
        assert!(marshal(&p, &ParamValue::text("/tmp/out.txt")).is_ok());
        assert!(matches!(
            marshal(&p, &ParamValue::text("/tmp/out.csv")),
            Err(ProcessError::DomainViolation { .. })
        ));
    }

    #[test]
    fn test_request_is_positional() {
        let t = tool();
        let values = values_with(
            &t,
            &[
                ("in_features", ParamValue::text("roads")),
                (
                    "xy_tolerance",
                    ParamValue::LinearUnit(LinearUnit::new(1.0, LinearUnitKind::Meters)),
                ),
            ],
        );
        let request = build_request(&t, &values, &EnvironmentSettings::new()).unwrap();
        assert_eq!(request.tool, "management.Compare");
        assert_eq!(
            request.parameters,
            vec![
                WireValue::Text("roads".to_string()),
                WireValue::Empty,
                WireValue::Text("1 Meters".to_string()),
                WireValue::Empty,
                WireValue::Empty,
            ]
        );
    }

    #[test]
    fn test_blank_required_value_is_missing() {
        let t = tool();
        let values = values_with(&t, &[("in_features", ParamValue::text("  "))]);
        assert!(matches!(
            build_request(&t, &values, &EnvironmentSettings::new()),
            Err(ProcessError::MissingRequiredParameter { .. })
        ));
    }

    #[test]
    fn test_environment_is_filtered() {
        let t = tool();
        let values = values_with(&t, &[("in_features", ParamValue::text("roads"))]);
        let env = EnvironmentSettings::new().with(environments::WORKSPACE, ParamValue::text("/data/a.gdb"));
        let request = build_request(&t, &values, &env).unwrap();
        assert_eq!(
            request.environment.get(environments::WORKSPACE),
            Some(&WireValue::Text("/data/a.gdb".to_string()))
        );

        let env = env.with(environments::EXTENT, ParamValue::text("0 0 1 1"));
        match build_request(&t, &values, &env) {
            Err(ProcessError::InvalidEnvironmentKey { keys, .. }) => assert_eq!(keys, vec!["extent"]),
            other => panic!("expected InvalidEnvironmentKey, got {:?}", other),
        }
    }

    #[test]
    fn test_payload_round_trips_through_json() {
        let request = InvocationRequest {
            tool: "management.Compare".to_string(),
            parameters: vec![
                WireValue::Text("a".to_string()),
                WireValue::Empty,
                WireValue::List(vec!["x".to_string()]),
                WireValue::Table(vec![vec!["f".to_string(), "1".to_string()]]),
            ],
            environment: BTreeMap::new(),
        };
        let payload = request.to_payload().unwrap();
        let back: InvocationRequest = serde_json::from_slice(&payload).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_redacted_masks_encrypted_strings() {
        let t = ToolDescriptor::builder("Connect", "management")
            .register_parameter(ParameterDescriptor::required(
                "password",
                GpType::Scalar(ScalarType::EncryptedString),
            ))
            .unwrap()
            .build();
        let values = values_with(&t, &[("password", ParamValue::text("hunter2"))]);
        let request = build_request(&t, &values, &EnvironmentSettings::new()).unwrap();
        assert_eq!(request.parameters[0], WireValue::Text("hunter2".to_string()));
        assert_eq!(
            request.redacted(&t).parameters[0],
            WireValue::Text(REDACTED.to_string())
        );
    }
}
