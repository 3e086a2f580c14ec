/*
This code is part of the GP Tools geoprocessing runtime.
Authors: GP Tools developers
Created: 03/10/2026
Last Modified: 16/10/2026
License: MIT
*/

use super::errors::ProcessError;
use super::invocation::WireValue;
use super::parameters::{GpType, ParameterDescriptor, ParameterRole, ToolDescriptor};
use super::values::{parse_typed, split_list, type_mismatch, unquote, ParamValue, ParameterValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Succeeded,
    Failed,
}

/// What the engine sends back for one invocation.
///
/// Derived values are looked up by parameter name in `outputs` first and
/// then by position in `values`, where the position counts derived
/// parameters only.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InvocationResult {
    pub status: ExecutionStatus,
    #[serde(default)]
    pub values: Vec<WireValue>,
    #[serde(default)]
    pub outputs: BTreeMap<String, WireValue>,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl InvocationResult {
    pub fn succeeded(values: Vec<WireValue>) -> InvocationResult {
        InvocationResult {
            status: ExecutionStatus::Succeeded,
            values,
            outputs: BTreeMap::new(),
            messages: vec![],
        }
    }

    pub fn failed(messages: Vec<String>) -> InvocationResult {
        InvocationResult {
            status: ExecutionStatus::Failed,
            values: vec![],
            outputs: BTreeMap::new(),
            messages,
        }
    }

    pub fn with_output(mut self, name: &str, value: WireValue) -> InvocationResult {
        self.outputs.insert(name.to_string(), value);
        self
    }

    pub fn with_message(mut self, message: &str) -> InvocationResult {
        self.messages.push(message.to_string());
        self
    }

    fn lookup(&self, name: &str, ordinal: usize) -> Option<&WireValue> {
        self.outputs
            .get(name)
            .or_else(|| {
                self.outputs
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .or_else(|| self.values.get(ordinal))
    }
}

/// A derived value that came back with a token outside its coded-value map.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DecodeWarning {
    pub parameter: String,
    pub token: String,
}

/// Decoded derived values, keyed by parameter position, ready to be committed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedOutputs {
    pub values: Vec<(usize, ParameterValue)>,
    pub warnings: Vec<DecodeWarning>,
}

fn decode_coded(
    parameter: &ParameterDescriptor,
    token: &str,
    warnings: &mut Vec<DecodeWarning>,
) -> Option<ParamValue> {
    let map = parameter.domain.coded_values.as_ref()?;
    match map.decode(token) {
        Ok(member) => Some(ParamValue::Member(member.to_string())),
        Err(_) => {
            log::warn!(
                "parameter '{}' returned unrecognized token '{}'",
                parameter.name,
                token.trim()
            );
            warnings.push(DecodeWarning {
                parameter: parameter.name.clone(),
                token: token.trim().to_string(),
            });
            None
        }
    }
}

fn decode_value(
    parameter: &ParameterDescriptor,
    wire: &WireValue,
    warnings: &mut Vec<DecodeWarning>,
) -> Result<ParameterValue, ProcessError> {
    let ty = &parameter.data_type;
    let coded = parameter.domain.coded_values.is_some();
    match (ty, wire) {
        (_, WireValue::Empty) => Ok(ParameterValue::NotComputed),
        (GpType::MultiValue(inner), WireValue::List(items)) => {
            let mut decoded = Vec::with_capacity(items.len());
            let mut unrecognized = false;
            for item in items {
                if coded {
                    match decode_coded(parameter, item, warnings) {
                        Some(v) => decoded.push(v),
                        None => unrecognized = true,
                    }
                } else {
                    decoded.push(parse_typed(parameter, inner, item, false)?);
                }
            }
            if unrecognized {
                Ok(ParameterValue::Unrecognized(wire.to_wire_string()))
            } else {
                Ok(ParameterValue::Present(ParamValue::List(decoded)))
            }
        }
        (GpType::MultiValue(_), WireValue::Text(text)) => {
            let items = split_list(text).iter().map(|s| unquote(s).to_string()).collect();
            decode_value(parameter, &WireValue::List(items), warnings)
        }
        (GpType::ValueTable(columns), WireValue::Table(rows)) => {
            let mut decoded = Vec::with_capacity(rows.len());
            for row in rows {
                if row.len() != columns.len() {
                    return Err(type_mismatch(parameter, ty, &format!("a row of {} cells", row.len())));
                }
                let cells = row
                    .iter()
                    .zip(columns.iter())
                    .map(|(cell, column)| parse_typed(parameter, column, cell, false))
                    .collect::<Result<Vec<ParamValue>, ProcessError>>()?;
                decoded.push(cells);
            }
            Ok(ParameterValue::Present(ParamValue::Table(decoded)))
        }
        (GpType::ValueTable(_), WireValue::Text(text)) => {
            parse_typed(parameter, ty, text, false).map(ParameterValue::Present)
        }
        (_, WireValue::Text(token)) if coded => Ok(match decode_coded(parameter, token, warnings) {
            Some(v) => ParameterValue::Present(v),
            None => ParameterValue::Unrecognized(token.trim().to_string()),
        }),
        (_, WireValue::Text(text)) => parse_typed(parameter, ty, text, false).map(ParameterValue::Present),
        (_, WireValue::List(_)) => Err(type_mismatch(parameter, ty, "a list")),
        (_, WireValue::Table(_)) => Err(type_mismatch(parameter, ty, "a value table")),
    }
}

/// Decodes the derived values of a successful result.
///
/// Nothing is written to the tool instance here; the caller commits the
/// returned values only when decoding as a whole succeeded. An unrecognized
/// coded token is not an error: the slot keeps the raw token and a warning
/// is reported.
pub fn decode(result: &InvocationResult, descriptor: &ToolDescriptor) -> Result<DecodedOutputs, ProcessError> {
    let mut ret = DecodedOutputs::default();
    let derived = descriptor
        .parameters()
        .iter()
        .enumerate()
        .filter(|(_, p)| p.role == ParameterRole::Derived);
    for (ordinal, (position, p)) in derived.enumerate() {
        let decoded = match result.lookup(&p.name, ordinal) {
            Some(wire) => decode_value(p, wire, &mut ret.warnings)?,
            None => ParameterValue::NotComputed,
        };
        let decoded = match (decoded, &p.default_value) {
            (ParameterValue::NotComputed, Some(literal)) => {
                ParameterValue::Present(ParamValue::parse_literal(p, literal)?)
            }
            (other, _) => other,
        };
        ret.values.push((position, decoded));
    }
    Ok(ret)
}
