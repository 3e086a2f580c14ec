/*
This code is part of the GP Tools geoprocessing runtime.
Authors: GP Tools developers
Created: 29/09/2026
Last Modified: 16/10/2026
License: MIT
*/

use super::errors::ProcessError;
use super::parameters::{GpType, ParameterDescriptor, ParameterRole, ScalarType};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

/// Wire format for dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Separator between the items of a multivalue and the rows of a value table.
pub const LIST_SEPARATOR: char = ';';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearUnitKind {
    /// Use the native unit of the input data.
    Unknown,
    Inches,
    Feet,
    Yards,
    Miles,
    NauticalMiles,
    Millimeters,
    Centimeters,
    Decimeters,
    Meters,
    Kilometers,
    DecimalDegrees,
    Points,
}

impl LinearUnitKind {
    const ALL: [LinearUnitKind; 13] = [
        LinearUnitKind::Unknown,
        LinearUnitKind::Inches,
        LinearUnitKind::Feet,
        LinearUnitKind::Yards,
        LinearUnitKind::Miles,
        LinearUnitKind::NauticalMiles,
        LinearUnitKind::Millimeters,
        LinearUnitKind::Centimeters,
        LinearUnitKind::Decimeters,
        LinearUnitKind::Meters,
        LinearUnitKind::Kilometers,
        LinearUnitKind::DecimalDegrees,
        LinearUnitKind::Points,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            LinearUnitKind::Unknown => "Unknown",
            LinearUnitKind::Inches => "Inches",
            LinearUnitKind::Feet => "Feet",
            LinearUnitKind::Yards => "Yards",
            LinearUnitKind::Miles => "Miles",
            LinearUnitKind::NauticalMiles => "NauticalMiles",
            LinearUnitKind::Millimeters => "Millimeters",
            LinearUnitKind::Centimeters => "Centimeters",
            LinearUnitKind::Decimeters => "Decimeters",
            LinearUnitKind::Meters => "Meters",
            LinearUnitKind::Kilometers => "Kilometers",
            LinearUnitKind::DecimalDegrees => "DecimalDegrees",
            LinearUnitKind::Points => "Points",
        }
    }
}

impl FromStr for LinearUnitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<LinearUnitKind, String> {
        let s = s.trim();
        LinearUnitKind::ALL
            .iter()
            .find(|u| u.wire_name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown linear unit '{}'", s))
    }
}

/// A distance, rendered on the wire as `"<magnitude> <unit>"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearUnit {
    pub value: f64,
    pub unit: LinearUnitKind,
}

impl LinearUnit {
    pub fn new(value: f64, unit: LinearUnitKind) -> LinearUnit {
        LinearUnit { value, unit }
    }

    /// A distance in the native unit of the data.
    pub fn unknown(value: f64) -> LinearUnit {
        LinearUnit::new(value, LinearUnitKind::Unknown)
    }
}

impl fmt::Display for LinearUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.wire_name())
    }
}

impl FromStr for LinearUnit {
    type Err = String;

    /// Parses `"5 Meters"`; a bare number is taken in native units.
    fn from_str(s: &str) -> Result<LinearUnit, String> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        let (magnitude, unit) = match parts.as_slice() {
            [magnitude] => (*magnitude, LinearUnitKind::Unknown),
            [magnitude, unit] => (*magnitude, unit.parse()?),
            _ => return Err(format!("'{}' is not a linear unit", s)),
        };
        let value = magnitude
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", magnitude))?;
        if !value.is_finite() {
            return Err(format!("'{}' is not a finite distance", magnitude));
        }
        Ok(LinearUnit { value, unit })
    }
}

/// A rectangular extent, rendered as `"xmin ymin xmax ymax"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {} {}", self.xmin, self.ymin, self.xmax, self.ymax)
    }
}

impl FromStr for Extent {
    type Err = String;

    fn from_str(s: &str) -> Result<Extent, String> {
        let coords = s
            .split_whitespace()
            .map(|c| c.parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|_| format!("'{}' is not an extent", s))?;
        if coords.len() != 4 {
            return Err(format!("an extent needs four coordinates, found {}", coords.len()));
        }
        let extent = Extent {
            xmin: coords[0],
            ymin: coords[1],
            xmax: coords[2],
            ymax: coords[3],
        };
        if extent.xmin > extent.xmax || extent.ymin > extent.ymax {
            return Err(format!("'{}' has its minimum above its maximum", s));
        }
        Ok(extent)
    }
}

/// A loosely typed value held for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Strings, paths, layer and table names, spatial references.
    Text(String),
    Boolean(bool),
    Long(i64),
    Double(f64),
    Date(NaiveDateTime),
    LinearUnit(LinearUnit),
    Extent(Extent),
    /// Symbolic member of the parameter's coded-value map.
    Member(String),
    List(Vec<ParamValue>),
    Table(Vec<Vec<ParamValue>>),
}

impl ParamValue {
    pub fn text(s: &str) -> ParamValue {
        ParamValue::Text(s.to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Text(_) => "text",
            ParamValue::Boolean(_) => "boolean",
            ParamValue::Long(_) => "long",
            ParamValue::Double(_) => "double",
            ParamValue::Date(_) => "date",
            ParamValue::LinearUnit(_) => "linear unit",
            ParamValue::Extent(_) => "extent",
            ParamValue::Member(_) => "coded member",
            ParamValue::List(_) => "list",
            ParamValue::Table(_) => "value table",
        }
    }

    /// Blank text and empty collections count as "no value".
    pub fn is_blank(&self) -> bool {
        match self {
            ParamValue::Text(s) => s.trim().is_empty(),
            ParamValue::List(items) => items.is_empty(),
            ParamValue::Table(rows) => rows.is_empty(),
            _ => false,
        }
    }

    /// Renders a single value as text without consulting a coded-value map.
    pub fn to_literal(&self) -> String {
        match self {
            ParamValue::Text(s) | ParamValue::Member(s) => s.clone(),
            ParamValue::Boolean(b) => b.to_string(),
            ParamValue::Long(n) => n.to_string(),
            ParamValue::Double(d) => d.to_string(),
            ParamValue::Date(d) => d.format(DATE_FORMAT).to_string(),
            ParamValue::LinearUnit(lu) => lu.to_string(),
            ParamValue::Extent(e) => e.to_string(),
            ParamValue::List(items) => items
                .iter()
                .map(|i| quote_cell(&i.to_literal()))
                .collect::<Vec<String>>()
                .join(&LIST_SEPARATOR.to_string()),
            ParamValue::Table(rows) => rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|c| quote_cell(&c.to_literal()))
                        .collect::<Vec<String>>()
                        .join(" ")
                })
                .collect::<Vec<String>>()
                .join(&LIST_SEPARATOR.to_string()),
        }
    }

    /// Parses a literal (a default value, a command-line argument or a raw
    /// engine token) according to the parameter's declared type and domain.
    /// Coded values accept a member name, a token or a label.
    pub fn parse_literal(parameter: &ParameterDescriptor, text: &str) -> Result<ParamValue, ProcessError> {
        parse_typed(parameter, &parameter.data_type, text, true)
    }
}

pub(crate) fn type_mismatch(parameter: &ParameterDescriptor, expected: &GpType, found: &str) -> ProcessError {
    ProcessError::TypeMismatch {
        parameter: parameter.name.clone(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

pub(crate) fn parse_typed(
    parameter: &ParameterDescriptor,
    ty: &GpType,
    text: &str,
    apply_domain: bool,
) -> Result<ParamValue, ProcessError> {
    let coded = if apply_domain {
        parameter.domain.coded_values.as_ref()
    } else {
        None
    };
    let trimmed = text.trim();
    match ty {
        GpType::MultiValue(inner) => {
            let items = split_list(trimmed)
                .iter()
                .map(|s| parse_typed(parameter, inner, unquote(s), apply_domain))
                .collect::<Result<Vec<ParamValue>, ProcessError>>()?;
            Ok(ParamValue::List(items))
        }
        GpType::ValueTable(columns) => {
            let mut rows = vec![];
            for row in split_list(trimmed) {
                let row = row.as_str();
                let cells = split_cells(row);
                if cells.len() != columns.len() {
                    return Err(type_mismatch(
                        parameter,
                        ty,
                        &format!("a row of {} cells ('{}')", cells.len(), row),
                    ));
                }
                let parsed = cells
                    .iter()
                    .zip(columns.iter())
                    .map(|(cell, column)| parse_typed(parameter, column, cell, false))
                    .collect::<Result<Vec<ParamValue>, ProcessError>>()?;
                rows.push(parsed);
            }
            Ok(ParamValue::Table(rows))
        }
        GpType::Composite(members) => members
            .iter()
            .find_map(|m| parse_typed(parameter, m, text, false).ok())
            .ok_or_else(|| type_mismatch(parameter, ty, &format!("'{}'", trimmed))),
        _ if coded.is_some() => {
            match coded.and_then(|m| m.lookup_literal(trimmed)) {
                Some(entry) => Ok(ParamValue::Member(entry.member.clone())),
                None => Err(ProcessError::DomainViolation {
                    parameter: parameter.name.clone(),
                    reason: format!("'{}' is not one of the coded values", trimmed),
                }),
            }
        }
        GpType::Scalar(ScalarType::Boolean) => {
            if trimmed.eq_ignore_ascii_case("true") {
                Ok(ParamValue::Boolean(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok(ParamValue::Boolean(false))
            } else {
                Err(type_mismatch(parameter, ty, &format!("'{}'", trimmed)))
            }
        }
        GpType::Scalar(ScalarType::Long) => trimmed
            .parse::<i64>()
            .map(ParamValue::Long)
            .map_err(|_| type_mismatch(parameter, ty, &format!("'{}'", trimmed))),
        GpType::Scalar(ScalarType::Double) => match trimmed.parse::<f64>() {
            Ok(d) if d.is_finite() => Ok(ParamValue::Double(d)),
            _ => Err(type_mismatch(parameter, ty, &format!("'{}'", trimmed))),
        },
        GpType::Scalar(ScalarType::Date) => NaiveDateTime::parse_from_str(trimmed, DATE_FORMAT)
            .or_else(|_| {
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                    .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
            })
            .map(ParamValue::Date)
            .map_err(|_| type_mismatch(parameter, ty, &format!("'{}'", trimmed))),
        GpType::LinearUnit => trimmed
            .parse::<LinearUnit>()
            .map(ParamValue::LinearUnit)
            .map_err(|e| type_mismatch(parameter, ty, &e)),
        GpType::Extent => trimmed
            .parse::<Extent>()
            .map(ParamValue::Extent)
            .map_err(|e| type_mismatch(parameter, ty, &e)),
        GpType::Scalar(ScalarType::String)
        | GpType::Scalar(ScalarType::EncryptedString)
        | GpType::SpatialReference
        | GpType::FeatureLayer
        | GpType::Table
        | GpType::Field
        | GpType::File
        | GpType::Folder => Ok(ParamValue::Text(text.to_string())),
    }
}

/// Quotes a value-table cell that contains a space or separator.
pub(crate) fn quote_cell(cell: &str) -> String {
    if cell.is_empty() || cell.contains(' ') || cell.contains(LIST_SEPARATOR) {
        format!("'{}'", cell)
    } else {
        cell.to_string()
    }
}

pub(crate) fn unquote(s: &str) -> &str {
    s.strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(s)
}

/// Splits list text on `;` outside single quotes. Segments are trimmed and
/// keep their quotes; blank segments are dropped.
pub(crate) fn split_list(text: &str) -> Vec<String> {
    let mut items = vec![];
    let mut current = String::new();
    let mut quoted = false;
    for c in text.chars() {
        match c {
            '\'' => {
                quoted = !quoted;
                current.push(c);
            }
            LIST_SEPARATOR if !quoted => items.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    items.push(current);
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Splits a value-table row on whitespace, keeping single-quoted cells whole.
fn split_cells(row: &str) -> Vec<String> {
    let mut cells = vec![];
    let mut current = String::new();
    let mut quoted = false;
    let mut had_quotes = false;
    for c in row.chars() {
        match c {
            '\'' => {
                quoted = !quoted;
                had_quotes = true;
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() || had_quotes {
                    cells.push(std::mem::take(&mut current));
                }
                had_quotes = false;
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() || had_quotes {
        cells.push(current);
    }
    cells
}

/// State of one parameter slot on a tool instance.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// An input parameter the caller has not supplied.
    Absent,
    Present(ParamValue),
    /// A derived parameter before a successful execution.
    NotComputed,
    /// A derived value whose coded token was not recognised; the raw token is kept.
    Unrecognized(String),
}

impl ParameterValue {
    pub fn value(&self) -> Option<&ParamValue> {
        match self {
            ParameterValue::Present(v) => Some(v),
            _ => None,
        }
    }

    fn initial(role: ParameterRole) -> ParameterValue {
        match role {
            ParameterRole::Derived => ParameterValue::NotComputed,
            _ => ParameterValue::Absent,
        }
    }
}

/// The mutable values of one tool instance, aligned with the descriptor's
/// parameter order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterValues {
    slots: Vec<ParameterValue>,
}

impl ParameterValues {
    pub fn for_parameters(parameters: &[ParameterDescriptor]) -> ParameterValues {
        ParameterValues {
            slots: parameters.iter().map(|p| ParameterValue::initial(p.role)).collect(),
        }
    }

    pub fn get(&self, position: usize) -> Option<&ParameterValue> {
        self.slots.get(position)
    }

    pub(crate) fn put(&mut self, position: usize, value: ParameterValue) {
        if let Some(slot) = self.slots.get_mut(position) {
            *slot = value;
        }
    }

    pub fn as_slice(&self) -> &[ParameterValue] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
