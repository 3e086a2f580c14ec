/*
This code is part of the GP Tools geoprocessing runtime.
Authors: GP Tools developers
Created: 02/10/2026
Last Modified: 14/10/2026
License: MIT
*/

use super::errors::{CodecError, DescriptorError};
use serde::Serialize;

/// One entry of a coded-value domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodedValue {
    /// Symbolic member name, e.g. `NO_DIFFERENCES_FOUND`.
    pub member: String,
    /// Literal the engine sends and expects, e.g. `true`.
    pub token: String,
    /// Human readable description.
    pub label: String,
}

/// Ordered, bidirectional mapping between symbolic members and wire tokens.
///
/// Tokens are unique ignoring ASCII case, so decoding is unambiguous even
/// when the engine changes the casing of a token (`True` vs `true`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CodedValueMap {
    entries: Vec<CodedValue>,
}

impl CodedValueMap {
    /// Builds a map from `(member, token, label)` triples.
    pub fn new<'a, I>(entries: I) -> Result<CodedValueMap, DescriptorError>
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    {
        let mut map = CodedValueMap { entries: vec![] };
        for (member, token, label) in entries {
            if map.entries.iter().any(|e| e.member == member) {
                return Err(DescriptorError::DuplicateMember {
                    member: member.to_string(),
                });
            }
            if map
                .entries
                .iter()
                .any(|e| e.token.eq_ignore_ascii_case(token))
            {
                return Err(DescriptorError::DuplicateToken {
                    token: token.to_string(),
                });
            }
            map.entries.push(CodedValue {
                member: member.to_string(),
                token: token.to_string(),
                label: label.to_string(),
            });
        }
        if map.entries.is_empty() {
            return Err(DescriptorError::EmptyCodedValues);
        }
        Ok(map)
    }

    /// The two-member pattern used by boolean parameters, where the member
    /// names differ per parameter but the tokens are always `true`/`false`.
    pub fn boolean(
        true_member: (&str, &str),
        false_member: (&str, &str),
    ) -> Result<CodedValueMap, DescriptorError> {
        CodedValueMap::new([
            (true_member.0, "true", true_member.1),
            (false_member.0, "false", false_member.1),
        ])
    }

    pub fn encode(&self, member: &str) -> Result<&str, CodecError> {
        self.entries
            .iter()
            .find(|e| e.member == member)
            .map(|e| e.token.as_str())
            .ok_or_else(|| CodecError::UnknownEnumMember {
                member: member.to_string(),
            })
    }

    pub fn decode(&self, token: &str) -> Result<&str, CodecError> {
        let token = token.trim();
        self.entries
            .iter()
            .find(|e| e.token == token)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.token.eq_ignore_ascii_case(token))
            })
            .map(|e| e.member.as_str())
            .ok_or_else(|| CodecError::UnrecognizedToken {
                token: token.to_string(),
            })
    }

    /// Resolves free text typed by a user: a member name, a token or a label.
    pub fn lookup_literal(&self, text: &str) -> Option<&CodedValue> {
        let text = text.trim();
        self.entries
            .iter()
            .find(|e| e.member == text || e.token == text)
            .or_else(|| {
                self.entries.iter().find(|e| {
                    e.member.eq_ignore_ascii_case(text)
                        || e.token.eq_ignore_ascii_case(text)
                        || e.label.eq_ignore_ascii_case(text)
                })
            })
    }

    pub fn contains_token(&self, token: &str) -> bool {
        self.decode(token).is_ok()
    }

    /// True when the tokens are exactly `true` and `false`.
    pub fn is_boolean(&self) -> bool {
        self.entries.len() == 2 && self.contains_token("true") && self.contains_token("false")
    }

    pub fn entries(&self) -> &[CodedValue] {
        &self.entries
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.member.as_str())
    }
}

/// A Rust enum whose variants are the members of a coded-value domain.
/// Implemented by the `coded_enum!` macro.
pub trait CodedEnum: Sized + Copy + 'static {
    /// `(member, token, label)` for every variant, in declaration order.
    const MEMBERS: &'static [(&'static str, &'static str, &'static str)];

    fn member(&self) -> &'static str;

    fn from_member(member: &str) -> Option<Self>;

    fn coded_value_map() -> Result<CodedValueMap, DescriptorError> {
        CodedValueMap::new(Self::MEMBERS.iter().copied())
    }
}

/// Declares an enum bound to a coded-value domain.
///
/// ```
/// gp_tools::coded_enum! {
///     pub enum ConvertData {
///         Convert => ("CONVERT", "true", "Convert data to a file geodatabase"),
///         Preserve => ("PRESERVE", "false", "Preserve the input format"),
///     }
/// }
/// ```
#[macro_export]
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => ($member:literal, $token:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $crate::tools::coded_values::CodedEnum for $name {
            const MEMBERS: &'static [(&'static str, &'static str, &'static str)] =
                &[$(($member, $token, $label)),+];

            fn member(&self) -> &'static str {
                match self {
                    $($name::$variant => $member),+
                }
            }

            fn from_member(member: &str) -> Option<Self> {
                match member {
                    $($member => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

#[cfg(test)]
mod test {
    use super::*;

    crate::coded_enum! {
        enum CompareStatus {
            NoDifferencesFound => ("NO_DIFFERENCES_FOUND", "true", "No differences found"),
            DifferencesFound => ("DIFFERENCES_FOUND", "false", "Differences found"),
        }
    }

    crate::coded_enum! {
        enum ConvertData {
            Convert => ("CONVERT", "true", "Convert data"),
            Preserve => ("PRESERVE", "false", "Preserve data"),
        }
    }

    #[test]
    fn test_round_trip_every_member() {
        let map = CompareStatus::coded_value_map().unwrap();
        for member in map.members() {
            let token = map.encode(member).unwrap();
            assert_eq!(map.decode(token).unwrap(), member);
        }
    }

    #[test]
    fn test_encode_unknown_member() {
        let map = CompareStatus::coded_value_map().unwrap();
        assert_eq!(
            map.encode("MAYBE"),
            Err(CodecError::UnknownEnumMember {
                member: "MAYBE".to_string()
            })
        );
    }

    #[test]
    fn test_decode_unrecognized_token() {
        let map = CompareStatus::coded_value_map().unwrap();
        assert_eq!(
            map.decode("PARTIAL"),
            Err(CodecError::UnrecognizedToken {
                token: "PARTIAL".to_string()
            })
        );
    }

    #[test]
    fn test_decode_ignores_token_case() {
        let map = CompareStatus::coded_value_map().unwrap();
        assert_eq!(map.decode("True").unwrap(), "NO_DIFFERENCES_FOUND");
    }

    #[test]
    fn test_boolean_maps_are_keyed_per_parameter() {
        let status = CompareStatus::coded_value_map().unwrap();
        let convert = ConvertData::coded_value_map().unwrap();
        assert!(status.is_boolean());
        assert!(convert.is_boolean());
        assert_eq!(status.decode("true").unwrap(), "NO_DIFFERENCES_FOUND");
        assert_eq!(convert.decode("true").unwrap(), "CONVERT");
        assert!(convert.encode("NO_DIFFERENCES_FOUND").is_err());
    }

    #[test]
    fn test_duplicate_token_rejected() {
        let res = CodedValueMap::new([("A", "x", "A"), ("B", "X", "B")]);
        assert_eq!(
            res,
            Err(DescriptorError::DuplicateToken {
                token: "X".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let res = CodedValueMap::new([("A", "x", "A"), ("A", "y", "A")]);
        assert!(matches!(res, Err(DescriptorError::DuplicateMember { .. })));
    }

    #[test]
    fn test_empty_map_rejected() {
        let res = CodedValueMap::new(std::iter::empty());
        assert_eq!(res, Err(DescriptorError::EmptyCodedValues));
    }

    #[test]
    fn test_lookup_literal_accepts_member_token_and_label() {
        let map = ConvertData::coded_value_map().unwrap();
        assert_eq!(map.lookup_literal("PRESERVE").unwrap().token, "false");
        assert_eq!(map.lookup_literal("true").unwrap().member, "CONVERT");
        assert_eq!(map.lookup_literal("preserve data").unwrap().member, "PRESERVE");
        assert!(map.lookup_literal("KEEP").is_none());
    }

    #[test]
    fn test_typed_enum_members() {
        assert_eq!(ConvertData::Convert.member(), "CONVERT");
        assert_eq!(ConvertData::from_member("PRESERVE"), Some(ConvertData::Preserve));
        assert_eq!(ConvertData::from_member("true"), None);
    }
}
