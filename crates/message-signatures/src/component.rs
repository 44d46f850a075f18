// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

//! The covered-component model.
//!
//! The full RFC 9421 component algebra: every derived component name, the
//! `@query-param;name=` family, and HTTP field components carrying any
//! combination of the `sf`/`key`/`bs`/`tr`/`req` flags. Conversion to and
//! from `structured_fields::Item` lives here too, against our own codec
//! crate's types.

use std::fmt;

use structured_fields::{BareItem, Item, Key, Parameters, SfString};

use crate::error::Error;

/// The closed set of derived component names (RFC 9421 §2.2).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DerivedComponentName {
    Method,
    TargetUri,
    Authority,
    Scheme,
    RequestTarget,
    Path,
    Query,
    /// `@query-param`, parameterized by the (already percent-decoded)
    /// query parameter name.
    QueryParam(String),
    Status,
}

impl DerivedComponentName {
    fn wire_name(&self) -> &'static str {
        match self {
            DerivedComponentName::Method => "@method",
            DerivedComponentName::TargetUri => "@target-uri",
            DerivedComponentName::Authority => "@authority",
            DerivedComponentName::Scheme => "@scheme",
            DerivedComponentName::RequestTarget => "@request-target",
            DerivedComponentName::Path => "@path",
            DerivedComponentName::Query => "@query",
            DerivedComponentName::QueryParam(_) => "@query-param",
            DerivedComponentName::Status => "@status",
        }
    }
}

impl fmt::Display for DerivedComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivedComponentName::QueryParam(name) => write!(f, "@query-param;name=\"{name}\""),
            other => write!(f, "{}", other.wire_name()),
        }
    }
}

/// Modifier flags an HTTP field component may carry. `bs` is
/// mutually exclusive with `sf`/`key`: RFC 9421 §2.1.3 treats byte-sequence
/// wrapping and structured-field re-serialization as alternative strategies
/// for the same underlying ambiguity (repeated/irregular field values), not
/// composable ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldFlags {
    pub sf: bool,
    pub key: Option<String>,
    pub bs: bool,
    pub tr: bool,
    pub req: bool,
}

impl FieldFlags {
    fn validate(&self) -> Result<(), Error> {
        if self.bs && (self.sf || self.key.is_some()) {
            return Err(Error::Generic(
                "the `bs` flag cannot be combined with `sf` or `key`".to_string(),
            ));
        }
        if self.sf && self.key.is_some() {
            return Err(Error::Generic(
                "the `sf` flag cannot be combined with `key`".to_string(),
            ));
        }
        Ok(())
    }
}

/// A single entry in a covered-components list: either a derived
/// component or a concrete HTTP field, each carrying its modifier flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CoveredComponent {
    Derived {
        name: DerivedComponentName,
        req: bool,
    },
    Field {
        /// Always lowercase (RFC 9421 §2.1: field names are case-insensitive).
        name: String,
        flags: FieldFlags,
    },
}

impl CoveredComponent {
    pub fn field(name: impl Into<String>, flags: FieldFlags) -> Result<Self, Error> {
        flags.validate()?;
        Ok(CoveredComponent::Field {
            name: name.into().to_ascii_lowercase(),
            flags,
        })
    }

    pub fn derived(name: DerivedComponentName, req: bool) -> Self {
        CoveredComponent::Derived { name, req }
    }

    pub fn is_request_scoped(&self) -> bool {
        match self {
            CoveredComponent::Derived { req, .. } => *req,
            CoveredComponent::Field { flags, .. } => flags.req,
        }
    }

    pub fn is_trailer(&self) -> bool {
        matches!(self, CoveredComponent::Field { flags, .. } if flags.tr)
    }

    /// The canonical component identifier as it appears as a quoted string
    /// in the signature base: the component name itself, lowercase for
    /// fields.
    pub fn base_name(&self) -> String {
        match self {
            CoveredComponent::Derived { name, .. } => name.wire_name().to_string(),
            CoveredComponent::Field { name, .. } => name.clone(),
        }
    }
}

fn flag_parameters(component: &CoveredComponent) -> Parameters {
    let mut params = Parameters::new();
    let (sf, key, bs, tr, req) = match component {
        CoveredComponent::Derived { name, req } => (
            false,
            if let DerivedComponentName::QueryParam(n) = name {
                Some(n.clone())
            } else {
                None
            },
            false,
            false,
            *req,
        ),
        CoveredComponent::Field { flags, .. } => {
            (flags.sf, flags.key.clone(), flags.bs, flags.tr, flags.req)
        }
    };

    let insert_flag = |params: &mut Parameters, name: &str, present: bool| {
        if present {
            params.insert(Key::new(name).expect("static ASCII key"), BareItem::Boolean(true));
        }
    };

    if matches!(component, CoveredComponent::Derived { name: DerivedComponentName::QueryParam(_), .. }) {
        if let Some(name) = key {
            params.insert(
                Key::new("name").expect("static ASCII key"),
                BareItem::String(SfString::new(name).expect("query parameter name is valid sf-string")),
            );
        }
    } else if let Some(member) = key {
        params.insert(
            Key::new("key").expect("static ASCII key"),
            BareItem::String(
                SfString::new(member).unwrap_or_else(|_| SfString::new("").expect("empty string is always valid")),
            ),
        );
    }

    insert_flag(&mut params, "sf", sf);
    insert_flag(&mut params, "bs", bs);
    insert_flag(&mut params, "tr", tr);
    insert_flag(&mut params, "req", req);
    params
}

/// Renders this component as the `structured_fields::Item` that appears
/// both in the `@signature-params` inner list and, with its name in lower
/// case, as the left side of its signature base line.
pub fn to_item(component: &CoveredComponent) -> Item {
    Item {
        bare_item: BareItem::String(
            SfString::new(component.base_name()).expect("component names are ASCII visible characters"),
        ),
        params: flag_parameters(component),
    }
}

fn as_bool_param(params: &Parameters, name: &str) -> Result<bool, Error> {
    match params.get(name) {
        None => Ok(false),
        Some(BareItem::Boolean(b)) => Ok(*b),
        Some(_) => Err(Error::Generic(format!("`{name}` parameter must be a boolean"))),
    }
}

fn as_string_param(params: &Parameters, name: &str) -> Result<Option<String>, Error> {
    match params.get(name) {
        None => Ok(None),
        Some(BareItem::String(s)) => Ok(Some(s.as_str().to_string())),
        Some(_) => Err(Error::Generic(format!("`{name}` parameter must be a string"))),
    }
}

/// Rejects any parameter name outside `allowed` — descriptors reject
/// unknown parameters at construction (spec.md §4.2: `@query-param`
/// accepts only `name`/`req`, other derived components accept only `req`,
/// field components accept only `{key, sf, req, bs, tr}`).
fn check_allowed_params(params: &Parameters, allowed: &[&str], component: &str) -> Result<(), Error> {
    for (key, _) in params.iter() {
        if !allowed.contains(&key.as_str()) {
            return Err(Error::Generic(format!(
                "`{}` is not a valid parameter for `{component}`",
                key.as_str()
            )));
        }
    }
    Ok(())
}

/// Parses one entry of a `Signature-Input` covered-components list back
/// into a `CoveredComponent`; the inverse of `to_item`, used while
/// verifying.
pub fn from_item(item: &Item) -> Result<CoveredComponent, Error> {
    let name = match &item.bare_item {
        BareItem::String(s) => s.as_str().to_string(),
        other => {
            return Err(Error::Generic(format!(
                "covered component name must be a string, found {other:?}"
            )));
        }
    };

    if let Some(rest) = name.strip_prefix('@') {
        if rest == "query-param" {
            check_allowed_params(&item.params, &["name", "req"], "@query-param")?;
        } else {
            check_allowed_params(&item.params, &["req"], &name)?;
        }

        let req = as_bool_param(&item.params, "req")?;
        let derived = match rest {
            "method" => DerivedComponentName::Method,
            "target-uri" => DerivedComponentName::TargetUri,
            "authority" => DerivedComponentName::Authority,
            "scheme" => DerivedComponentName::Scheme,
            "request-target" => DerivedComponentName::RequestTarget,
            "path" => DerivedComponentName::Path,
            "query" => DerivedComponentName::Query,
            "status" => DerivedComponentName::Status,
            "query-param" => {
                let query_name = as_string_param(&item.params, "name")?.ok_or_else(|| {
                    Error::Generic("`@query-param` requires a `name` parameter".to_string())
                })?;
                DerivedComponentName::QueryParam(query_name)
            }
            other => return Err(Error::Generic(format!("unknown derived component `@{other}`"))),
        };
        return Ok(CoveredComponent::Derived { name: derived, req });
    }

    check_allowed_params(&item.params, &["key", "sf", "req", "bs", "tr"], &name)?;

    let flags = FieldFlags {
        sf: as_bool_param(&item.params, "sf")?,
        key: as_string_param(&item.params, "key")?,
        bs: as_bool_param(&item.params, "bs")?,
        tr: as_bool_param(&item.params, "tr")?,
        req: as_bool_param(&item.params, "req")?,
    };
    CoveredComponent::field(name, flags)
}
