// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

//! The verification engine.
//!
//! Label- or tag-based selection over the full algorithm registry, with
//! explicit required/forbidden parameter and component checks and a single
//! clock read for every time-based check.

use crate::algorithm::SignatureAlgorithm;
use crate::base::SignatureBaseSpec;
use crate::clock::Clock;
use crate::component::{self, CoveredComponent};
use crate::context::SignatureContext;
use crate::error::Error;
use crate::key::{self, PublicKeyInfo};
use crate::params::SignatureParameters;

/// How to pick which labeled entry of `Signature-Input`/`Signature` to
/// verify. Exactly one selector should be set; `None, None` requires there
/// to be exactly one signature present.
#[derive(Debug, Default, Clone)]
pub struct SignatureSelector {
    pub label: Option<String>,
    pub tag: Option<String>,
}

/// Everything that constrains what counts as an acceptable signature
/// beyond "the bytes verify".
pub struct VerificationSpec {
    pub selector: SignatureSelector,
    pub required_components: Vec<CoveredComponent>,
    /// Components that must be covered only when they currently resolve
    /// against the context; absent-from-context components in this list
    /// are not an error.
    pub required_if_present_components: Vec<CoveredComponent>,
    pub required_parameters: Vec<&'static str>,
    pub forbidden_parameters: Vec<&'static str>,
    pub max_age_seconds: Option<i64>,
    pub max_skew_seconds: Option<i64>,
}

pub struct VerificationOutcome {
    pub label: String,
    pub parameters: SignatureParameters,
    pub signature_base: String,
}

/// Either `label` or `tag` must be set at build time; that is a local
/// validation error, not an over-the-wire one, so it is checked once up
/// front in `verify()`.
fn select_entry<'a>(
    signature_input: &'a structured_fields::Dictionary,
    selector: &SignatureSelector,
) -> Result<(&'a str, &'a structured_fields::InnerList), Error> {
    let entries: Vec<(&str, &structured_fields::InnerList)> = signature_input
        .iter()
        .filter_map(|(label, entry)| entry.as_inner_list().map(|inner| (label.as_str(), inner)))
        .collect();

    if let (Some(label), Some(tag)) = (&selector.label, &selector.tag) {
        let (found_label, inner) = entries
            .into_iter()
            .find(|(l, _)| *l == label.as_str())
            .ok_or(Error::MissingDictionaryKey(label.clone()))?;
        if inner.params.get("tag").and_then(|v| v.as_str()) != Some(tag.as_str()) {
            return Err(Error::MissingTag);
        }
        return Ok((found_label, inner));
    }

    if let Some(label) = &selector.label {
        return entries
            .into_iter()
            .find(|(l, _)| *l == label.as_str())
            .ok_or_else(|| Error::MissingDictionaryKey(label.clone()));
    }

    if let Some(tag) = &selector.tag {
        let mut matches = entries
            .into_iter()
            .filter(|(_, inner)| inner.params.get("tag").and_then(|v| v.as_str()) == Some(tag.as_str()));
        let first = matches.next().ok_or(Error::MissingTag)?;
        if matches.next().is_some() {
            return Err(Error::DuplicateTag);
        }
        return Ok(first);
    }

    Err(Error::Generic(
        "a signature selector must specify a label or a tag".to_string(),
    ))
}

/// The inner-list items (component name plus its flags) must be
/// pairwise distinct.
fn check_components_unique(components: &[CoveredComponent]) -> Result<(), Error> {
    for (i, a) in components.iter().enumerate() {
        for b in &components[i + 1..] {
            if a == b {
                return Err(Error::InvalidStructuredHeader(format!(
                    "duplicate covered component `{}`",
                    a.base_name()
                )));
            }
        }
    }
    Ok(())
}

pub fn verify(
    spec: &VerificationSpec,
    context: &SignatureContext,
    signature_input_header: &str,
    signature_header: &str,
    key_info: &PublicKeyInfo,
    clock: &dyn Clock,
) -> Result<VerificationOutcome, Error> {
    let signature_input = structured_fields::parse_dictionary(signature_input_header)?;
    let signature_dict = structured_fields::parse_dictionary(signature_header)?;

    let (label, inner_list) = select_entry(&signature_input, &spec.selector)?;
    let label = label.to_string();

    let signature_bytes = match signature_dict.get(&label) {
        Some(structured_fields::ListEntry::Item(item)) => match &item.bare_item {
            structured_fields::BareItem::ByteSequence(bytes) => bytes.clone(),
            _ => return Err(Error::Generic(format!("signature `{label}` is not a byte sequence"))),
        },
        Some(structured_fields::ListEntry::InnerList(_)) => {
            return Err(Error::Generic(format!("signature `{label}` is not a byte sequence")));
        }
        None => return Err(Error::Generic(format!("no `Signature` entry matching `{label}`"))),
    };

    let components = inner_list
        .items
        .iter()
        .map(component::from_item)
        .collect::<Result<Vec<CoveredComponent>, Error>>()?;
    let parameters = SignatureParameters::from_parameters(inner_list.params.clone())?;

    check_components_unique(&components)?;

    for required in &spec.required_components {
        if !components.contains(required) {
            return Err(Error::MissingComponent(required.clone()));
        }
    }

    for maybe_required in &spec.required_if_present_components {
        if !components.contains(maybe_required) && context.resolve(maybe_required).is_ok() {
            return Err(Error::MissingComponent(maybe_required.clone()));
        }
    }

    for name in &spec.required_parameters {
        let present = match *name {
            "created" => parameters.created().is_some(),
            "expires" => parameters.expires().is_some(),
            "nonce" => parameters.nonce().is_some(),
            "alg" => parameters.alg().is_some(),
            "keyid" => parameters.keyid().is_some(),
            "tag" => parameters.tag().is_some(),
            other => return Err(Error::Generic(format!("unrecognized required parameter `{other}`"))),
        };
        if !present {
            return Err(Error::MissingRequired((*name).to_string()));
        }
    }

    for name in &spec.forbidden_parameters {
        let present = match *name {
            "created" => parameters.created().is_some(),
            "expires" => parameters.expires().is_some(),
            "nonce" => parameters.nonce().is_some(),
            "alg" => parameters.alg().is_some(),
            "keyid" => parameters.keyid().is_some(),
            "tag" => parameters.tag().is_some(),
            other => return Err(Error::Generic(format!("unrecognized forbidden parameter `{other}`"))),
        };
        if present {
            return Err(Error::ForbiddenPresent((*name).to_string()));
        }
    }

    let now = clock.now_unix_seconds();

    // RFC 9421 §4.3's three checks, all against the same `now` read, apply
    // only when `created` is present at all — without it there is no
    // anchor for max-age/max-skew, and `expires` alone is not checked.
    if let Some(created) = parameters.created() {
        if let Some(expires) = parameters.expires() {
            if expires < now {
                return Err(Error::SignatureExpired);
            }
        }
        if let Some(max_age) = spec.max_age_seconds {
            if created + max_age < now {
                return Err(Error::SignatureExpired);
            }
        }
        if let Some(max_skew) = spec.max_skew_seconds {
            if created > now + max_skew {
                return Err(Error::SignatureExpired);
            }
        }
    }

    let algorithm = match key_info.algorithm {
        Some(alg) => alg,
        None => {
            let wire = parameters.alg().ok_or(Error::MissingAlgorithm)?;
            SignatureAlgorithm::from_wire_identifier(wire)?
        }
    };

    let base_spec = SignatureBaseSpec { components, parameters };
    let base = base_spec.build(context)?;

    match key::verify(algorithm, &key_info.key, base.text.as_bytes(), &signature_bytes) {
        Ok(()) => Ok(VerificationOutcome {
            label,
            parameters: base_spec.parameters,
            signature_base: base.text,
        }),
        Err(Error::IncorrectSignature { algorithm, .. }) => {
            Err(Error::IncorrectSignature { algorithm, base: base.text })
        }
        Err(other) => Err(other),
    }
}
