//! Feature collection and exception report decoding.
//!
//! Elements are matched by local name only, so the `wfs:`, `BsWfs:` and
//! `ows:` prefixes used by the service do not matter.

use crate::error::{CollectorError, Result};
use crate::models::Member;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use tracing::debug;
use xmltree::{Element, XMLNode};

const UNKNOWN_ERROR: &str = "unknown error";

/// Decode a response body into members, or into a service error when the
/// status is not a success.
pub fn parse_response(status: StatusCode, body: &[u8]) -> Result<Vec<Member>> {
    if !status.is_success() {
        let message = exception_messages(body)
            .and_then(|messages| messages.into_iter().next())
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        return Err(CollectorError::Service { status, message });
    }

    parse_feature_collection(body)
}

/// Decode a `FeatureCollection` document into its members
pub fn parse_feature_collection(body: &[u8]) -> Result<Vec<Member>> {
    let root = Element::parse(body)
        .map_err(|e| CollectorError::decode(format!("invalid feature collection XML: {}", e)))?;

    let members = child_elements(&root, "member")
        .enumerate()
        .map(|(index, member)| parse_member(index, member))
        .collect::<Result<Vec<_>>>()?;

    debug!("Decoded {} members from {}", members.len(), root.name);
    Ok(members)
}

/// Collect the texts of an exception report, `None` when the body is not
/// XML or carries no exception text
pub fn exception_messages(body: &[u8]) -> Option<Vec<String>> {
    let root = Element::parse(body).ok()?;

    let messages: Vec<String> = child_elements(&root, "Exception")
        .flat_map(|exception| child_elements(exception, "ExceptionText"))
        .filter_map(|text| text.get_text())
        .map(|text| text.trim().to_string())
        .collect();

    if messages.is_empty() {
        None
    } else {
        Some(messages)
    }
}

fn parse_member(index: usize, member: &Element) -> Result<Member> {
    let element = member.get_child("BsWfsElement").ok_or_else(|| {
        CollectorError::decode(format!("member {} has no BsWfsElement", index))
    })?;

    let time_text = required_text(element, "Time", index)?;
    let time = DateTime::parse_from_rfc3339(time_text.trim())
        .map_err(|e| {
            CollectorError::decode(format!(
                "member {} has invalid Time '{}': {}",
                index, time_text, e
            ))
        })?
        .with_timezone(&Utc);

    // Blank names fall through to the normalizer, which drops them
    let name = optional_text(element, "ParameterName");
    let value = optional_text(element, "ParameterValue");

    Ok(Member::new(time, name.trim(), value))
}

fn optional_text(element: &Element, name: &str) -> String {
    element
        .get_child(name)
        .and_then(|child| child.get_text())
        .map(|text| text.into_owned())
        .unwrap_or_default()
}

fn required_text(element: &Element, name: &str, index: usize) -> Result<String> {
    element
        .get_child(name)
        .and_then(|child| child.get_text())
        .map(|text| text.into_owned())
        .ok_or_else(|| CollectorError::decode(format!("member {} has no {}", index, name)))
}

fn child_elements<'a>(parent: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> {
    parent
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(move |child| child.name == name)
}
