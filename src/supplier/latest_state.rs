//! Keep only the newest version of each versioned object

use super::error::SupplierResult;
use super::member::Member;
use super::traits::{MemberSupplier, SupplierDecorator};
use crate::graph::{NamedNode, NamedNodeRef, SubjectRef, TermRef};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Drops version members that are not newer than the latest one already
/// supplied for the same object.
///
/// A member's object is the value of `version_of_path`, its age the
/// `xsd:dateTime` value of `timestamp_path`. Members lacking either pass
/// through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestStateFilter {
    pub enabled: bool,
    pub version_of_path: NamedNode,
    pub timestamp_path: NamedNode,
}

impl LatestStateFilter {
    pub fn new(enabled: bool, version_of_path: NamedNode, timestamp_path: NamedNode) -> Self {
        Self {
            enabled,
            version_of_path,
            timestamp_path,
        }
    }
}

impl SupplierDecorator for LatestStateFilter {
    fn name(&self) -> &str {
        "latest-state"
    }

    fn applies(&self) -> bool {
        self.enabled
    }

    fn wrap(&self, inner: Box<dyn MemberSupplier>) -> Box<dyn MemberSupplier> {
        Box::new(LatestStateSupplier {
            inner,
            version_of_path: self.version_of_path.clone(),
            timestamp_path: self.timestamp_path.clone(),
            latest: HashMap::new(),
        })
    }
}

struct LatestStateSupplier {
    inner: Box<dyn MemberSupplier>,
    version_of_path: NamedNode,
    timestamp_path: NamedNode,
    latest: HashMap<String, DateTime<Utc>>,
}

impl LatestStateSupplier {
    /// Value of `path` on the member's own subject; nested nodes do not count.
    fn value_of<'a>(member: &'a Member, path: &NamedNode) -> Option<TermRef<'a>> {
        let subject = NamedNodeRef::new(member.id()).ok()?;
        member
            .graph()
            .object_for_subject_predicate(SubjectRef::NamedNode(subject), path)
    }

    fn version_of(&self, member: &Member) -> Option<String> {
        match Self::value_of(member, &self.version_of_path)? {
            TermRef::NamedNode(node) => Some(node.as_str().to_string()),
            TermRef::Literal(literal) => Some(literal.value().to_string()),
            TermRef::BlankNode(_) => None,
        }
    }

    fn timestamp(&self, member: &Member) -> Option<DateTime<Utc>> {
        match Self::value_of(member, &self.timestamp_path)? {
            TermRef::Literal(literal) => {
                let parsed = parse_date_time(literal.value());
                if parsed.is_none() {
                    warn!(
                        member = member.id(),
                        value = literal.value(),
                        "unparsable version timestamp"
                    );
                }
                parsed
            }
            _ => None,
        }
    }

    fn is_latest(&mut self, member: &Member) -> bool {
        let (Some(object), Some(timestamp)) = (self.version_of(member), self.timestamp(member))
        else {
            return true;
        };
        let newer = self
            .latest
            .get(&object)
            .map_or(true, |seen| timestamp > *seen);
        if newer {
            self.latest.insert(object, timestamp);
        }
        newer
    }
}

impl MemberSupplier for LatestStateSupplier {
    fn next_member(&mut self) -> SupplierResult<Option<Member>> {
        while let Some(member) = self.inner.next_member()? {
            if self.is_latest(&member) {
                return Ok(Some(member));
            }
            debug!(member = member.id(), "skipping outdated version");
        }
        Ok(None)
    }
}

/// `xsd:dateTime`; values without an offset are taken as UTC.
fn parse_date_time(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{vocab, BlankNode, Graph, Literal, Triple};
    use crate::supplier::{compose, IterMemberSupplier};

    const IS_VERSION_OF: &str = "http://purl.org/dc/terms/isVersionOf";
    const MODIFIED: &str = "http://www.w3.org/ns/prov#generatedAtTime";

    fn iri(value: &str) -> NamedNode {
        NamedNode::new_unchecked(value)
    }

    fn version(id: &str, object: &str, at: &str) -> Member {
        let graph: Graph = [
            Triple::new(iri(id), iri(IS_VERSION_OF), iri(object)),
            Triple::new(
                iri(id),
                iri(MODIFIED),
                Literal::new_typed_literal(at, vocab::xsd::DATE_TIME),
            ),
        ]
        .into_iter()
        .collect();
        Member::new(id, graph)
    }

    fn filter(enabled: bool) -> LatestStateFilter {
        LatestStateFilter::new(enabled, iri(IS_VERSION_OF), iri(MODIFIED))
    }

    fn ids(mut supplier: Box<dyn MemberSupplier>) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(member) = supplier.next_member().unwrap() {
            out.push(member.id().to_string());
        }
        out
    }

    #[test]
    fn older_and_equal_versions_are_dropped() {
        let members = vec![
            version("urn:v:1", "urn:x:1", "2024-01-01T10:00:00Z"),
            version("urn:v:2", "urn:x:1", "2023-12-31T10:00:00Z"),
            version("urn:v:3", "urn:x:2", "2023-01-01T00:00:00Z"),
            version("urn:v:4", "urn:x:1", "2024-01-01T12:00:00+02:00"),
            version("urn:v:5", "urn:x:1", "2024-01-02T00:00:00"),
        ];
        let supplier = compose(&filter(true), Box::new(IterMemberSupplier::new(members)));
        assert_eq!(ids(supplier), ["urn:v:1", "urn:v:3", "urn:v:5"]);
    }

    #[test]
    fn members_without_version_properties_pass() {
        let members = vec![
            version("urn:v:1", "urn:x:1", "2024-01-01T10:00:00Z"),
            Member::new("urn:plain", Graph::new()),
            version("urn:v:2", "urn:x:1", "not a date"),
        ];
        let supplier = compose(&filter(true), Box::new(IterMemberSupplier::new(members)));
        assert_eq!(ids(supplier), ["urn:v:1", "urn:plain", "urn:v:2"]);
    }

    #[test]
    fn disabled_filter_keeps_everything() {
        let members = vec![
            version("urn:v:1", "urn:x:1", "2024-01-01T10:00:00Z"),
            version("urn:v:2", "urn:x:1", "2023-01-01T10:00:00Z"),
        ];
        let supplier = compose(&filter(false), Box::new(IterMemberSupplier::new(members)));
        assert_eq!(ids(supplier), ["urn:v:1", "urn:v:2"]);
    }

    #[test]
    fn nested_nodes_do_not_supply_version_properties() {
        let nested = BlankNode::default();
        let mut graph = Graph::new();
        for triple in [
            Triple::new(iri("urn:v:2"), iri("http://example.org/part"), nested.clone()),
            Triple::new(nested.clone(), iri(IS_VERSION_OF), iri("urn:x:1")),
            Triple::new(
                nested,
                iri(MODIFIED),
                Literal::new_typed_literal("2020-01-01T00:00:00Z", vocab::xsd::DATE_TIME),
            ),
        ] {
            graph.insert(&triple);
        }
        let members = vec![
            version("urn:v:1", "urn:x:1", "2024-01-01T10:00:00Z"),
            Member::new("urn:v:2", graph),
        ];
        let supplier = compose(&filter(true), Box::new(IterMemberSupplier::new(members)));
        assert_eq!(ids(supplier), ["urn:v:1", "urn:v:2"]);
    }
}
