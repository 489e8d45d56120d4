//! Shared helper functions for CLI commands

use miette::{bail, Result};

use crate::core::config::Config;
use crate::core::identity::EntityPrefix;
use crate::core::loader::{load_all, resolve_record};
use crate::core::project::Project;
use crate::core::team::TeamRoster;
use crate::entities::comparison::Comparison;
use crate::entities::document::Document;
use crate::entities::ecn::Ecn;
use crate::entities::part::Part;
use crate::entities::revision::Revision;
use crate::entities::vendor::VendorDocument;

/// Resolve the acting user: explicit --by flag, then team roster match
/// on the git identity, then configured author
pub fn resolve_actor(by: &Option<String>, roster: Option<&TeamRoster>, config: &Config) -> String {
    if let Some(user) = by {
        return user.clone();
    }
    if let Some(roster) = roster {
        if let Some(member) = roster.current_user() {
            return member.username.clone();
        }
    }
    config.author()
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

/// Find a document by id, id prefix, or sequence number
pub fn get_document(project: &Project, reference: &str) -> Result<Document> {
    let docs: Vec<Document> = load_all(project, EntityPrefix::Doc);
    match resolve_record(&docs, reference, |d, r| d.sequence.eq_ignore_ascii_case(r)) {
        Some(doc) => Ok(doc.clone()),
        None => bail!("cannot resolve document: {}", reference),
    }
}

/// Find a revision by id, id prefix, or "<doc-ref>:<number>"
pub fn get_revision(project: &Project, reference: &str) -> Result<Revision> {
    let revs: Vec<Revision> = load_all(project, EntityPrefix::Rev);

    if let Some((doc_ref, number)) = reference.rsplit_once(':') {
        if let Ok(number) = number.parse::<u32>() {
            let doc = get_document(project, doc_ref)?;
            if let Some(rev) = revs.iter().find(|r| r.document == doc.id && r.number == number) {
                return Ok(rev.clone());
            }
            bail!("document {} has no revision {}", doc.sequence, number);
        }
    }

    match resolve_record(&revs, reference, |_, _| false) {
        Some(rev) => Ok(rev.clone()),
        None => bail!("cannot resolve revision: {}", reference),
    }
}

/// Find an ECN by id, id prefix, or ECN number
pub fn get_ecn(project: &Project, reference: &str) -> Result<Ecn> {
    let ecns: Vec<Ecn> = load_all(project, EntityPrefix::Ecn);
    match resolve_record(&ecns, reference, |e, r| e.number.eq_ignore_ascii_case(r)) {
        Some(ecn) => Ok(ecn.clone()),
        None => bail!("cannot resolve ECN: {}", reference),
    }
}

/// Find a part by id, id prefix, or part number
pub fn get_part(project: &Project, reference: &str) -> Result<Part> {
    let parts: Vec<Part> = load_all(project, EntityPrefix::Part);
    match resolve_record(&parts, reference, |p, r| {
        p.part_number.eq_ignore_ascii_case(r)
    }) {
        Some(part) => Ok(part.clone()),
        None => bail!("cannot resolve part: {}", reference),
    }
}

/// Find a vendor document by id, id prefix, or serial number
pub fn get_vendor_document(project: &Project, reference: &str) -> Result<VendorDocument> {
    let docs: Vec<VendorDocument> = load_all(project, EntityPrefix::Vdoc);
    match resolve_record(&docs, reference, |d, r| d.sequence.eq_ignore_ascii_case(r)) {
        Some(doc) => Ok(doc.clone()),
        None => bail!("cannot resolve vendor document: {}", reference),
    }
}

/// Find a comparison record by id or id prefix
pub fn get_comparison(project: &Project, reference: &str) -> Result<Comparison> {
    let cmps: Vec<Comparison> = load_all(project, EntityPrefix::Cmpr);
    match resolve_record(&cmps, reference, |_, _| false) {
        Some(cmp) => Ok(cmp.clone()),
        None => bail!("cannot resolve comparison: {}", reference),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }

    #[test]
    fn test_resolve_actor_prefers_explicit_flag() {
        let config = Config::default();
        let actor = resolve_actor(&Some("jsmith".to_string()), None, &config);
        assert_eq!(actor, "jsmith");
    }
}
