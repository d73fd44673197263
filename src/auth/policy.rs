use tracing::debug;

use crate::error::ColabError;
use crate::models::Document;

pub fn is_owner(prpl: &str, doc: &Document) -> bool {
    doc.owner_id == prpl
}

/// Owner, any collaborator, or anybody at all when the document is public
pub fn can_read(prpl: &str, doc: &Document) -> bool {
    is_owner(prpl, doc) || doc.is_public || doc.is_collaborator(prpl)
}

/// Owner or collaborator. The public flag never grants write access.
pub fn can_write(prpl: &str, doc: &Document) -> bool {
    is_owner(prpl, doc) || doc.is_collaborator(prpl)
}

/// Title changes, deletion and sharing
pub fn can_administer(prpl: &str, doc: &Document) -> bool {
    is_owner(prpl, doc)
}

pub fn ensure_read(prpl: &str, doc: &Document) -> Result<(), ColabError> {
    if can_read(prpl, doc) {
        return Ok(());
    }
    debug!("Read access to document {} denied for {}", doc.id, prpl);
    Err(ColabError::AccessDenied)
}

pub fn ensure_write(prpl: &str, doc: &Document) -> Result<(), ColabError> {
    if can_write(prpl, doc) {
        return Ok(());
    }
    debug!("Write access to document {} denied for {}", doc.id, prpl);
    Err(ColabError::AccessDenied)
}

pub fn ensure_admin(prpl: &str, doc: &Document) -> Result<(), ColabError> {
    if can_administer(prpl, doc) {
        return Ok(());
    }
    debug!("Admin access to document {} denied for {}", doc.id, prpl);
    Err(ColabError::AccessDenied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const CALLER: &str = "caller";

    fn doc(caller_owns: bool, public: bool, caller_collaborates: bool) -> Document {
        let owner = if caller_owns { CALLER } else { "someone-else" };
        let mut doc = Document::new(owner, "Doc", Utc::now());
        doc.is_public = public;
        if caller_collaborates {
            doc.collaborators.insert(CALLER.to_string());
        }
        doc
    }

    #[test]
    fn read_truth_table() {
        for owner in [false, true] {
            for public in [false, true] {
                for collaborator in [false, true] {
                    let d = doc(owner, public, collaborator);
                    let expected = owner || public || collaborator;
                    assert_eq!(
                        can_read(CALLER, &d),
                        expected,
                        "owner={} public={} collaborator={}",
                        owner,
                        public,
                        collaborator
                    );
                }
            }
        }
    }

    #[test]
    fn write_truth_table() {
        for owner in [false, true] {
            for public in [false, true] {
                for collaborator in [false, true] {
                    let d = doc(owner, public, collaborator);
                    assert_eq!(can_write(CALLER, &d), owner || collaborator);
                }
            }
        }
    }

    #[test]
    fn admin_is_owner_only() {
        for owner in [false, true] {
            for public in [false, true] {
                for collaborator in [false, true] {
                    let d = doc(owner, public, collaborator);
                    assert_eq!(can_administer(CALLER, &d), owner);
                }
            }
        }
    }

    #[test]
    fn owner_listed_as_collaborator_keeps_admin() {
        let mut d = doc(true, false, false);
        d.collaborators.insert(CALLER.to_string());
        assert!(ensure_admin(CALLER, &d).is_ok());
    }

    #[test]
    fn ensure_helpers_deny_with_access_denied() {
        let d = doc(false, true, false);
        assert!(ensure_read(CALLER, &d).is_ok());
        assert_eq!(ensure_write(CALLER, &d), Err(ColabError::AccessDenied));
        assert_eq!(ensure_admin(CALLER, &d), Err(ColabError::AccessDenied));
    }
}
