use crate::error::LoadError;

pub const HOST_MARKER: &str = "google.com";
const DOC_ID_PREFIX: &str = "/d/";
const EXPORT_BASE: &str = "https://docs.google.com/spreadsheets/d";

/// Turns a sharing link such as
/// `https://docs.google.com/spreadsheets/d/<id>/edit?usp=sharing`
/// into the direct `.xlsx` export link for the same document.
pub fn export_url(share_url: &str) -> Result<String, LoadError> {
    let share_url = share_url.trim();
    if !share_url.contains(HOST_MARKER) {
        return Err(LoadError::InvalidUrl(format!(
            "'{share_url}' is not a Google Sheets link"
        )));
    }
    let doc_id = document_id(share_url)?;
    Ok(format!("{EXPORT_BASE}/{doc_id}/export?format=xlsx"))
}

/// Document id: the path segment right after `/d/`.
pub fn document_id(share_url: &str) -> Result<&str, LoadError> {
    let Some((_, rest)) = share_url.split_once(DOC_ID_PREFIX) else {
        return Err(LoadError::MalformedUrl(format!(
            "'{share_url}' has no /d/<document id>/ segment"
        )));
    };
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let doc_id = &rest[..end];
    if doc_id.is_empty() {
        return Err(LoadError::MalformedUrl(format!(
            "'{share_url}' has an empty document id"
        )));
    }
    Ok(doc_id)
}

#[cfg(test)]
mod tests {
    use super::{document_id, export_url};
    use crate::error::LoadError;

    #[test]
    fn builds_export_url_from_edit_link() {
        let url = "https://docs.google.com/spreadsheets/d/1soXeIAa-XoHsTfAE8h/edit?gid=0#gid=0";
        assert_eq!(
            export_url(url).expect("valid"),
            "https://docs.google.com/spreadsheets/d/1soXeIAa-XoHsTfAE8h/export?format=xlsx"
        );
    }

    #[test]
    fn accepts_id_at_end_of_link() {
        let url = "https://docs.google.com/spreadsheets/d/abc123";
        assert_eq!(document_id(url).expect("id"), "abc123");
    }

    #[test]
    fn rejects_foreign_host() {
        let err = export_url("https://example.com/not-google/doc").unwrap_err();
        assert!(matches!(err, LoadError::InvalidUrl(_)));
    }

    #[test]
    fn rejects_link_without_doc_segment() {
        let err = export_url("https://docs.google.com/spreadsheets/u/0/").unwrap_err();
        assert!(matches!(err, LoadError::MalformedUrl(_)));
    }

    #[test]
    fn rejects_empty_doc_id() {
        let err = export_url("https://docs.google.com/spreadsheets/d//edit").unwrap_err();
        assert!(matches!(err, LoadError::MalformedUrl(_)));
    }
}
