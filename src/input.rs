//! @ai:module:intent Load request lists from JSON files and enforce the run's input contract
//! @ai:module:layer infrastructure
//! @ai:module:public_api load_requests, parse_requests, validate_requests
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::request::{BatchEnvelope, RequestItem};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Accepted file shapes: a bare array or a batch envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum RequestFile {
    List(Vec<RequestItem>),
    Envelope(BatchEnvelope),
}

/// @ai:intent Parse a request list from JSON text
/// @ai:effects pure
pub fn parse_requests(json: &str) -> Result<Vec<RequestItem>> {
    let file: RequestFile = serde_json::from_str(json)?;
    Ok(match file {
        RequestFile::List(requests) => requests,
        RequestFile::Envelope(envelope) => envelope.requests,
    })
}

/// @ai:intent Load requests from a file, or from every *.json file under a directory
/// @ai:post directory files are read in path order and concatenated
/// @ai:effects fs:read
pub fn load_requests(path: &Path) -> Result<Vec<RequestItem>> {
    let files = if path.is_dir() {
        find_request_files(path)
    } else {
        vec![path.to_path_buf()]
    };

    let mut requests = Vec::new();
    for file in files {
        let content = std::fs::read_to_string(&file)?;
        let parsed = parse_requests(&content).map_err(|e| {
            Error::InvalidRequest(format!("{}: {}", file.display(), e))
        })?;
        tracing::debug!("Loaded {} requests from {}", parsed.len(), file.display());
        requests.extend(parsed);
    }

    Ok(requests)
}

fn find_request_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == "json")
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    files.sort();
    files
}

/// @ai:intent Check the input contract of a run
/// @ai:pre none
/// @ai:post Ok only if non-empty, ids unique, and id/method/url all present
/// @ai:effects pure
pub fn validate_requests(requests: &[RequestItem]) -> Result<()> {
    if requests.is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut seen = HashSet::with_capacity(requests.len());
    for (position, request) in requests.iter().enumerate() {
        if request.id.trim().is_empty() {
            return Err(Error::InvalidRequest(format!(
                "request at position {} has an empty id",
                position
            )));
        }
        if request.method.trim().is_empty() || request.url.trim().is_empty() {
            return Err(Error::InvalidRequest(format!(
                "request {} needs both a method and a url",
                request.id
            )));
        }
        if !seen.insert(request.id.as_str()) {
            return Err(Error::DuplicateId(request.id.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_parse_bare_list_and_envelope() {
        let list = parse_requests(r#"[{"id":"1","method":"GET","url":"/me"}]"#).unwrap();
        let envelope =
            parse_requests(r#"{"requests":[{"id":"1","method":"GET","url":"/me"}]}"#).unwrap();

        assert_eq!(list, envelope);
        assert_eq!(list[0], RequestItem::get("1", "/me"));
    }

    #[test]
    fn test_load_directory_in_path_order() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("b.json"),
            r#"[{"id":"b1","method":"GET","url":"/groups"}]"#,
        )
        .unwrap();
        std::fs::write(
            temp.path().join("a.json"),
            r#"{"requests":[{"id":"a1","method":"GET","url":"/users"},{"id":"a2","method":"DELETE","url":"/users/9"}]}"#,
        )
        .unwrap();
        std::fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

        let requests = load_requests(temp.path()).unwrap();
        let ids: Vec<&str> = requests.iter().map(|r| r.id.as_str()).collect();

        assert_eq!(ids, vec!["a1", "a2", "b1"]);
        assert_eq!(requests[1].method, "DELETE");
    }

    #[test]
    fn test_load_reports_bad_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(load_requests(&path), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_validate_rejects_empty_and_duplicates() {
        assert!(matches!(validate_requests(&[]), Err(Error::EmptyInput)));

        let duplicated = vec![RequestItem::get("1", "/me"), RequestItem::get("1", "/users")];
        match validate_requests(&duplicated) {
            Err(Error::DuplicateId(id)) => assert_eq!(id, "1"),
            other => panic!("expected duplicate id, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_requires_method_and_url() {
        let missing_url = vec![RequestItem::new("1", "GET", "")];
        assert!(matches!(
            validate_requests(&missing_url),
            Err(Error::InvalidRequest(_))
        ));

        let fine = vec![RequestItem::get("1", "/me"), RequestItem::get("2", "/users")];
        assert!(validate_requests(&fine).is_ok());
    }
}
