use crate::drive::store::{DriveStore, RemoteFile};
use crate::prelude::{ensure_success, TransportError};
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use std::sync::RwLock;

pub const DRIVE_FILES_ENDPOINT: &str = "https://www.googleapis.com/drive/v3/files";
pub const DRIVE_UPLOAD_ENDPOINT: &str = "https://www.googleapis.com/upload/drive/v3/files";
pub const METADATA_TOKEN_ENDPOINT: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

const UPLOAD_BOUNDARY: &str = "remo-panel-upload-7c1f3a";
const UPLOAD_CONTENT_TYPE: &str = "image/jpeg";

/// Base URLs the backend talks to.
#[derive(Debug, Clone)]
pub struct DriveEndpoints {
    pub files: String,
    pub upload: String,
    pub metadata_token: String,
}

impl Default for DriveEndpoints {
    fn default() -> Self {
        Self {
            files: DRIVE_FILES_ENDPOINT.into(),
            upload: DRIVE_UPLOAD_ENDPOINT.into(),
            metadata_token: METADATA_TOKEN_ENDPOINT.into(),
        }
    }
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<RemoteFile>,
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Google Drive v3 REST backend.
///
/// Authenticates with a fixed access token when one is configured, and
/// otherwise with the default service account of the hosting instance as
/// reported by the metadata server.
pub struct GoogleDrive {
    http: Client,
    endpoints: DriveEndpoints,
    configured_token: Option<String>,
    token: RwLock<Option<String>>,
}

impl GoogleDrive {
    pub fn new(access_token: Option<String>) -> Result<Self, TransportError> {
        Self::with_endpoints(DriveEndpoints::default(), access_token)
    }

    pub fn with_endpoints(
        endpoints: DriveEndpoints,
        access_token: Option<String>,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            http: Client::builder().build()?,
            endpoints,
            configured_token: access_token.filter(|token| !token.is_empty()),
            token: RwLock::new(None),
        })
    }

    fn resolve_token(&self) -> Result<String, TransportError> {
        if let Some(token) = &self.configured_token {
            return Ok(token.clone());
        }
        debug!("requesting service account token from metadata server");
        let response = self
            .http
            .get(&self.endpoints.metadata_token)
            .header("Metadata-Flavor", "Google")
            .send()?;
        let token: MetadataToken = ensure_success(response)?.json()?;
        Ok(token.access_token)
    }

    fn bearer(&self) -> Result<String, TransportError> {
        if let Some(token) = self.token.read().ok().and_then(|guard| guard.clone()) {
            return Ok(format!("Bearer {token}"));
        }
        let token = self.resolve_token()?;
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token.clone());
        }
        Ok(format!("Bearer {token}"))
    }
}

fn parents_query(folder_id: &str) -> String {
    let quoted = folder_id.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{quoted}' in parents")
}

/// Builds a `multipart/related` upload body: JSON metadata, then the media.
fn multipart_body(folder_id: &str, name: &str, content: &[u8]) -> Vec<u8> {
    let metadata = json!({ "name": name, "parents": [folder_id] });
    let mut body = Vec::with_capacity(content.len() + 256);
    body.extend_from_slice(
        format!(
            "--{UPLOAD_BOUNDARY}\r\n\
             Content-Type: application/json; charset=UTF-8\r\n\r\n\
             {metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!("--{UPLOAD_BOUNDARY}\r\nContent-Type: {UPLOAD_CONTENT_TYPE}\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{UPLOAD_BOUNDARY}--\r\n").as_bytes());
    body
}

impl DriveStore for GoogleDrive {
    fn prepare(&self) -> Result<(), TransportError> {
        let token = self.resolve_token()?;
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token);
        }
        Ok(())
    }

    fn list(&self, folder_id: &str, page_size: usize) -> Result<Vec<RemoteFile>, TransportError> {
        let response = self
            .http
            .get(&self.endpoints.files)
            .header(AUTHORIZATION, self.bearer()?)
            .query(&[
                ("q", parents_query(folder_id)),
                ("pageSize", page_size.to_string()),
                ("fields", "files(id, name)".to_string()),
            ])
            .send()?;
        let list: FileList = ensure_success(response)?.json()?;
        debug!("folder {} holds {} entries", folder_id, list.files.len());
        Ok(list.files)
    }

    fn delete(&self, file_id: &str) -> Result<(), TransportError> {
        let response = self
            .http
            .delete(format!("{}/{file_id}", self.endpoints.files))
            .header(AUTHORIZATION, self.bearer()?)
            .send()?;
        ensure_success(response)?;
        Ok(())
    }

    fn create(
        &self,
        folder_id: &str,
        name: &str,
        content: &[u8],
    ) -> Result<RemoteFile, TransportError> {
        let response = self
            .http
            .post(&self.endpoints.upload)
            .header(AUTHORIZATION, self.bearer()?)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={UPLOAD_BOUNDARY}"),
            )
            .query(&[("uploadType", "multipart"), ("fields", "id,name")])
            .body(multipart_body(folder_id, name, content))
            .send()?;
        let file: RemoteFile = ensure_success(response)?.json()?;
        info!("uploaded {} as {}", file.name, file.id);
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use warp::http::StatusCode;
    use warp::Filter;

    type Seen = Arc<Mutex<Vec<(String, HashMap<String, String>)>>>;

    fn endpoints(addr: SocketAddr) -> DriveEndpoints {
        let base = format!("http://{addr}");
        DriveEndpoints {
            files: format!("{base}/drive/v3/files"),
            upload: format!("{base}/upload/drive/v3/files"),
            metadata_token: format!("{base}/token"),
        }
    }

    fn drive(addr: SocketAddr, token: Option<&str>) -> GoogleDrive {
        GoogleDrive::with_endpoints(endpoints(addr), token.map(str::to_string)).unwrap()
    }

    /// Serves `GET /drive/v3/files` with `reply`, recording auth and query.
    fn listing(reply: serde_json::Value) -> (SocketAddr, Seen) {
        let seen: Seen = Arc::default();
        let record = seen.clone();
        let route = warp::path!("drive" / "v3" / "files")
            .and(warp::get())
            .and(warp::header::<String>("authorization"))
            .and(warp::query::<HashMap<String, String>>())
            .map(move |auth: String, query: HashMap<String, String>| {
                record.lock().unwrap().push((auth, query));
                warp::reply::json(&reply)
            });
        (test_server::spawn(route), seen)
    }

    #[test]
    fn parents_query_quotes_folder_id() {
        assert_eq!(parents_query("abc123"), "'abc123' in parents");
        assert_eq!(parents_query("it's"), r"'it\'s' in parents");
    }

    #[test]
    fn multipart_body_wraps_metadata_and_media() {
        let body = multipart_body("folder", "remo.jpeg", &[0xFF, 0xD8, 0xFF]);
        let text = String::from_utf8_lossy(&body);

        assert!(text.starts_with(&format!("--{UPLOAD_BOUNDARY}\r\n")));
        assert!(text.contains(r#""name":"remo.jpeg""#));
        assert!(text.contains(r#""parents":["folder"]"#));
        assert!(text.contains("Content-Type: image/jpeg\r\n\r\n"));
        assert!(text.ends_with(&format!("\r\n--{UPLOAD_BOUNDARY}--\r\n")));

        let media_start = body
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .and_then(|first| {
                body[first + 4..]
                    .windows(4)
                    .position(|w| w == b"\r\n\r\n")
                    .map(|second| first + 4 + second + 4)
            })
            .unwrap();
        assert_eq!(&body[media_start..media_start + 3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn configured_token_skips_metadata_server() {
        let drive = GoogleDrive::new(Some("drive-token".into())).unwrap();
        drive.prepare().unwrap();
        assert_eq!(drive.bearer().unwrap(), "Bearer drive-token");
    }

    #[test]
    fn empty_configured_token_is_ignored() {
        let drive = GoogleDrive::new(Some(String::new())).unwrap();
        assert!(drive.configured_token.is_none());
    }

    #[test]
    fn list_parses_files_of_parent_folder() {
        let (addr, seen) = listing(json!({
            "files": [
                {"id": "1a", "name": "remo.jpeg"},
                {"id": "2b", "name": "weather.png"}
            ]
        }));

        let files = drive(addr, Some("ya29")).list("folder-1", 1000).unwrap();
        assert_eq!(
            files,
            vec![
                RemoteFile {
                    id: "1a".into(),
                    name: "remo.jpeg".into(),
                },
                RemoteFile {
                    id: "2b".into(),
                    name: "weather.png".into(),
                },
            ]
        );

        let seen = seen.lock().unwrap();
        let (auth, query) = &seen[0];
        assert_eq!(auth, "Bearer ya29");
        assert_eq!(query["q"], "'folder-1' in parents");
        assert_eq!(query["pageSize"], "1000");
        assert_eq!(query["fields"], "files(id, name)");
    }

    #[test]
    fn list_without_files_key_is_empty() {
        let (addr, _) = listing(json!({ "kind": "drive#fileList" }));
        let files = drive(addr, Some("ya29")).list("folder-1", 1000).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn error_reply_becomes_status_error() {
        let route = warp::path!("drive" / "v3" / "files")
            .map(|| warp::reply::with_status("rate limit exceeded", StatusCode::FORBIDDEN));
        let addr = test_server::spawn(route);

        match drive(addr, Some("ya29")).list("folder-1", 1000) {
            Err(TransportError::Status { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "rate limit exceeded");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn create_posts_multipart_upload() {
        let seen: Arc<Mutex<Vec<(String, HashMap<String, String>, Vec<u8>)>>> = Arc::default();
        let record = seen.clone();
        let route = warp::path!("upload" / "drive" / "v3" / "files")
            .and(warp::post())
            .and(warp::header::<String>("content-type"))
            .and(warp::query::<HashMap<String, String>>())
            .and(warp::body::bytes())
            .map(move |content_type: String, query, body: warp::hyper::body::Bytes| {
                record.lock().unwrap().push((content_type, query, body.to_vec()));
                warp::reply::json(&json!({"id": "new-id", "name": "remo.jpeg"}))
            });
        let addr = test_server::spawn(route);

        let file = drive(addr, Some("ya29"))
            .create("folder-1", "remo.jpeg", &[0xFF, 0xD8, 0xFF, 0xD9])
            .unwrap();
        assert_eq!(
            file,
            RemoteFile {
                id: "new-id".into(),
                name: "remo.jpeg".into(),
            }
        );

        let seen = seen.lock().unwrap();
        let (content_type, query, body) = &seen[0];
        assert_eq!(
            content_type,
            &format!("multipart/related; boundary={UPLOAD_BOUNDARY}")
        );
        assert_eq!(query["uploadType"], "multipart");
        assert_eq!(
            body,
            &multipart_body("folder-1", "remo.jpeg", &[0xFF, 0xD8, 0xFF, 0xD9])
        );
    }

    #[test]
    fn delete_targets_file_id() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::default();
        let record = seen.clone();
        let route = warp::path!("drive" / "v3" / "files" / String)
            .and(warp::delete())
            .map(move |id: String| {
                record.lock().unwrap().push(id);
                warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT)
            });
        let addr = test_server::spawn(route);

        drive(addr, Some("ya29")).delete("stale-id").unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["stale-id".to_string()]);
    }

    #[test]
    fn metadata_token_is_used_without_configured_token() {
        let seen: Seen = Arc::default();
        let record = seen.clone();
        let token = warp::path("token")
            .and(warp::header::exact("metadata-flavor", "Google"))
            .map(|| {
                warp::reply::json(&json!({
                    "access_token": "meta-token",
                    "expires_in": 3599,
                    "token_type": "Bearer"
                }))
            });
        let files = warp::path!("drive" / "v3" / "files")
            .and(warp::header::<String>("authorization"))
            .map(move |auth: String| {
                record.lock().unwrap().push((auth, HashMap::new()));
                warp::reply::json(&json!({ "files": [] }))
            });
        let addr = test_server::spawn(token.or(files));

        let drive = drive(addr, None);
        drive.prepare().unwrap();
        drive.list("folder-1", 1000).unwrap();
        assert_eq!(seen.lock().unwrap()[0].0, "Bearer meta-token");
    }

    #[test]
    fn unreachable_metadata_server_fails_prepare() {
        let route = warp::path("elsewhere").map(warp::reply);
        let addr = test_server::spawn(route);

        assert!(matches!(
            drive(addr, None).prepare(),
            Err(TransportError::Status { status: 404, .. })
        ));
    }
}
