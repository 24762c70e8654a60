use std::sync::Mutex;

use super::*;
use crate::artwork::fetch::{FetchError, FetchResponse};

const RECENT: &str = r##"{
  "recenttracks": {
    "track": [
      {
        "artist": {"mbid": "", "#text": "Air"},
        "name": "La Femme d'Argent",
        "album": {"mbid": "", "#text": "Moon Safari"},
        "image": [
          {"size": "small", "#text": "https://img.test/34s.jpg"},
          {"size": "medium", "#text": "https://img.test/64s.jpg"},
          {"size": "large", "#text": "https://img.test/174s.jpg"},
          {"size": "extralarge", "#text": "https://img.test/300x300.jpg"}
        ]
      },
      {
        "artist": {"#text": "Older"},
        "name": "Older",
        "album": {"#text": "Older"},
        "image": []
      }
    ],
    "@attr": {"user": "someone", "page": "1"}
  }
}"##;

struct Canned {
    resp: Result<FetchResponse, FetchError>,
    urls: Mutex<Vec<String>>,
}

impl Canned {
    fn new(resp: Result<FetchResponse, FetchError>) -> Arc<Self> {
        Arc::new(Self {
            resp,
            urls: Mutex::new(Vec::new()),
        })
    }
}

impl HttpFetch for Canned {
    async fn get(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        self.urls.lock().unwrap().push(request.url);
        self.resp.clone()
    }
}

fn client(http: Arc<Canned>) -> LastFmClient<Canned> {
    LastFmClient::new(
        http,
        LastFmConfig {
            api_key: "k3y".to_string(),
            ..LastFmConfig::default()
        },
        Duration::from_secs(1),
    )
    .unwrap()
}

#[test]
fn scrobble_requires_every_field() {
    assert!(Scrobble::new("t", "a", "b", "u").is_ok());
    let err = Scrobble::new("t", "", "b", "u").unwrap_err();
    assert!(matches!(err, FmiError::ScrobbleIncomplete("artist")));
    let err = Scrobble::new("t", "a", "b", " ").unwrap_err();
    assert!(matches!(err, FmiError::ScrobbleIncomplete("artwork link")));
    let err = Scrobble::new("", "", "", "").unwrap_err();
    assert!(matches!(err, FmiError::ScrobbleIncomplete("title")));
}

#[test]
fn parses_newest_track_with_large_image() {
    let s = parse_recent_tracks(RECENT.as_bytes()).unwrap();
    assert_eq!(s.title(), "La Femme d'Argent");
    assert_eq!(s.artist(), "Air");
    assert_eq!(s.album(), "Moon Safari");
    assert_eq!(s.art_hint_url(), "https://img.test/174s.jpg");
}

#[test]
fn single_track_object_is_accepted() {
    let body = r##"{"recenttracks":{"track":{"name":"T","artist":{"#text":"A"},"album":{"#text":"B"},"image":[{"#text":"1"},{"#text":"2"},{"#text":"3"}]}}}"##;
    let s = parse_recent_tracks(body.as_bytes()).unwrap();
    assert_eq!(s.art_hint_url(), "3");
}

#[test]
fn empty_history_is_no_recent_activity() {
    let err = parse_recent_tracks(br#"{"recenttracks":{"track":[]}}"#).unwrap_err();
    assert!(matches!(
        err,
        FmiError::ScrobbleUnavailable(ScrobbleFailure::NoRecentActivity)
    ));
}

#[test]
fn missing_album_is_incomplete() {
    let body = r##"{"recenttracks":{"track":[{"name":"T","artist":{"#text":"A"},"album":{"#text":""},"image":[{"#text":"1"},{"#text":"2"},{"#text":"3"}]}]}}"##;
    let err = parse_recent_tracks(body.as_bytes()).unwrap_err();
    assert!(matches!(err, FmiError::ScrobbleIncomplete("album")));
}

#[test]
fn api_error_codes_map_to_reasons() {
    let err = parse_recent_tracks(br#"{"error":6,"message":"User not found"}"#).unwrap_err();
    assert!(matches!(
        err,
        FmiError::ScrobbleUnavailable(ScrobbleFailure::AccountNotFound)
    ));
    let err = parse_recent_tracks(br#"{"error":29,"message":"Rate limit"}"#).unwrap_err();
    assert!(matches!(
        err,
        FmiError::ScrobbleUnavailable(ScrobbleFailure::ServiceUnreachable)
    ));
}

#[tokio::test]
async fn client_sends_method_user_key_and_format() {
    let http = Canned::new(Ok(FetchResponse::ok(RECENT.as_bytes().to_vec())));
    let s = client(http.clone()).recent("some one").await.unwrap();
    assert_eq!(s.artist(), "Air");

    let urls = http.urls.lock().unwrap().clone();
    let url = url::Url::parse(&urls[0]).unwrap();
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    for (k, v) in [
        ("method", "user.getrecenttracks"),
        ("user", "some one"),
        ("api_key", "k3y"),
        ("format", "json"),
    ] {
        assert!(pairs.contains(&(k.to_string(), v.to_string())), "missing {k}");
    }
}

#[tokio::test]
async fn client_maps_http_failures() {
    let err = client(Canned::new(Ok(FetchResponse::status(404))))
        .recent("ghost")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FmiError::ScrobbleUnavailable(ScrobbleFailure::AccountNotFound)
    ));

    let err = client(Canned::new(Ok(FetchResponse::status(500))))
        .recent("x")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FmiError::ScrobbleUnavailable(ScrobbleFailure::ServiceUnreachable)
    ));

    let err = client(Canned::new(Err(FetchError::Transport {
        url: "u".to_string(),
        detail: "dns".to_string(),
    })))
    .recent("x")
    .await
    .unwrap_err();
    assert!(err.is_transient());
}

#[test]
fn missing_api_key_is_rejected() {
    let err = LastFmClient::new(
        Canned::new(Ok(FetchResponse::status(200))),
        LastFmConfig::default(),
        Duration::from_secs(1),
    )
    .err()
    .unwrap();
    assert!(matches!(err, FmiError::Validation(_)));
}
