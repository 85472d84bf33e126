//! Dock store contract and property-list implementation.
//!
//! # Responsibility
//! - Decode `persistent-apps` / `persistent-others` tiles into a `DockLayout`.
//! - Encode a `DockLayout` back into tiles, keeping every other plist key.
//!
//! # Invariants
//! - Newly written file tiles carry `_CFURLStringType = 0`, which makes the
//!   Dock re-resolve bookmark metadata on its next read. URL tiles carry 15.
//! - Every written tile gets a freshly generated `GUID`.
//! - Spacer tiles are not layout entries; extraction skips them.
//! - The file is written back in binary plist format.

use crate::model::dock::{
    normalize_app_path, normalize_directory_path, path_label, Arrangement, DirectoryTile,
    DisplayAs, DockLayout, DockTile, FileTile, ShowAs, UrlTile,
};
use crate::repo::{StoreError, StoreResult};
use log::{debug, error, info};
use once_cell::sync::Lazy;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use plist::{Dictionary, Value};
use regex::Regex;
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

const PERSISTENT_APPS_KEY: &str = "persistent-apps";
const PERSISTENT_OTHERS_KEY: &str = "persistent-others";

const URL_STRING_KEY: &str = "_CFURLString";
const URL_STRING_TYPE_KEY: &str = "_CFURLStringType";
const URL_STRING_TYPE_UNRESOLVED: i64 = 0;
const URL_STRING_TYPE_URL: i64 = 15;

const FILE_TYPE_APP: i64 = 41;
const FILE_TYPE_DIRECTORY: i64 = 2;

const TILE_TYPE_FILE: &str = "file-tile";
const TILE_TYPE_DIRECTORY: &str = "directory-tile";
const TILE_TYPE_URL: &str = "url-tile";
const SPACER_TILE_TYPES: [&str; 3] = ["spacer-tile", "small-spacer-tile", "flex-spacer-tile"];

/// Characters escaped in the path component of a `file://` URL.
const FILE_URL_PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

static FILE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^file://(?:localhost)?(/.*)$").expect("valid file url regex"));

/// Repository interface for the Dock store.
pub trait DockRepository {
    /// Reads the current app and others sections.
    fn extract(&self) -> StoreResult<DockLayout>;
    /// Replaces both sections with tiles built from `layout`.
    fn write(&self, layout: &DockLayout) -> StoreResult<()>;
}

/// Binary-plist-backed Dock repository.
pub struct PlistDockRepository {
    path: PathBuf,
}

impl PlistDockRepository {
    /// Creates repository for an existing plist file.
    pub fn try_new(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(StoreError::StoreMissing(path));
        }
        Ok(Self { path })
    }

    fn load(&self) -> StoreResult<Dictionary> {
        Value::from_file(&self.path)?
            .into_dictionary()
            .ok_or_else(|| StoreError::InvalidData("top-level value is not a dictionary".into()))
    }
}

impl DockRepository for PlistDockRepository {
    fn extract(&self) -> StoreResult<DockLayout> {
        let root = self.load()?;
        let apps = layout_tiles(&root, PERSISTENT_APPS_KEY)?
            .map(decode_app_tile)
            .collect::<StoreResult<Vec<_>>>()?;
        let others = layout_tiles(&root, PERSISTENT_OTHERS_KEY)?
            .map(decode_other_tile)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(DockLayout { apps, others })
    }

    fn write(&self, layout: &DockLayout) -> StoreResult<()> {
        let started_at = Instant::now();
        info!(
            "event=dock_write module=repo status=start apps={} others={}",
            layout.apps.len(),
            layout.others.len()
        );

        let result = self.load().and_then(|mut root| {
            root.insert(
                PERSISTENT_APPS_KEY.to_string(),
                Value::Array(layout.apps.iter().map(|app| encode_app_tile(app)).collect()),
            );
            root.insert(
                PERSISTENT_OTHERS_KEY.to_string(),
                Value::Array(layout.others.iter().map(encode_other_tile).collect()),
            );
            Value::Dictionary(root)
                .to_file_binary(&self.path)
                .map_err(StoreError::from)
        });

        match &result {
            Ok(()) => info!(
                "event=dock_write module=repo status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=dock_write module=repo status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

fn encode_app_tile(path: &str) -> Value {
    let mut tile_data = Dictionary::new();
    tile_data.insert("file-data".to_string(), file_data(&bundle_url(path)));
    tile_data.insert("file-label".to_string(), Value::String(path_label(path)));
    tile_data.insert("file-type".to_string(), integer(FILE_TYPE_APP));
    tile(tile_data, TILE_TYPE_FILE)
}

fn encode_other_tile(tile_value: &DockTile) -> Value {
    let mut tile_data = Dictionary::new();
    match tile_value {
        DockTile::Directory(directory) => {
            tile_data.insert(
                "arrangement".to_string(),
                integer(directory.arrangement.code()),
            );
            tile_data.insert("displayas".to_string(), integer(directory.display_as.code()));
            tile_data.insert("showas".to_string(), integer(directory.show_as.code()));
            tile_data.insert(
                "file-data".to_string(),
                file_data(&bundle_url(&directory.path)),
            );
            tile_data.insert(
                "file-label".to_string(),
                Value::String(path_label(&directory.path)),
            );
            tile_data.insert("file-type".to_string(), integer(FILE_TYPE_DIRECTORY));
            tile(tile_data, TILE_TYPE_DIRECTORY)
        }
        DockTile::File(file) => {
            // No `file-type`: the Dock derives it when it re-resolves the URL.
            tile_data.insert("file-data".to_string(), file_data(&file_url(&file.file)));
            tile_data.insert(
                "file-label".to_string(),
                Value::String(path_label(&file.file)),
            );
            tile(tile_data, TILE_TYPE_FILE)
        }
        DockTile::Url(url) => {
            let mut url_data = Dictionary::new();
            url_data.insert(URL_STRING_KEY.to_string(), Value::String(url.url.clone()));
            url_data.insert(
                URL_STRING_TYPE_KEY.to_string(),
                integer(URL_STRING_TYPE_URL),
            );
            tile_data.insert("label".to_string(), Value::String(url.label.clone()));
            tile_data.insert("url".to_string(), Value::Dictionary(url_data));
            tile(tile_data, TILE_TYPE_URL)
        }
    }
}

fn tile(tile_data: Dictionary, tile_type: &str) -> Value {
    let mut tile = Dictionary::new();
    tile.insert("GUID".to_string(), integer(new_guid()));
    tile.insert("tile-data".to_string(), Value::Dictionary(tile_data));
    tile.insert("tile-type".to_string(), Value::String(tile_type.to_string()));
    Value::Dictionary(tile)
}

fn file_data(url: &str) -> Value {
    let mut file_data = Dictionary::new();
    file_data.insert(URL_STRING_KEY.to_string(), Value::String(url.to_string()));
    file_data.insert(
        URL_STRING_TYPE_KEY.to_string(),
        integer(URL_STRING_TYPE_UNRESOLVED),
    );
    Value::Dictionary(file_data)
}

fn integer(value: i64) -> Value {
    Value::Integer(value.into())
}

fn new_guid() -> i64 {
    i64::from(Uuid::new_v4().as_u128() as u32)
}

/// Percent-encoded `file://` URL of a plain file.
fn file_url(path: &str) -> String {
    format!("file://{}", utf8_percent_encode(path, FILE_URL_PATH))
}

/// `file://` URL with the trailing slash the Dock uses for bundles and directories.
fn bundle_url(path: &str) -> String {
    format!("{}/", file_url(path.trim_end_matches('/')))
}

/// Decodes a `file://` URL (or a plain absolute path) into a filesystem path.
fn path_from_file_url(url: &str) -> StoreResult<String> {
    if let Some(captures) = FILE_URL_RE.captures(url) {
        let decoded = percent_decode_str(&captures[1])
            .decode_utf8()
            .map_err(|_| StoreError::InvalidData(format!("file url is not UTF-8: `{url}`")))?;
        return Ok(decoded.into_owned());
    }
    if url.starts_with('/') {
        return Ok(url.to_string());
    }
    Err(StoreError::InvalidData(format!(
        "unsupported file url `{url}`"
    )))
}

fn decode_app_tile(value: &Value) -> StoreResult<String> {
    let tile_data = tile_data(value)?;
    let url = url_string(dictionary_field(tile_data, "file-data")?)?;
    Ok(normalize_app_path(&path_from_file_url(url)?))
}

fn decode_other_tile(value: &Value) -> StoreResult<DockTile> {
    let tile_type = tile_type(value)
        .ok_or_else(|| StoreError::InvalidData("tile is missing `tile-type`".into()))?;
    let tile_data = tile_data(value)?;

    match tile_type {
        TILE_TYPE_FILE => {
            let url = url_string(dictionary_field(tile_data, "file-data")?)?;
            Ok(DockTile::File(FileTile {
                file: normalize_directory_path(&path_from_file_url(url)?),
            }))
        }
        TILE_TYPE_DIRECTORY => {
            let url = url_string(dictionary_field(tile_data, "file-data")?)?;
            let arrangement = decode_code(tile_data, "arrangement", Arrangement::from_code)?;
            let display_as = decode_code(tile_data, "displayas", DisplayAs::from_code)?;
            let show_as = decode_code(tile_data, "showas", ShowAs::from_code)?;
            Ok(DockTile::Directory(DirectoryTile {
                path: normalize_directory_path(&path_from_file_url(url)?),
                arrangement: arrangement.unwrap_or_default(),
                display_as: display_as.unwrap_or_default(),
                show_as: show_as.unwrap_or_default(),
            }))
        }
        TILE_TYPE_URL => {
            let url = url_string(dictionary_field(tile_data, "url")?)?;
            let label = tile_data
                .get("label")
                .and_then(Value::as_string)
                .unwrap_or(url);
            Ok(DockTile::Url(UrlTile {
                url: url.to_string(),
                label: label.to_string(),
            }))
        }
        other => Err(StoreError::InvalidData(format!(
            "unsupported tile type `{other}`"
        ))),
    }
}

fn decode_code<T>(
    tile_data: &Dictionary,
    key: &str,
    from_code: fn(i64) -> Option<T>,
) -> StoreResult<Option<T>> {
    let Some(value) = tile_data.get(key) else {
        return Ok(None);
    };
    let code = value
        .as_signed_integer()
        .ok_or_else(|| StoreError::InvalidData(format!("`{key}` is not an integer")))?;
    from_code(code)
        .map(Some)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown `{key}` code {code}")))
}

/// Tiles under `key` with spacers filtered out.
fn layout_tiles<'a>(
    root: &'a Dictionary,
    key: &'a str,
) -> StoreResult<impl Iterator<Item = &'a Value> + 'a> {
    Ok(tile_array(root, key)?.iter().filter(move |tile| {
        let spacer = tile_type(tile)
            .is_some_and(|kind| SPACER_TILE_TYPES.iter().any(|spacer| *spacer == kind));
        if spacer {
            debug!("event=dock_extract module=repo status=skip section={key} reason=spacer");
        }
        !spacer
    }))
}

fn tile_type(value: &Value) -> Option<&str> {
    value
        .as_dictionary()
        .and_then(|tile| tile.get("tile-type"))
        .and_then(Value::as_string)
}

fn tile_array<'a>(root: &'a Dictionary, key: &str) -> StoreResult<&'a [Value]> {
    match root.get(key) {
        None => Ok(&[]),
        Some(Value::Array(tiles)) => Ok(tiles.as_slice()),
        Some(_) => Err(StoreError::InvalidData(format!("`{key}` is not an array"))),
    }
}

fn tile_data(value: &Value) -> StoreResult<&Dictionary> {
    let tile = value
        .as_dictionary()
        .ok_or_else(|| StoreError::InvalidData("tile is not a dictionary".into()))?;
    dictionary_field(tile, "tile-data")
}

fn dictionary_field<'a>(dictionary: &'a Dictionary, key: &str) -> StoreResult<&'a Dictionary> {
    dictionary
        .get(key)
        .and_then(Value::as_dictionary)
        .ok_or_else(|| StoreError::InvalidData(format!("tile is missing `{key}` dictionary")))
}

fn url_string(dictionary: &Dictionary) -> StoreResult<&str> {
    dictionary
        .get(URL_STRING_KEY)
        .and_then(Value::as_string)
        .ok_or_else(|| StoreError::InvalidData(format!("tile is missing `{URL_STRING_KEY}`")))
}
