use iconlayout_core::{
    Arrangement, DirectoryTile, DisplayAs, DockLayout, DockService, DockTile, LayoutValidationError,
    PlistDockRepository, ReconcileError, ShowAs, StoreError,
};
use plist::{Dictionary, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_plist(path: &Path, apps: Vec<Value>, others: Vec<Value>) {
    let mut root = Dictionary::new();
    root.insert("tilesize".to_string(), Value::Integer(48.into()));
    root.insert("persistent-apps".to_string(), Value::Array(apps));
    root.insert("persistent-others".to_string(), Value::Array(others));
    Value::Dictionary(root).to_file_binary(path).unwrap();
}

fn dock_plist() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("com.apple.dock.plist");
    write_plist(&path, Vec::new(), Vec::new());
    (dir, path)
}

fn read_root(path: &Path) -> Dictionary {
    Value::from_file(path).unwrap().into_dictionary().unwrap()
}

fn tiles<'a>(root: &'a Dictionary, key: &str) -> &'a [Value] {
    root.get(key).and_then(Value::as_array).unwrap()
}

fn tile_data(tile: &Value) -> &Dictionary {
    tile.as_dictionary()
        .and_then(|tile| tile.get("tile-data"))
        .and_then(Value::as_dictionary)
        .unwrap()
}

fn int_field(dictionary: &Dictionary, key: &str) -> i64 {
    dictionary
        .get(key)
        .and_then(Value::as_signed_integer)
        .unwrap()
}

fn str_field<'a>(dictionary: &'a Dictionary, key: &str) -> &'a str {
    dictionary.get(key).and_then(Value::as_string).unwrap()
}

fn dict_field<'a>(dictionary: &'a Dictionary, key: &str) -> &'a Dictionary {
    dictionary.get(key).and_then(Value::as_dictionary).unwrap()
}

fn service(path: &Path) -> DockService<PlistDockRepository> {
    DockService::new(PlistDockRepository::try_new(path).unwrap())
}

fn apps_only(apps: &[&str]) -> DockLayout {
    DockLayout {
        apps: apps.iter().map(|app| app.to_string()).collect(),
        others: Vec::new(),
    }
}

#[test]
fn app_tiles_are_written_with_unresolved_file_urls() {
    let (_dir, path) = dock_plist();
    let service = service(&path);

    let outcome = service.reconcile(&apps_only(&["Safari"])).unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.layout.apps, vec!["/Applications/Safari.app".to_string()]);

    let root = read_root(&path);
    let apps = tiles(&root, "persistent-apps");
    assert_eq!(apps.len(), 1);
    let tile = apps[0].as_dictionary().unwrap();
    assert_eq!(str_field(tile, "tile-type"), "file-tile");
    assert!(tile.get("GUID").and_then(Value::as_signed_integer).is_some());

    let data = tile_data(&apps[0]);
    assert_eq!(str_field(data, "file-label"), "Safari");
    assert_eq!(int_field(data, "file-type"), 41);
    let file_data = dict_field(data, "file-data");
    assert_eq!(int_field(file_data, "_CFURLStringType"), 0);
    assert_eq!(
        str_field(file_data, "_CFURLString"),
        "file:///Applications/Safari.app/"
    );

    assert_eq!(int_field(&root, "tilesize"), 48);
    assert_eq!(
        service.extract().unwrap(),
        apps_only(&["/Applications/Safari.app"])
    );
}

#[test]
fn matching_layout_leaves_the_plist_untouched() {
    let (_dir, path) = dock_plist();
    let service = service(&path);
    let layout = apps_only(&["Safari", "/System/Applications/Mail.app/"]);

    assert!(service.reconcile(&layout).unwrap().changed);
    let written = std::fs::read(&path).unwrap();

    let second = service.reconcile(&layout).unwrap();
    assert!(!second.changed);
    assert_eq!(std::fs::read(&path).unwrap(), written);
}

#[test]
fn others_tiles_carry_their_view_settings() {
    let (_dir, path) = dock_plist();
    let service = service(&path);
    let downloads = DockTile::Directory(DirectoryTile {
        path: "/Users/me/My Downloads".to_string(),
        arrangement: Arrangement::DateAdded,
        display_as: DisplayAs::Folder,
        show_as: ShowAs::Grid,
    });
    let layout = DockLayout {
        apps: Vec::new(),
        others: vec![
            downloads.clone(),
            DockTile::url("https://example.com/", "Example"),
        ],
    };

    service.reconcile(&layout).unwrap();

    let root = read_root(&path);
    let others = tiles(&root, "persistent-others");
    assert_eq!(others.len(), 2);

    let directory = tile_data(&others[0]);
    assert_eq!(
        str_field(others[0].as_dictionary().unwrap(), "tile-type"),
        "directory-tile"
    );
    assert_eq!(int_field(directory, "arrangement"), 2);
    assert_eq!(int_field(directory, "displayas"), 1);
    assert_eq!(int_field(directory, "showas"), 2);
    assert_eq!(int_field(directory, "file-type"), 2);
    assert_eq!(str_field(directory, "file-label"), "My Downloads");
    assert_eq!(
        str_field(dict_field(directory, "file-data"), "_CFURLString"),
        "file:///Users/me/My%20Downloads/"
    );

    let url = tile_data(&others[1]);
    assert_eq!(
        str_field(others[1].as_dictionary().unwrap(), "tile-type"),
        "url-tile"
    );
    assert_eq!(str_field(url, "label"), "Example");
    let url_data = dict_field(url, "url");
    assert_eq!(str_field(url_data, "_CFURLString"), "https://example.com/");
    assert_eq!(int_field(url_data, "_CFURLStringType"), 15);

    assert_eq!(service.extract().unwrap(), layout);
}

fn os_app_tile(url: &str) -> Value {
    let mut file_data = Dictionary::new();
    file_data.insert("_CFURLString".to_string(), Value::String(url.to_string()));
    file_data.insert("_CFURLStringType".to_string(), Value::Integer(15.into()));
    let mut data = Dictionary::new();
    data.insert("file-data".to_string(), Value::Dictionary(file_data));
    data.insert("bundle-identifier".to_string(), Value::String("x".into()));
    let mut tile = Dictionary::new();
    tile.insert("tile-data".to_string(), Value::Dictionary(data));
    tile.insert("tile-type".to_string(), Value::String("file-tile".into()));
    Value::Dictionary(tile)
}

fn os_directory_tile(url: &str, show_as: i64) -> Value {
    let mut file_data = Dictionary::new();
    file_data.insert("_CFURLString".to_string(), Value::String(url.to_string()));
    file_data.insert("_CFURLStringType".to_string(), Value::Integer(15.into()));
    let mut data = Dictionary::new();
    data.insert("file-data".to_string(), Value::Dictionary(file_data));
    data.insert("showas".to_string(), Value::Integer(show_as.into()));
    let mut tile = Dictionary::new();
    tile.insert("tile-data".to_string(), Value::Dictionary(data));
    tile.insert(
        "tile-type".to_string(),
        Value::String("directory-tile".into()),
    );
    Value::Dictionary(tile)
}

#[test]
fn tiles_written_by_the_dock_are_decoded() {
    let (_dir, path) = dock_plist();
    write_plist(
        &path,
        vec![os_app_tile("file:///Applications/Visual%20Studio%20Code.app/")],
        vec![os_directory_tile("file:///Users/me/Downloads/", 3)],
    );

    let layout = service(&path).extract().unwrap();

    assert_eq!(
        layout.apps,
        vec!["/Applications/Visual Studio Code.app".to_string()]
    );
    assert_eq!(
        layout.others,
        vec![DockTile::Directory(DirectoryTile {
            path: "/Users/me/Downloads".to_string(),
            arrangement: Arrangement::Name,
            display_as: DisplayAs::Stack,
            show_as: ShowAs::List,
        })]
    );
}

#[test]
fn unknown_view_code_is_a_store_access_error() {
    let (_dir, path) = dock_plist();
    write_plist(
        &path,
        Vec::new(),
        vec![os_directory_tile("file:///Users/me/Downloads/", 9)],
    );

    let err = service(&path).extract().unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::StoreAccess(StoreError::InvalidData(message)) if message.contains("showas")
    ));
}

#[test]
fn missing_plist_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.plist");

    let err = PlistDockRepository::try_new(&path).err().unwrap();
    assert!(matches!(err, StoreError::StoreMissing(missing) if missing == path));
}

#[test]
fn empty_app_path_is_rejected_before_writing() {
    let (_dir, path) = dock_plist();
    let before = std::fs::read(&path).unwrap();

    let err = service(&path)
        .reconcile(&apps_only(&["Safari", "  "]))
        .unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::Validation(LayoutValidationError::EmptyPath { .. })
    ));
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

fn spacer_tile(kind: &str) -> Value {
    let mut tile = Dictionary::new();
    tile.insert("tile-data".to_string(), Value::Dictionary(Dictionary::new()));
    tile.insert("tile-type".to_string(), Value::String(kind.to_string()));
    Value::Dictionary(tile)
}

fn os_document_tile(url: &str) -> Value {
    let mut file_data = Dictionary::new();
    file_data.insert("_CFURLString".to_string(), Value::String(url.to_string()));
    file_data.insert("_CFURLStringType".to_string(), Value::Integer(15.into()));
    let mut data = Dictionary::new();
    data.insert("file-data".to_string(), Value::Dictionary(file_data));
    data.insert("file-type".to_string(), Value::Integer(32.into()));
    let mut tile = Dictionary::new();
    tile.insert("tile-data".to_string(), Value::Dictionary(data));
    tile.insert("tile-type".to_string(), Value::String("file-tile".into()));
    Value::Dictionary(tile)
}

#[test]
fn spacer_tiles_are_skipped_on_extraction() {
    let (_dir, path) = dock_plist();
    write_plist(
        &path,
        vec![
            os_app_tile("file:///Applications/Safari.app/"),
            spacer_tile("spacer-tile"),
            spacer_tile("small-spacer-tile"),
            os_app_tile("file:///Applications/Mail.app/"),
        ],
        vec![spacer_tile("flex-spacer-tile")],
    );
    let service = service(&path);

    assert_eq!(
        service.extract().unwrap(),
        apps_only(&["/Applications/Safari.app", "/Applications/Mail.app"])
    );
    let outcome = service.reconcile(&apps_only(&["Safari", "Mail"])).unwrap();
    assert!(!outcome.changed);
    assert_eq!(tiles(&read_root(&path), "persistent-apps").len(), 4);
}

#[test]
fn pinned_documents_keep_their_file_tile_type() {
    let (_dir, path) = dock_plist();
    write_plist(
        &path,
        Vec::new(),
        vec![os_document_tile("file:///Users/me/Q3%20report.pdf")],
    );
    let service = service(&path);

    let current = service.extract().unwrap();
    assert_eq!(
        current.others,
        vec![DockTile::file("/Users/me/Q3 report.pdf")]
    );
    assert!(!service.reconcile(&current).unwrap().changed);

    let layout = DockLayout {
        apps: vec!["Safari".to_string()],
        others: current.others.clone(),
    };
    assert!(service.reconcile(&layout).unwrap().changed);

    let root = read_root(&path);
    let others = tiles(&root, "persistent-others");
    assert_eq!(
        str_field(others[0].as_dictionary().unwrap(), "tile-type"),
        "file-tile"
    );
    let data = tile_data(&others[0]);
    assert!(data.get("file-type").is_none());
    assert_eq!(str_field(data, "file-label"), "Q3 report.pdf");
    assert_eq!(
        str_field(dict_field(data, "file-data"), "_CFURLString"),
        "file:///Users/me/Q3%20report.pdf"
    );
    assert_eq!(service.extract().unwrap().others, current.others);
}
