use super::*;

fn temp_path(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir()
        .join(format!("fmi_registry_{tag}_{}_{}", std::process::id(), nanos))
        .join("users.json")
}

#[test]
fn missing_file_is_empty() {
    let reg = JsonFileRegistry::open(temp_path("missing")).unwrap();
    assert_eq!(reg.find("42").unwrap(), None);
}

#[test]
fn link_is_an_upsert_and_persists() {
    let path = temp_path("upsert");
    {
        let reg = JsonFileRegistry::open(&path).unwrap();
        reg.link("42", "first_name").unwrap();
        reg.link("42", " second_name ").unwrap();
        reg.link("7", "other").unwrap();
        assert_eq!(reg.find("42").unwrap().as_deref(), Some("second_name"));
    }

    let reopened = JsonFileRegistry::open(&path).unwrap();
    assert_eq!(reopened.find("42").unwrap().as_deref(), Some("second_name"));
    assert_eq!(reopened.find("7").unwrap().as_deref(), Some("other"));

    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[test]
fn blank_values_are_rejected() {
    let reg = JsonFileRegistry::open(temp_path("blank")).unwrap();
    assert!(matches!(reg.link("42", "  "), Err(FmiError::Validation(_))));
    assert!(matches!(reg.link("", "name"), Err(FmiError::Validation(_))));
}

#[test]
fn corrupt_file_is_an_error() {
    let path = temp_path("corrupt");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"[not, an, object").unwrap();
    assert!(JsonFileRegistry::open(&path).is_err());
    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}
