use super::*;

fn temp_dir(tag: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "fmi_fonts_{tag}_{}_{}",
        std::process::id(),
        nanos
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn style() -> TextStyle {
    TextStyle {
        font_size: 19.0,
        script: Script::Latin,
        emphasized: false,
    }
}

#[test]
fn empty_book_measures_zero() {
    let book = FontBook::empty();
    assert!(book.is_empty());
    assert_eq!(book.measure("anything", &style()), 0.0);
}

#[test]
fn missing_directory_yields_empty_book() {
    let book = FontBook::load_dir(std::path::Path::new("/definitely/not/a/font/dir"));
    assert!(book.is_empty());
}

#[test]
fn non_font_files_are_skipped() {
    let dir = temp_dir("junk");
    std::fs::write(dir.join("broken.ttf"), b"not a font").unwrap();
    std::fs::write(dir.join("notes.txt"), b"ignored").unwrap();

    let book = FontBook::load_dir(&dir);
    assert!(book.is_empty());
    assert!(book.family_names().is_empty());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn rejects_non_positive_font_size() {
    let book = FontBook::empty();
    let mut s = style();
    s.font_size = 0.0;
    assert!(book.layout_line("x", &s, TextBrushRgba8::default()).is_err());
}

#[test]
fn measures_with_real_font_when_available() {
    let path = std::path::Path::new("tests/data/fonts/NotoSans-Regular.ttf");
    let Ok(bytes) = std::fs::read(path) else {
        eprintln!("skipping: {} not present", path.display());
        return;
    };
    let mut book = FontBook::empty();
    assert!(book.register(bytes) > 0);
    assert!(book.family_names().iter().any(|f| f == "Noto Sans"));

    let short = book.measure("Air", &style());
    let long = book.measure("Air Air Air Air", &style());
    assert!(short > 0.0);
    assert!(long > short * 3.0);
}
