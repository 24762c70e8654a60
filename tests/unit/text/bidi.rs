use super::*;

#[test]
fn latin_passes_through() {
    assert_eq!(to_visual("Moon Safari"), "Moon Safari");
}

#[test]
fn hebrew_is_reversed_into_visual_order() {
    assert_eq!(to_visual("שלום"), "םולש");
}

#[test]
fn embedded_latin_keeps_its_own_order() {
    let out = to_visual("abc שלום");
    assert!(out.starts_with("abc "), "{out}");
    assert!(out.ends_with("םולש"), "{out}");
}

#[test]
fn arabic_is_reshaped_to_presentation_forms() {
    let out = to_visual("سلام");
    assert!(!out.is_empty());
    for c in out.chars() {
        assert!(
            ('\u{FB50}'..='\u{FEFF}').contains(&c),
            "unshaped char U+{:04X} in {out}",
            c as u32
        );
    }
}
