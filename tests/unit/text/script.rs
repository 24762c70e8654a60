use super::*;

#[test]
fn classifies_scripts() {
    assert_eq!(Script::classify("La Femme d'Argent"), Script::Latin);
    assert_eq!(Script::classify("残酷な天使のテーゼ"), Script::Cjk);
    assert_eq!(Script::classify("아이유"), Script::Cjk);
    assert_eq!(Script::classify("عمرو دياب"), Script::Rtl);
    assert_eq!(Script::classify("שלום"), Script::Rtl);
    assert_eq!(Script::classify(""), Script::Latin);
}

#[test]
fn rtl_wins_over_cjk_in_mixed_text() {
    assert_eq!(Script::classify("東京 عمرو"), Script::Rtl);
}

#[test]
fn font_stack_ends_with_shared_fallbacks() {
    let stack = Script::Rtl.font_set().font_stack();
    assert!(stack.starts_with("\"Noto Sans Arabic\", \"Heebo\""));
    assert!(stack.ends_with("\"Symbola\", \"Unifont\""));
}

#[test]
fn cjk_titles_use_medium_weight() {
    assert_eq!(Script::Cjk.font_set().emphasis_weight(), 500.0);
    assert_eq!(Script::Latin.font_set().emphasis_weight(), 600.0);
    assert_eq!(Script::Latin.font_set().regular_weight(), 400.0);
}
