use super::guard::contain;
use super::guard::contain_with_message;
use super::text::clean_rich_text;

#[test]
fn clean_rich_text_strips_tags_and_trims() {
    assert_eq!(
        clean_rich_text("  <color=#FF0000>Amuro</color> Ray "),
        "Amuro Ray"
    );
}

#[test]
fn clean_rich_text_drops_invisible_characters() {
    assert_eq!(clean_rich_text("Lv\u{200B}.\u{FEFF}5"), "Lv.5");
    assert_eq!(clean_rich_text("HP\u{00A0}4500"), "HP 4500");
}

#[test]
fn clean_rich_text_keeps_plain_text() {
    assert_eq!(clean_rich_text("Double Attack"), "Double Attack");
    assert_eq!(clean_rich_text(""), "");
}

#[test]
fn contain_turns_panic_into_none() {
    let result: Option<u32> = contain(|| panic!("foreign read exploded"));
    assert!(result.is_none());
    assert_eq!(contain(|| 7), Some(7));
}

#[test]
fn contain_with_message_keeps_panic_text() {
    let result: Result<(), String> = contain_with_message(|| panic!("bad pointer {}", 3));
    assert_eq!(result.unwrap_err(), "bad pointer 3");
}
