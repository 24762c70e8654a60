use super::*;

#[test]
fn channel_sum_does_not_overflow() {
    assert_eq!(Rgb8::WHITE.channel_sum(), 765);
    assert_eq!(Rgb8::new(100, 100, 51).channel_sum(), 251);
}

#[test]
fn hex_formatting_is_lowercase_and_padded() {
    assert_eq!(Rgb8::new(1, 171, 255).to_hex(), "#01abff");
    assert_eq!(Rgb8::BLACK.to_string(), "#000000");
}
