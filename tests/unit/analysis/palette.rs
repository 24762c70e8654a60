use super::*;

fn encode_png(img: image::RgbImage) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn two_tone(w: u32, h: u32, split: u32, left: [u8; 3], right: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_fn(w, h, |x, _| {
        if x < split {
            image::Rgb(left)
        } else {
            image::Rgb(right)
        }
    });
    encode_png(img)
}

#[test]
fn dominant_region_becomes_primary() {
    let bytes = two_tone(20, 10, 15, [200, 30, 30], [20, 20, 220]);
    let palette = extract_palette(&bytes, DEFAULT_CLUSTERS).unwrap();
    let p = palette.primary;
    assert!(p.r > 190 && p.g < 40 && p.b < 40, "primary {p}");
    let s = palette.secondary;
    assert!(s.b > 200 && s.r < 30, "secondary {s}");
}

#[test]
fn identical_input_gives_identical_palette() {
    let img = image::RgbImage::from_fn(24, 24, |x, y| {
        image::Rgb([(x * 10) as u8, (y * 10) as u8, ((x + y) * 5) as u8])
    });
    let bytes = encode_png(img);
    let a = extract_palette(&bytes, DEFAULT_CLUSTERS).unwrap();
    let b = extract_palette(&bytes, DEFAULT_CLUSTERS).unwrap();
    assert_eq!(a, b);
}

#[test]
fn uniform_image_still_yields_distinct_secondary() {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([90, 90, 90]));
    let palette = extract_palette(&encode_png(img), DEFAULT_CLUSTERS).unwrap();
    assert_ne!(palette.primary, palette.secondary);
    assert!(palette.secondary.r > palette.primary.r);
}

#[test]
fn rejects_too_few_clusters() {
    let bytes = two_tone(4, 4, 2, [0, 0, 0], [255, 255, 255]);
    let err = extract_palette(&bytes, 1).unwrap_err();
    assert!(matches!(err, FmiError::Validation(_)));
}

#[test]
fn undecodable_bytes_are_an_artwork_error() {
    let err = extract_palette(b"definitely not an image", DEFAULT_CLUSTERS).unwrap_err();
    assert!(matches!(err, FmiError::ArtworkUnavailable(_)));
}

#[test]
fn first_clearly_distinct_candidate_wins() {
    let ranked = [
        Lab::new(50.0, 0.0, 0.0),
        Lab::new(52.0, 1.0, 0.0),
        Lab::new(50.0, 60.0, 40.0),
        Lab::new(10.0, -70.0, -70.0),
    ];
    assert_eq!(pick_secondary(&ranked), 2);
}

#[test]
fn second_rank_kept_when_already_distinct() {
    let ranked = [
        Lab::new(20.0, 0.0, 0.0),
        Lab::new(80.0, 0.0, 0.0),
        Lab::new(50.0, 60.0, 40.0),
    ];
    assert_eq!(pick_secondary(&ranked), 1);
}

#[test]
fn falls_back_to_most_distant_within_first_four() {
    let ranked = [
        Lab::new(50.0, 0.0, 0.0),
        Lab::new(51.0, 0.0, 0.0),
        Lab::new(55.0, 0.0, 0.0),
        Lab::new(53.0, 0.0, 0.0),
        Lab::new(5.0, 80.0, 80.0),
    ];
    assert_eq!(pick_secondary(&ranked), 2);
}
