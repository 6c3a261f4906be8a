mod common;

use common::*;
use swf_core::{Character, Drawable, ExtractOptions, Extractor, SpriteDefinition};
use swf_data::{Error, ErrorFlags, Rectangle, Rgba};
use std::rc::Rc;

fn tolerant() -> ExtractOptions {
    ExtractOptions {
        errors: ErrorFlags::default().difference(ErrorFlags::CIRCULAR_REFERENCE),
    }
}

fn sprite(extractor: &Extractor, id: u16) -> Rc<SpriteDefinition> {
    match extractor.character(id).unwrap() {
        Character::Sprite(sprite) => sprite,
        other => panic!("Expected sprite, got {other:?}"),
    }
}

fn self_referencing() -> Vec<u8> {
    stream(&[define_sprite(5, 1, &[place(1, 5, None), show_frame()])])
}

fn mutually_referencing() -> Vec<u8> {
    stream(&[
        define_shape(1, Rectangle::new(0, 20, 0, 20), &[Rgba::new(0, 0, 255, 255)]),
        define_sprite(5, 1, &[place(1, 6, None), show_frame()]),
        define_sprite(6, 1, &[place(1, 5, None), show_frame()]),
        define_sprite(7, 1, &[place(1, 1, None), show_frame()]),
    ])
}

#[test]
fn test_self_reference_is_reported() {
    let extractor = Extractor::builder(self_referencing()).build();
    let sprite = sprite(&extractor, 5);
    assert!(matches!(sprite.timeline(), Err(Error::CircularReference { id: 5 })));
    assert!(!sprite.is_resolved());
    // the failed attempt leaves the sprite resolvable again
    assert!(matches!(sprite.timeline(), Err(Error::CircularReference { id: 5 })));
}

#[test]
fn test_self_reference_degrades_to_empty() {
    let extractor = Extractor::builder(self_referencing()).options(tolerant()).build();
    let sprite = sprite(&extractor, 5);
    let timeline = sprite.timeline().unwrap();
    assert_eq!(timeline.frames_count(false).unwrap(), 1);
    assert!(timeline.frames()[0].objects.is_empty());
    assert_eq!(sprite.bounds().unwrap(), Rectangle::ZERO);
    assert!(sprite.is_resolved());
}

#[test]
fn test_two_sprite_cycle_is_reported() {
    let extractor = Extractor::builder(mutually_referencing()).build();
    assert!(matches!(sprite(&extractor, 6).timeline(), Err(Error::CircularReference { id: 6 })));
    assert!(matches!(sprite(&extractor, 5).timeline(), Err(Error::CircularReference { id: 5 })));
    assert_eq!(sprite(&extractor, 7).timeline().unwrap().frames()[0].objects.len(), 1);
}

#[test]
fn test_two_sprite_cycle_degrades_to_empty() {
    let extractor = Extractor::builder(mutually_referencing()).options(tolerant()).build();
    for id in [5, 6] {
        let timeline = sprite(&extractor, id).timeline().unwrap();
        assert!(timeline.frames()[0].objects.is_empty(), "sprite {id} should be empty");
    }
    let unrelated = sprite(&extractor, 7).timeline().unwrap();
    assert_eq!(unrelated.frames()[0].objects.len(), 1);
    assert_eq!(unrelated.bounds().unwrap(), Rectangle::new(0, 20, 0, 20));
}

#[test]
fn test_cycle_on_root_timeline() {
    let mut tags = vec![define_sprite(5, 1, &[place(1, 5, None), show_frame()])];
    tags.extend([place(1, 5, None), show_frame()]);

    let strict = Extractor::builder(stream(&tags)).build();
    assert!(matches!(strict.timeline(false), Err(Error::CircularReference { id: 5 })));

    let tolerant = Extractor::builder(stream(&tags)).options(tolerant()).build();
    let timeline = tolerant.timeline(false).unwrap();
    assert_eq!(timeline.frames()[0].objects.len(), 1);
    assert_eq!(timeline.frames_count(true).unwrap(), 1);
}
