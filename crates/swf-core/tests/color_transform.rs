mod common;

use common::*;
use swf_core::{Character, DrawCommand, Drawable, Extractor, Fill};
use swf_data::{ColorTransform, Rectangle, Rgba};

const HALF: ColorTransform = ColorTransform {
    mult: [128, 128, 128, 256],
    add: [0; 4],
};

const ADD_GREEN: ColorTransform = ColorTransform {
    mult: [256; 4],
    add: [0, 255, 0, 0],
};

fn fills(commands: &[DrawCommand]) -> Vec<String> {
    commands
        .iter()
        .filter_map(|command| match command {
            DrawCommand::Shape { fills, .. } => Some(fills.clone()),
            _ => None,
        })
        .flatten()
        .collect()
}

fn extractor() -> Extractor {
    Extractor::builder(stream(&[
        define_shape(1, Rectangle::new(0, 100, 0, 100), &[Rgba::new(255, 0, 0, 255)]),
        define_sprite(2, 1, &[place_with(1, Some(1), false, None, Some(ADD_GREEN)), show_frame()]),
        place(1, 2, None),
        show_frame(),
    ]))
    .build()
}

#[test]
fn test_sprite_transform_composes_object_transforms() {
    let extractor = extractor();
    let Character::Sprite(sprite) = extractor.character(2).unwrap() else {
        panic!("Expected sprite");
    };

    let transformed = sprite.transform_colors(&HALF).unwrap();
    let timeline = transformed.timeline().unwrap();
    let object = &timeline.frames()[0].objects[&1];
    assert_eq!(object.color_transform, None);

    let mut commands: Vec<DrawCommand> = Vec::new();
    transformed.draw(&mut commands, 0).unwrap();
    // red, plus green from the placement, then halved
    assert_eq!(fills(&commands), vec!["S7f7f00ff"]);
}

#[test]
fn test_transform_leaves_original_untouched() {
    let extractor = extractor();
    let character = extractor.character(2).unwrap();
    let before = character.transform_colors(&ColorTransform::IDENTITY).unwrap();

    character.transform_colors(&HALF).unwrap();

    let mut original: Vec<DrawCommand> = Vec::new();
    character.draw(&mut original, 0).unwrap();
    assert_eq!(fills(&original), vec!["Sff0000ff"]);

    let Character::Sprite(sprite) = &character else {
        panic!("Expected sprite");
    };
    let timeline = sprite.timeline().unwrap();
    let object = &timeline.frames()[0].objects[&1];
    assert_eq!(object.color_transform, Some(ADD_GREEN));

    let mut identity: Vec<DrawCommand> = Vec::new();
    before.draw(&mut identity, 0).unwrap();
    assert_eq!(fills(&identity), fills(&original));
}

#[test]
fn test_shared_characters_transform_once() {
    let extractor = Extractor::builder(stream(&[
        define_shape(1, Rectangle::new(0, 100, 0, 100), &[Rgba::new(0, 0, 255, 255)]),
        place(1, 1, None),
        place(2, 1, Some((200, 0))),
        show_frame(),
    ]))
    .build();
    let root = extractor.timeline(false).unwrap();
    let transformed = root.transform_colors(&HALF).unwrap();

    let objects = &transformed.frames()[0].objects;
    assert!(objects[&1].character.ptr_eq(&objects[&2].character));
    assert!(!objects[&1].character.ptr_eq(&root.frames()[0].objects[&1].character));

    let Character::Shape(shape) = &objects[&1].character else {
        panic!("Expected shape");
    };
    let fill = &shape.shape().unwrap().fills[0];
    assert!(matches!(fill, Fill::Solid(color) if *color == Rgba::new(0, 0, 127, 255)));
}

#[test]
fn test_bitmap_identity_follows_pixels() {
    let extractor = Extractor::builder(stream(&[
        define_lossless(4, 1, 1, &[255, 200, 200, 200]),
        define_bitmap_shape(1, Rectangle::new(0, 20, 0, 20), 4),
    ]))
    .build();
    let Character::Shape(shape) = extractor.character(1).unwrap() else {
        panic!("Expected shape");
    };

    let plain = shape.shape().unwrap().fills[0].hash();
    let half = shape.transform_colors(&HALF).unwrap().shape().unwrap().fills[0].hash();
    let again = shape.transform_colors(&HALF).unwrap().shape().unwrap().fills[0].hash();
    assert_eq!(plain, "B014");
    assert!(half.starts_with("B014:"));
    assert_eq!(half, again);
}

#[test]
fn test_identity_transform_draws_the_same() {
    let extractor = extractor();
    let timeline = extractor.timeline(false).unwrap();
    let same = timeline.transform_colors(&ColorTransform::IDENTITY).unwrap();

    let mut before: Vec<DrawCommand> = Vec::new();
    timeline.draw(&mut before, 0).unwrap();
    let mut after: Vec<DrawCommand> = Vec::new();
    same.draw(&mut after, 0).unwrap();

    assert!(!before.is_empty());
    assert_eq!(before, after);
    assert_eq!(same.bounds().unwrap(), timeline.bounds().unwrap());
}

