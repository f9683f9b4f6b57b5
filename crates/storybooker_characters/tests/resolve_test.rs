//! Roster resolution and subject injection.

use std::path::PathBuf;
use storybooker_characters::{
    inject_subjects, match_character_to_subject, resolve, seed_for_name,
};
use storybooker_core::{Character, StoryBeat};

fn pinned_luna() -> Character {
    let mut luna = Character::new("Luna")
        .with_species("mouse")
        .with_description("A small grey mouse with a blue cape");
    luna.seed = Some(7);
    luna.reference_image_path = Some(PathBuf::from("/store/chr_luna/image.png"));
    luna
}

#[test]
fn test_luna_merges_and_robot_is_admitted() {
    let pinned = vec![pinned_luna()];
    let extracted = vec![
        Character::new("Luna").with_species("mouse"),
        Character::new("Bolt").with_species("robot"),
    ];

    let roster = resolve(&pinned, &extracted);

    assert_eq!(roster.names(), vec!["Luna", "Bolt"]);
    assert_eq!(roster.merges().len(), 1);
    assert_eq!(roster.merges()[0].merged_into(), "Luna");

    let luna = roster.find("luna").unwrap();
    assert!(*luna.pinned());
    assert_eq!(luna.character(), &pinned_luna());

    let bolt = roster.find("Bolt").unwrap();
    assert!(!*bolt.pinned());
    assert_eq!(bolt.character().seed, Some(seed_for_name("Bolt")));
}

#[test]
fn test_species_variant_becomes_alias() {
    let roster = resolve(
        &[pinned_luna()],
        &[Character::new("Little Luna").with_species("mouse")],
    );

    assert_eq!(roster.len(), 1);
    assert_eq!(roster.find("Luna").unwrap().aliases(), &vec!["Little Luna".to_string()]);
}

#[test]
fn test_resolve_is_idempotent() {
    let pinned = vec![pinned_luna()];
    let extracted = vec![
        Character::new("Bolt").with_species("robot"),
        Character::new("Pip").with_species("sparrow"),
        Character::new("luna").with_species("mouse"),
    ];

    let first = resolve(&pinned, &extracted);
    let second = resolve(&pinned, &extracted);
    assert_eq!(first.characters(), second.characters());
}

#[test]
fn test_pinned_always_survive() {
    let pinned = vec![
        Character::new("Luna").with_species("mouse"),
        Character::new("Oak").with_species("tree"),
    ];
    let extracted = vec![
        Character::new("Oak").with_species("owl"),
        Character::new("Mossy").with_species("tree"),
    ];

    let roster = resolve(&pinned, &extracted);
    for pin in &pinned {
        assert!(roster.names().contains(&pin.name.as_str()));
    }
    assert!(roster.len() <= pinned.len() + extracted.len());
}

#[test]
fn test_same_name_below_threshold_is_not_duplicated() {
    let pinned = vec![Character::new("Oak").with_species("tree")];
    let roster = resolve(&pinned, &[Character::new("OAK").with_species("owl")]);
    assert_eq!(roster.len(), 1);
}

#[test]
fn test_duplicate_extractions_admitted_once() {
    let extracted = vec![
        Character::new("Bolt").with_species("robot"),
        Character::new("Bolt").with_species("robot"),
    ];
    let roster = resolve(&[], &extracted);
    assert_eq!(roster.names(), vec!["Bolt"]);
}

#[test]
fn test_inject_mentioned_and_forced_subjects() {
    let roster = resolve(
        &[pinned_luna()],
        &[Character::new("Bolt").with_species("robot")],
    );
    let mut beats = vec![
        StoryBeat::new("The sun rose over the hill.", "a sunrise"),
        StoryBeat::new("Bolt the robot waved.", "a robot waving")
            .with_subjects(vec!["sun".to_string()]),
        StoryBeat::new("Luna met Bolt.", "a mouse and a robot")
            .with_subjects(vec!["small robot".to_string()]),
    ];

    let added = inject_subjects(&mut beats, &roster);

    assert_eq!(beats[0].subjects, vec!["Luna"]);
    assert_eq!(beats[1].subjects, vec!["sun", "Bolt"]);
    assert_eq!(beats[2].subjects, vec!["small robot", "Luna"]);
    assert_eq!(added, 3);
}

#[test]
fn test_similar_subject_does_not_hide_pinned_character() {
    let roster = resolve(&[pinned_luna()], &[]);
    let mut beats = vec![
        StoryBeat::new("The rover rolled across the crater.", "a moon buggy")
            .with_subjects(vec!["Lunar rover".to_string()]),
    ];

    let added = inject_subjects(&mut beats, &roster);

    assert_eq!(added, 1);
    assert_eq!(beats[0].subjects, vec!["Lunar rover", "Luna"]);
}

#[test]
fn test_match_subject_to_character() {
    let characters = vec![
        Character::new("Captain Whiskers").with_species("cat"),
        Character::new("Luna").with_species("mouse"),
    ];

    let by_part = match_character_to_subject("the whiskers", &characters).unwrap();
    assert_eq!(by_part.name, "Captain Whiskers");
    let by_species = match_character_to_subject("a tiny mouse", &characters).unwrap();
    assert_eq!(by_species.name, "Luna");
    assert!(match_character_to_subject("a red balloon", &characters).is_none());
}
