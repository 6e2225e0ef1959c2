// Property tests: index exactness under arbitrary mutation sequences,
// undo as a perfect inverse, and textual round trips.

use std::collections::BTreeSet;

use proptest::prelude::*;

use muse_chain::db::Table;
use muse_chain::object::{
    content_by_genre_index, content_genres, ContentByGenreIndex, ContentObject,
};
use muse_common::asset::Asset;

#[derive(Clone, Debug)]
enum Mutation {
    Create { genre_1: u32, genre_2: Option<u32>, track_genre: u32 },
    Retag { slot: usize, genre_1: u32, genre_2: Option<u32> },
    Remove { slot: usize },
}

fn mutation_strategy() -> impl Strategy<Value = Mutation> {
    let genre = 0u32..6;
    prop_oneof![
        (genre.clone(), proptest::option::of(0u32..6), genre.clone()).prop_map(
            |(genre_1, genre_2, track_genre)| Mutation::Create {
                genre_1,
                genre_2,
                track_genre,
            }
        ),
        (any::<usize>(), genre.clone(), proptest::option::of(0u32..6)).prop_map(
            |(slot, genre_1, genre_2)| Mutation::Retag { slot, genre_1, genre_2 }
        ),
        any::<usize>().prop_map(|slot| Mutation::Remove { slot }),
    ]
}

fn fresh_content_table() -> Table<ContentObject> {
    let mut table = Table::default();
    table.register_index(content_by_genre_index());
    table
}

fn live_instances(table: &Table<ContentObject>) -> Vec<u64> {
    table.iter().map(|content| content.id).collect()
}

fn apply_mutation(table: &mut Table<ContentObject>, mutation: &Mutation) {
    match mutation {
        Mutation::Create { genre_1, genre_2, track_genre } => {
            table.create(|content| {
                content.url = format!("ipfs://Qm{}", content.id);
                content.album_meta.genre_1 = *genre_1;
                content.album_meta.genre_2 = *genre_2;
                content.track_meta.genre_1 = *track_genre;
            });
        }
        Mutation::Retag { slot, genre_1, genre_2 } => {
            let live = live_instances(table);
            if live.is_empty() {
                return;
            }
            let instance = live[slot % live.len()];
            table
                .modify(instance, |content| {
                    content.album_meta.genre_1 = *genre_1;
                    content.album_meta.genre_2 = *genre_2;
                })
                .expect("live instance");
        }
        Mutation::Remove { slot } => {
            let live = live_instances(table);
            if live.is_empty() {
                return;
            }
            table.remove(live[slot % live.len()]).expect("live instance");
        }
    }
}

proptest! {
    // The by-genre index returns exactly { c : g in genres(c) } after any
    // mutation sequence.
    #[test]
    fn genre_index_matches_brute_force(mutations in proptest::collection::vec(mutation_strategy(), 1..40)) {
        let mut table = fresh_content_table();
        for mutation in &mutations {
            apply_mutation(&mut table, mutation);

            let index = table.index::<ContentByGenreIndex>().expect("registered");
            let mut genres_in_use: BTreeSet<u32> = BTreeSet::new();
            for content in table.iter() {
                genres_in_use.extend(content_genres(content));
            }
            for genre in 0u32..8 {
                let expected: BTreeSet<u64> = table
                    .iter()
                    .filter(|content| content_genres(content).contains(&genre))
                    .map(|content| content.id)
                    .collect();
                prop_assert_eq!(index.find(&genre), &expected);
                if !genres_in_use.contains(&genre) {
                    prop_assert!(index.find(&genre).is_empty());
                }
            }
        }
    }

    // Apply-then-undo restores the store byte for byte, whatever happens
    // inside the session.
    #[test]
    fn undo_is_a_perfect_inverse(
        prefix in proptest::collection::vec(mutation_strategy(), 0..15),
        inside in proptest::collection::vec(mutation_strategy(), 1..25),
    ) {
        let mut table = fresh_content_table();
        for mutation in &prefix {
            apply_mutation(&mut table, mutation);
        }
        let before = table.state_repr();

        table.begin_undo();
        for mutation in &inside {
            apply_mutation(&mut table, mutation);
        }
        table.undo_level().expect("open session");

        prop_assert_eq!(table.state_repr(), before);

        // and the indices were rewound too
        let index = table.index::<ContentByGenreIndex>().expect("registered");
        for genre in 0u32..8 {
            let expected: BTreeSet<u64> = table
                .iter()
                .filter(|content| content_genres(content).contains(&genre))
                .map(|content| content.id)
                .collect();
            prop_assert_eq!(index.find(&genre), &expected);
        }
    }

    // Nested sessions: merging the inner into the outer and undoing the
    // outer is the same as never having opened either.
    #[test]
    fn merged_sessions_undo_together(
        outer in proptest::collection::vec(mutation_strategy(), 1..15),
        inner in proptest::collection::vec(mutation_strategy(), 1..15),
    ) {
        let mut table = fresh_content_table();
        table.create(|content| {
            content.url = "ipfs://QmSeed".to_owned();
            content.album_meta.genre_1 = 1;
        });
        let before = table.state_repr();

        table.begin_undo();
        for mutation in &outer {
            apply_mutation(&mut table, mutation);
        }
        table.begin_undo();
        for mutation in &inner {
            apply_mutation(&mut table, mutation);
        }
        table.merge_level().expect("inner session");
        table.undo_level().expect("outer session");

        prop_assert_eq!(table.state_repr(), before);
    }

    // parse(format(asset)) == asset for in-range amounts
    #[test]
    fn asset_text_round_trip(amount in -1_000_000_000_000i64..1_000_000_000_000i64, instance in 0u64..100) {
        let asset = Asset::new(amount, muse_common::asset::AssetId::new(instance));
        let text = asset.to_string();
        let parsed: Asset = text.parse().expect("formatted assets parse");
        prop_assert_eq!(parsed, asset);
    }
}
