use caravel_engine::context::{PageContext, StepContext};
use caravel_types::entity::EntityRef;
use proptest::prelude::*;

fn entity_refs() -> impl Strategy<Value = Option<Vec<EntityRef>>> {
    proptest::option::of(proptest::collection::vec(
        ("[a-z]{1,8}", "[a-z0-9-]{1,8}").prop_map(|(external_id, destination_id)| EntityRef {
            external_id,
            destination_id,
        }),
        0..4,
    ))
}

fn contexts() -> impl Strategy<Value = StepContext> {
    (
        entity_refs(),
        entity_refs(),
        entity_refs(),
        any::<bool>(),
        0u64..1000,
        0u64..200,
        proptest::option::of(0i64..100),
    )
        .prop_map(
            |(labels, issues, pages, has_more, cursor, processed, state)| StepContext {
                labels,
                issues,
                pages,
                comments: None,
                users: None,
                page_ctx: PageContext {
                    has_more,
                    cursor,
                    processed,
                },
                state: state.map(|s| serde_json::json!({ "token": s })),
            },
        )
}

proptest! {
    #[test]
    fn empty_is_left_identity(ctx in contexts()) {
        prop_assert_eq!(StepContext::empty().merged(ctx.clone()), ctx);
    }

    #[test]
    fn empty_is_right_identity(ctx in contexts()) {
        prop_assert_eq!(ctx.clone().merged(StepContext::empty()), ctx);
    }

    #[test]
    fn merge_is_associative(a in contexts(), b in contexts(), c in contexts()) {
        let left = a.clone().merged(b.clone()).merged(c.clone());
        let right = a.merged(b.merged(c));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn processed_sums_across_pages(a in contexts(), b in contexts()) {
        let expected = a.page_ctx.processed + b.page_ctx.processed;
        prop_assert_eq!(a.merged(b).page_ctx.processed, expected);
    }
}
