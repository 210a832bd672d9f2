//! End-to-end pipeline tests.
//!
//! Each test wires a real `Pipeline` to an in-memory database and a
//! scripted generation client, then checks what ends up in the ledger
//! and the events table.

mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;
use tempfile::TempDir;

use eventmill::gateway::{GatewayError, Provider};
use eventmill::geo::PostcodeTable;
use eventmill::pipeline::MessageOutcome;
use eventmill::SourceKind;

use common::{
    complete_aggregator_event, events_response, minimal_event, HarnessBuilder, MessageBuilder,
};

/// One scripted conversation and the persistence state it must leave behind.
struct FlowCase {
    name: &'static str,
    kind: SourceKind,
    is_newsletter: bool,
    responses: &'static [&'static str],
    expected_note: (bool, &'static str),
    expected_saved: usize,
    expected_calls: usize,
}

const FLOW_CASES: &[FlowCase] = &[
    FlowCase {
        name: "venue event is saved",
        kind: SourceKind::Venue,
        is_newsletter: true,
        responses: &[r#"{"events": [{"title": "Gig night", "start_date": "2025-05-10"}]}"#],
        expected_note: (true, "is_newsletter"),
        expected_saved: 1,
        expected_calls: 1,
    },
    FlowCase {
        name: "fenced output is still parsed",
        kind: SourceKind::Venue,
        is_newsletter: true,
        responses: &[
            "```json\n{\"events\": [{\"title\": \"Gig night\", \"start_date\": \"2025-05-10\"}]}\n```",
        ],
        expected_note: (true, "is_newsletter"),
        expected_saved: 1,
        expected_calls: 1,
    },
    FlowCase {
        name: "prose response saves nothing",
        kind: SourceKind::Venue,
        is_newsletter: true,
        responses: &["No events this week, back in June!"],
        expected_note: (true, "no_events_found"),
        expected_saved: 0,
        expected_calls: 1,
    },
    FlowCase {
        name: "non-newsletter makes no generation calls",
        kind: SourceKind::Unknown,
        is_newsletter: false,
        responses: &[],
        expected_note: (false, "not_newsletter"),
        expected_saved: 0,
        expected_calls: 0,
    },
    FlowCase {
        name: "aggregator event without a url is dropped",
        kind: SourceKind::Aggregate,
        is_newsletter: true,
        responses: &[r#"{"events": [{
            "title": "Life drawing",
            "start_date": "2025-05-10",
            "location_type": "venue",
            "location_address_verbatim": "The Star, 2 Acre Lane",
            "location_postcode": "SW2 5SP",
            "organizer_name": "Drink & Draw"}]}"#],
        expected_note: (true, "no_events_found"),
        expected_saved: 0,
        expected_calls: 1,
    },
    FlowCase {
        name: "low confidence event is dropped",
        kind: SourceKind::Venue,
        is_newsletter: true,
        responses: &[
            r#"{"events": [{"title": "Maybe a gig", "start_date": "2025-05-10", "parsing_confidence_score": 0.1}]}"#,
        ],
        expected_note: (true, "no_events_found"),
        expected_saved: 0,
        expected_calls: 1,
    },
];

#[tokio::test]
async fn test_message_flow_outcomes() {
    for case in FLOW_CASES {
        let mut builder = HarnessBuilder::new();
        for response in case.responses {
            builder = builder.reply(response);
        }
        let h = builder.build();
        let message = MessageBuilder::new("<case@x>")
            .kind(case.kind)
            .newsletter(case.is_newsletter)
            .build();

        h.pipeline.process_message(&message).await.expect(case.name);

        let (expected_ok, expected_note) = case.expected_note;
        assert_eq!(
            h.ledger("<case@x>"),
            Some((expected_ok, expected_note.to_string())),
            "ledger marker for case '{}'",
            case.name
        );
        assert_eq!(
            h.events_for("<case@x>").len(),
            case.expected_saved,
            "saved events for case '{}'",
            case.name
        );
        assert_eq!(
            h.client.calls(),
            case.expected_calls,
            "generation calls for case '{}'",
            case.name
        );
    }
}

#[tokio::test]
async fn test_aggregator_enrichment_merges_search_findings() {
    let extraction = events_response(&[json!({
        "title": "Life drawing",
        "start_date": "2025-05-10",
        "location_type": "venue",
        "location_address_verbatim": "The Star, 2 Acre Lane",
    })]);
    let search = "The class runs at The Star, 2 Acre Lane, SW2 5SP. \
                  Organised by Drink & Draw; tickets at https://example.org/draw.";
    let refinement = r#"{
        "location_postcode": "SW2 5SP",
        "organizer_name": "Drink & Draw",
        "event_url": "https://example.org/draw"
    }"#;
    let h = HarnessBuilder::new()
        .config(r#"{"version": "1.0", "provider": "openai"}"#)
        .reply(&extraction)
        .reply(search)
        .reply(refinement)
        .build();
    let message = MessageBuilder::new("<scoop@x>").aggregator().build();

    let outcome = h
        .pipeline
        .process_message(&message)
        .await
        .expect("enrichment run");

    assert_eq!(
        outcome,
        MessageOutcome::Saved {
            saved: 1,
            dropped: 0
        }
    );
    assert_eq!(h.client.calls(), 3);

    // Extraction and refinement run on the generation model, search on the
    // search model with the web-search tool enabled.
    assert_eq!(h.client.request(0).model, "gpt-4o");
    assert_eq!(h.client.request(1).model, "gpt-4o-mini-search-preview");
    assert!(h.client.request(1).enable_web_search);
    assert!(!h.client.request(0).enable_web_search);
    assert_eq!(h.client.request(2).model, "gpt-4o");

    let saved = h.events_for("<scoop@x>");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].location_postcode.as_deref(), Some("SW2 5SP"));
    assert_eq!(saved[0].organizer_name.as_deref(), Some("Drink & Draw"));
    assert_eq!(saved[0].event_url.as_deref(), Some("https://example.org/draw"));
    assert!(saved[0].from_aggregator);
}

#[tokio::test]
async fn test_complete_aggregator_event_skips_enrichment() {
    let h = HarnessBuilder::new()
        .reply(&events_response(&[complete_aggregator_event(
            "Life drawing",
            "2025-05-10",
        )]))
        .build();
    let message = MessageBuilder::new("<scoop@x>").aggregator().build();

    let outcome = h
        .pipeline
        .process_message(&message)
        .await
        .expect("aggregator run");

    assert_eq!(
        outcome,
        MessageOutcome::Saved {
            saved: 1,
            dropped: 0
        }
    );
    assert_eq!(h.client.calls(), 1);
}

#[tokio::test]
async fn test_unsubscribe_footer_never_reaches_the_prompt() {
    let h = HarnessBuilder::new().reply(r#"{"events": []}"#).build();
    let message = MessageBuilder::new("<m1@x>")
        .body("Poetry night on Friday the 9th of May.\n\nUnsubscribe | 123 Mailing St, London")
        .build();

    h.pipeline
        .process_message(&message)
        .await
        .expect("footer run");

    let prompt = h.client.request(0).user;
    assert!(prompt.contains("Poetry night"));
    assert!(!prompt.contains("Mailing St"));
}

#[tokio::test]
async fn test_scoop_boilerplate_is_cut_for_aggregators() {
    let h = HarnessBuilder::new().reply(r#"{"events": []}"#).build();
    let message = MessageBuilder::new("<scoop@x>")
        .aggregator()
        .sender("hello@thelondonscoop.example.org")
        .body(
            "Hello from The London Scoop!\nintro chatter *EVENTS SCOOP* *.*\n\
             Friday: gig at the Windmill\n*Let me know what you think!\nreply guy outro",
        )
        .build();

    h.pipeline
        .process_message(&message)
        .await
        .expect("boilerplate run");

    let prompt = h.client.request(0).user;
    assert!(prompt.contains("gig at the Windmill"));
    assert!(!prompt.contains("intro chatter"));
    assert!(!prompt.contains("reply guy outro"));
}

#[tokio::test]
async fn test_cached_extraction_survives_a_pipeline_restart() {
    let shared_cache = TempDir::new().expect("cache dir");
    let message = MessageBuilder::new("<m1@x>").build();

    let first = HarnessBuilder::new()
        .cache_path(shared_cache.path())
        .reply(&events_response(&[minimal_event("Gig night", "2025-05-10")]))
        .build();
    let outcome = first
        .pipeline
        .process_message(&message)
        .await
        .expect("first run");
    assert_eq!(
        outcome,
        MessageOutcome::Saved {
            saved: 1,
            dropped: 0
        }
    );
    assert_eq!(first.client.calls(), 1);

    // A fresh pipeline with an empty store but the same cache directory
    // replays the extraction without touching the client.
    let second = HarnessBuilder::new().cache_path(shared_cache.path()).build();
    let outcome = second
        .pipeline
        .process_message(&message)
        .await
        .expect("second run");
    assert_eq!(
        outcome,
        MessageOutcome::Saved {
            saved: 1,
            dropped: 0
        }
    );
    assert_eq!(second.client.calls(), 0);
    assert_eq!(second.events_for("<m1@x>").len(), 1);
}

#[tokio::test]
async fn test_postcode_table_backfills_borough_and_neighbourhood() {
    let dir = TempDir::new().expect("geo dir");
    let path = dir.path().join("postcodes.csv");
    std::fs::write(
        &path,
        "postcode,latitude,longitude,borough,neighbourhood\n\
         SW2 5SP,51.4529,-0.1255,Lambeth,Brixton\n",
    )
    .expect("write postcode data");
    let table = PostcodeTable::load(&path).expect("load postcode data");

    let h = HarnessBuilder::new()
        .geo(Arc::new(table))
        .reply(&events_response(&[json!({
            "title": "Life drawing",
            "start_date": "2025-05-10",
            "location_type": "venue",
            "location_postcode": "sw2 5sp",
        })]))
        .build();
    let message = MessageBuilder::new("<m1@x>").build();

    h.pipeline.process_message(&message).await.expect("geo run");

    let saved = h.events_for("<m1@x>");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].location_borough.as_deref(), Some("Lambeth"));
    assert_eq!(saved[0].location_neighbourhood.as_deref(), Some("Brixton"));
}

#[tokio::test]
async fn test_batch_marks_survivors_and_retries_failures() {
    let h = HarnessBuilder::new()
        .reply(&events_response(&[minimal_event("Gig night", "2025-05-10")]))
        .reply("Nothing on this week.")
        .fail(GatewayError::Api {
            provider: Provider::Anthropic,
            status: 529,
            body: "overloaded".to_string(),
        })
        .reply(&events_response(&[minimal_event(
            "Rescheduled gig",
            "2025-05-17",
        )]))
        .build();
    for (id, day) in [("<m1@x>", 1), ("<m2@x>", 2), ("<m3@x>", 3)] {
        let message = MessageBuilder::new(id)
            .sent_at(
                Utc.with_ymd_and_hms(2025, 5, day, 8, 0, 0)
                    .single()
                    .expect("valid timestamp"),
            )
            .build();
        h.ingest(&message);
    }

    let summary = h.pipeline.run_batch().await.expect("first batch");

    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.saved_messages, 1);
    assert_eq!(summary.saved_events, 1);
    assert_eq!(summary.no_events, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(h.ledger("<m1@x>"), Some((true, "is_newsletter".to_string())));
    assert_eq!(
        h.ledger("<m2@x>"),
        Some((true, "no_events_found".to_string()))
    );
    // The failed message carries no marker, so the next batch retries it.
    assert_eq!(h.ledger("<m3@x>"), None);

    let retry = h.pipeline.run_batch().await.expect("retry batch");

    assert_eq!(retry.fetched, 1);
    assert_eq!(retry.saved_messages, 1);
    assert_eq!(h.ledger("<m3@x>"), Some((true, "is_newsletter".to_string())));
    assert_eq!(h.events_for("<m3@x>").len(), 1);
}
