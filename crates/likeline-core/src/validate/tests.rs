use serde_json::json;

use super::*;

const POST_URI: &str = "at://did:plc:alice/app.bsky.feed.post/3k2a";

#[test]
fn accepts_like() {
    let like = validate_like(
        "at://did:plc:bob/app.bsky.feed.like/1",
        &json!({
            "$type": "app.bsky.feed.like",
            "subject": { "uri": POST_URI, "cid": "bafyrei1" },
            "createdAt": "2023-04-01T10:00:00.000Z",
        }),
    )
    .expect("valid like");

    assert_eq!(like.subject.uri.to_string(), POST_URI);
    assert_eq!(like.subject.cid.as_deref(), Some("bafyrei1"));
}

#[test]
fn rejects_like_with_wrong_type() {
    let err = validate_like(
        "at://did:plc:bob/app.bsky.feed.like/1",
        &json!({
            "$type": "app.bsky.feed.post",
            "subject": { "uri": POST_URI },
        }),
    )
    .unwrap_err();

    assert_eq!(err.kind, RecordKind::Like);
    assert_eq!(err.uri, "at://did:plc:bob/app.bsky.feed.like/1");
    assert!(matches!(err.source, RecordFieldError::WrongType { .. }));
    assert_eq!(
        err.to_string(),
        "Invalid like record at://did:plc:bob/app.bsky.feed.like/1"
    );
}

#[test]
fn rejects_like_with_malformed_subject() {
    let err = validate_like(
        "at://did:plc:bob/app.bsky.feed.like/1",
        &json!({
            "$type": "app.bsky.feed.like",
            "subject": { "uri": "https://example.com" },
        }),
    )
    .unwrap_err();
    assert_eq!(
        err.source,
        RecordFieldError::MalformedField { field: "subject" }
    );

    let err = validate_like(
        "at://did:plc:bob/app.bsky.feed.like/1",
        &json!({ "$type": "app.bsky.feed.like" }),
    )
    .unwrap_err();
    assert_eq!(err.source, RecordFieldError::MissingField { field: "subject" });
}

#[test]
fn rejects_non_object() {
    let err = validate_profile("at://did:plc:bob", &json!("profile")).unwrap_err();
    assert_eq!(err.source, RecordFieldError::NotAnObject);
}

#[test]
fn accepts_minimal_post() {
    let post = validate_post(
        POST_URI,
        &json!({
            "$type": "app.bsky.feed.post",
            "text": "hello",
            "createdAt": "2023-04-01T10:00:00Z",
        }),
    )
    .expect("valid post");

    assert_eq!(post.text, "hello");
    assert!(post.facets.is_empty());
    assert_eq!(post.reply, None);
    assert_eq!(post.embed, None);
    assert_eq!(post.created_at.to_string(), "2023-04-01T10:00:00Z");
}

#[test]
fn rejects_post_missing_required_fields() {
    let err = validate_post(
        POST_URI,
        &json!({ "$type": "app.bsky.feed.post", "createdAt": "2023-04-01T10:00:00Z" }),
    )
    .unwrap_err();
    assert_eq!(err.source, RecordFieldError::MissingField { field: "text" });

    let err = validate_post(
        POST_URI,
        &json!({ "$type": "app.bsky.feed.post", "text": "hi", "createdAt": "yesterday" }),
    )
    .unwrap_err();
    assert_eq!(
        err.source,
        RecordFieldError::MalformedField { field: "createdAt" }
    );
}

#[test]
fn reads_reply_facets_and_quote() {
    let post = validate_post(
        POST_URI,
        &json!({
            "$type": "app.bsky.feed.post",
            "text": "see https://example.com @carol",
            "createdAt": "2023-04-01T10:00:00Z",
            "facets": [
                {
                    "index": { "byteStart": 4, "byteEnd": 23 },
                    "features": [{ "$type": "app.bsky.richtext.facet#link", "uri": "https://example.com" }],
                },
                {
                    "index": { "byteStart": 24, "byteEnd": 30 },
                    "features": [{ "$type": "app.bsky.richtext.facet#mention", "did": "did:plc:carol" }],
                },
                {
                    "index": { "byteStart": 0, "byteEnd": 3 },
                    "features": [{ "$type": "app.bsky.richtext.facet#tag", "tag": "see" }],
                },
            ],
            "reply": {
                "parent": { "uri": "at://did:plc:carol/app.bsky.feed.post/p", "cid": "c1" },
                "root": { "uri": "at://did:plc:carol/app.bsky.feed.post/r", "cid": "c2" },
            },
            "embed": {
                "$type": "app.bsky.embed.recordWithMedia",
                "record": {
                    "$type": "app.bsky.embed.record",
                    "record": { "uri": "at://did:plc:dave/app.bsky.feed.post/q", "cid": "c3" },
                },
                "media": {
                    "$type": "app.bsky.embed.images",
                    "images": [
                        { "image": { "$type": "blob", "ref": { "$link": "bafkimg" }, "mimeType": "image/jpeg", "size": 10 }, "alt": "a cat" },
                    ],
                },
            },
        }),
    )
    .expect("valid post");

    assert_eq!(
        post.facets.iter().map(|f| &f.kind).collect::<Vec<_>>(),
        vec![
            &FacetKind::Link {
                uri: "https://example.com".into()
            },
            &FacetKind::Mention {
                did: "did:plc:carol".into()
            },
            &FacetKind::Other,
        ]
    );
    assert_eq!(
        post.parent_ref().map(|r| r.uri.to_string()).as_deref(),
        Some("at://did:plc:carol/app.bsky.feed.post/p")
    );
    assert_eq!(
        post.quoted_ref().map(|r| r.uri.to_string()).as_deref(),
        Some("at://did:plc:dave/app.bsky.feed.post/q")
    );
    assert_eq!(post.images().len(), 1);
    assert_eq!(post.images()[0].image.cid, "bafkimg");
    assert_eq!(post.images()[0].alt, "a cat");
}

#[test]
fn tolerates_malformed_optional_fields() {
    let post = validate_post(
        POST_URI,
        &json!({
            "$type": "app.bsky.feed.post",
            "text": "hi",
            "createdAt": "2023-04-01T10:00:00Z",
            "facets": [
                "nonsense",
                { "index": { "byteStart": 5, "byteEnd": 1 } },
                { "index": { "byteStart": 0, "byteEnd": 2 } },
            ],
            "reply": { "parent": { "uri": 7 } },
            "embed": { "$type": "app.bsky.embed.record", "record": {} },
        }),
    )
    .expect("optional fields never fail a post");

    assert_eq!(
        post.facets,
        vec![Facet {
            byte_start: 0,
            byte_end: 2,
            kind: FacetKind::Other
        }]
    );
    assert_eq!(post.reply, None);
    assert_eq!(post.embed, Some(Embed::Unknown));
    assert_eq!(post.quoted_ref(), None);
}

#[test]
fn unknown_embeds_are_kept_as_unknown() {
    let post = validate_post(
        POST_URI,
        &json!({
            "$type": "app.bsky.feed.post",
            "text": "",
            "createdAt": "2023-04-01T10:00:00Z",
            "embed": { "$type": "app.bsky.embed.external", "external": { "uri": "https://example.com" } },
        }),
    )
    .expect("valid post");
    assert_eq!(post.embed, Some(Embed::Unknown));
}

#[test]
fn profile_fields_are_optional() {
    let profile = validate_profile(
        "at://did:plc:alice/app.bsky.actor.profile/self",
        &json!({ "$type": "app.bsky.actor.profile" }),
    )
    .expect("valid profile");
    assert_eq!(profile, ProfileRecord::default());

    let profile = validate_profile(
        "at://did:plc:alice/app.bsky.actor.profile/self",
        &json!({
            "$type": "app.bsky.actor.profile",
            "displayName": "Alice",
            "avatar": { "cid": "bafklegacy", "mimeType": "image/png" },
        }),
    )
    .expect("valid profile");
    assert_eq!(profile.display_name.as_deref(), Some("Alice"));
    assert_eq!(
        profile.avatar,
        Some(BlobRef {
            cid: "bafklegacy".into(),
            mime_type: Some("image/png".into()),
        })
    );
}
