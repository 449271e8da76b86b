//! Integration tests for typed entities.
//!
//! These tests verify the marshalling hooks, inline response bodies,
//! instance operations and sub-resource access.

mod common;

use std::sync::Arc;

use common::{client, ok, status, MockAgent};
use rest_resources::{
    Entity, EntityId, EntityResult, EntityType, HttpMethod, Parameters, RequestOptions, RestClient,
    RestError,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Articles travel as `body_html` on the wire; `slug` only exists locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Article {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    slug: String,
}

impl EntityType for Article {
    const RESOURCE_NAME: &'static str = "articles";

    fn serialize_data(mut data: Map<String, Value>) -> Map<String, Value> {
        data.remove("slug");
        if let Some(body) = data.remove("body") {
            data.insert("body_html".to_string(), body);
        }
        data
    }

    fn deserialize_data(mut data: Map<String, Value>) -> Map<String, Value> {
        if let Some(body) = data.remove("body_html") {
            data.insert("body".to_string(), body);
        }
        let slug = data
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase()
            .replace(' ', "-");
        data.insert("slug".to_string(), Value::from(slug));
        data
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Blog {
    id: i64,
    title: String,
}

impl EntityType for Blog {
    const RESOURCE_NAME: &'static str = "blogs";
    const INLINE_RESPONSE_BODY: bool = true;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Comment {
    id: i64,
    text: String,
}

impl EntityType for Comment {
    const RESOURCE_NAME: &'static str = "comments";
    const INLINE_RESPONSE_BODY: bool = true;
}

/// Tickets use unsigned ids that may exceed `i64::MAX`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Ticket {
    id: u64,
    subject: String,
}

impl EntityType for Ticket {
    const RESOURCE_NAME: &'static str = "tickets";
}

fn shared(agent: &Arc<MockAgent>) -> Arc<RestClient> {
    Arc::new(client(agent))
}

fn article(client: &Arc<RestClient>) -> Entity<Article> {
    Entity::from_wire(
        client.clone(),
        json!({"id": 1, "title": "Old News", "body_html": "<p>b</p>"}),
        None,
    )
    .unwrap()
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

// ============================================================================
// Marshalling Tests
// ============================================================================

#[test]
fn test_from_wire_applies_deserialize_hook() {
    let agent = Arc::new(MockAgent::new());
    let article = article(&shared(&agent));

    assert_eq!(article.title, "Old News");
    assert_eq!(article.body, "<p>b</p>");
    assert_eq!(article.slug, "old-news");
    assert_eq!(article.id(), Some(EntityId::from(1)));
}

#[tokio::test]
async fn test_static_create_sends_serialized_state() {
    let agent = Arc::new(MockAgent::new());
    let client = shared(&agent);
    let state = Article {
        id: None,
        title: "Fresh".to_string(),
        body: "text".to_string(),
        slug: "ignored".to_string(),
    };

    let result = Article::create(&client, &state, RequestOptions::new())
        .await
        .unwrap();

    assert!(result.into_response().is_some());
    let calls = agent.calls();
    assert_eq!(calls[0].method, HttpMethod::Post);
    assert_eq!(calls[0].url, "https://x/articles");
    assert_eq!(
        calls[0].data,
        Some(json!({"title": "Fresh", "body_html": "text"}))
    );
}

// ============================================================================
// Patch Tests
// ============================================================================

#[tokio::test]
async fn test_patch_sends_only_changes_and_merges_them_locally() {
    let agent = Arc::new(MockAgent::new());
    let client = shared(&agent);
    let mut article = article(&client);

    let mut changes = Map::new();
    changes.insert("title".to_string(), json!("New Title"));
    article.patch(changes, RequestOptions::new()).await.unwrap();

    let calls = agent.calls();
    assert_eq!(calls[0].method, HttpMethod::Patch);
    assert_eq!(calls[0].url, "https://x/articles/1");
    assert_eq!(calls[0].data, Some(json!({"title": "New Title"})));

    assert_eq!(article.title, "New Title");
    assert_eq!(article.body, "<p>b</p>");
    assert_eq!(article.slug, "new-title");
    assert_eq!(article.id, Some(1));
}

#[tokio::test]
async fn test_patch_field_names_go_through_serialize_hook() {
    let agent = Arc::new(MockAgent::new());
    let client = shared(&agent);
    let mut article = article(&client);

    article
        .patch(object(json!({"body": "<p>new</p>"})), RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(agent.calls()[0].data, Some(json!({"body_html": "<p>new</p>"})));
    assert_eq!(article.body, "<p>new</p>");
    assert_eq!(article.title, "Old News");
}

#[tokio::test]
async fn test_failed_patch_leaves_state_untouched() {
    let agent = Arc::new(MockAgent::scripted(vec![Ok(status(422))]));
    let client = shared(&agent);
    let mut article = article(&client);
    let before = article.state().clone();

    let error = article
        .patch(object(json!({"title": "Rejected"})), RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(error.transport_error().and_then(|e| e.status()), Some(422));
    assert_eq!(article.state(), &before);
}

#[tokio::test]
async fn test_operations_without_id_fail_before_dispatch() {
    let agent = Arc::new(MockAgent::new());
    let client = shared(&agent);
    let mut article = Entity::new(
        client.clone(),
        Article {
            id: None,
            title: "Draft".to_string(),
            body: String::new(),
            slug: String::new(),
        },
    );

    let patch = article.patch(Map::new(), RequestOptions::new()).await;
    assert!(matches!(patch, Err(RestError::MissingEntityId { .. })));

    let replace = article.replace(RequestOptions::new()).await;
    assert!(matches!(replace, Err(RestError::MissingEntityId { .. })));

    let delete = article.delete(RequestOptions::new()).await;
    match delete {
        Err(error @ RestError::MissingEntityId { .. }) => {
            assert_eq!(
                error.to_string(),
                "Entity of resource 'articles' has no value in its 'id' field"
            );
        }
        other => panic!("expected MissingEntityId, got {other:?}"),
    }

    assert_eq!(agent.call_count(), 0);
}

// ============================================================================
// Replace, Create and Delete Tests
// ============================================================================

#[tokio::test]
async fn test_replace_sends_full_state_and_refreshes_derived_fields() {
    let agent = Arc::new(MockAgent::new());
    let client = shared(&agent);
    let mut article = article(&client);

    article.title = "Renamed Story".to_string();
    article.replace(RequestOptions::new()).await.unwrap();

    let calls = agent.calls();
    assert_eq!(calls[0].method, HttpMethod::Put);
    assert_eq!(calls[0].url, "https://x/articles/1");
    assert_eq!(
        calls[0].data,
        Some(json!({"id": 1, "title": "Renamed Story", "body_html": "<p>b</p>"}))
    );
    assert_eq!(article.slug, "renamed-story");
}

#[tokio::test]
async fn test_instance_create_posts_to_the_collection() {
    let agent = Arc::new(MockAgent::new());
    let client = shared(&agent);
    let mut article = Entity::new(
        client.clone(),
        Article {
            id: None,
            title: "Brand New".to_string(),
            body: "x".to_string(),
            slug: String::new(),
        },
    );

    article.create(RequestOptions::new()).await.unwrap();

    let calls = agent.calls();
    assert_eq!(calls[0].method, HttpMethod::Post);
    assert_eq!(calls[0].url, "https://x/articles");
    assert_eq!(article.slug, "brand-new");
}

#[tokio::test]
async fn test_instance_delete_targets_the_entity() {
    let agent = Arc::new(MockAgent::new());
    let client = shared(&agent);

    let result = article(&client).delete(RequestOptions::new()).await.unwrap();

    assert!(matches!(result, EntityResult::Envelope(_)));
    let calls = agent.calls();
    assert_eq!(calls[0].method, HttpMethod::Delete);
    assert_eq!(calls[0].url, "https://x/articles/1");
    assert!(calls[0].data.is_none());
}

#[tokio::test]
async fn test_unsigned_ids_beyond_i64_still_address_the_entity() {
    let agent = Arc::new(MockAgent::new());
    let client = shared(&agent);
    let ticket: Entity<Ticket> = Entity::from_wire(
        client.clone(),
        json!({"id": u64::MAX, "subject": "Disk full"}),
        None,
    )
    .unwrap();

    assert_eq!(ticket.id(), Some(EntityId::Text(u64::MAX.to_string())));
    assert!(ticket.delete(RequestOptions::new()).await.is_ok());
    assert_eq!(agent.calls()[0].url, "https://x/tickets/18446744073709551615");
}

// ============================================================================
// Inline Response Body Tests
// ============================================================================

#[tokio::test]
async fn test_inline_get_returns_a_bound_entity() {
    let agent = Arc::new(MockAgent::scripted(vec![Ok(ok(
        json!({"id": 3, "title": "Engineering"}),
    ))]));
    let client = shared(&agent);

    let blog = Blog::get(&client, 3, Parameters::new(), RequestOptions::new())
        .await
        .unwrap()
        .into_single()
        .unwrap();

    assert_eq!(blog.title, "Engineering");
    assert!(Arc::ptr_eq(blog.client(), &client));
    assert!(blog.parent_entity().is_none());
}

#[tokio::test]
async fn test_inline_list_returns_entities() {
    let agent = Arc::new(MockAgent::scripted(vec![Ok(ok(json!([
        {"id": 1, "title": "One"},
        {"id": 2, "title": "Two"}
    ])))]));
    let client = shared(&agent);

    let blogs = Blog::list(&client, Parameters::new(), RequestOptions::new())
        .await
        .unwrap()
        .into_many();

    let titles: Vec<&str> = blogs.iter().map(|blog| blog.title.as_str()).collect();
    assert_eq!(titles, vec!["One", "Two"]);
}

#[tokio::test]
async fn test_inline_delete_with_empty_body_is_empty() {
    let agent = Arc::new(MockAgent::scripted(vec![Ok(ok(Value::Null))]));
    let client = shared(&agent);

    let result = Blog::delete(&client, 3, RequestOptions::new()).await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_non_inline_operations_return_the_envelope() {
    let agent = Arc::new(MockAgent::scripted(vec![Ok(ok(json!({"id": 1, "title": "t"})))]));
    let client = shared(&agent);

    let response = Article::get(&client, 1, Parameters::new(), RequestOptions::new())
        .await
        .unwrap()
        .into_response()
        .unwrap();

    assert_eq!(response.body(), &json!({"id": 1, "title": "t"}));
}

// ============================================================================
// Sub-Resource Tests
// ============================================================================

#[tokio::test]
async fn test_sub_resource_list_uses_the_entity_as_parent() {
    let agent = Arc::new(MockAgent::scripted(vec![Ok(ok(
        json!([{"id": 10, "text": "First!"}]),
    ))]));
    let client = shared(&agent);
    let blog = Entity::new(
        client.clone(),
        Blog {
            id: 3,
            title: "Engineering".to_string(),
        },
    );

    let comments = blog
        .list::<Comment>(Parameters::new(), RequestOptions::new())
        .await
        .unwrap()
        .into_many();

    assert_eq!(agent.calls()[0].url, "https://x/blogs/3/comments");
    assert_eq!(comments.len(), 1);
    let parent = comments[0].parent_entity().unwrap();
    assert_eq!(parent.resource().name(), "blogs");
    assert_eq!(parent.id(), Some(&EntityId::from(3)));
    assert_eq!(parent.data()["title"], "Engineering");
}

#[tokio::test]
async fn test_sub_resource_entities_keep_their_parent_for_updates() {
    let agent = Arc::new(MockAgent::scripted(vec![Ok(ok(
        json!({"id": 10, "text": "First!"}),
    ))]));
    let client = shared(&agent);
    let blog = Entity::new(
        client.clone(),
        Blog {
            id: 3,
            title: "Engineering".to_string(),
        },
    );

    let mut comment = blog
        .get::<Comment>(10, Parameters::new(), RequestOptions::new())
        .await
        .unwrap()
        .into_single()
        .unwrap();
    comment
        .patch(object(json!({"text": "Edited"})), RequestOptions::new())
        .await
        .unwrap();

    let calls = agent.calls();
    assert_eq!(calls[0].url, "https://x/blogs/3/comments/10");
    assert_eq!(calls[1].method, HttpMethod::Patch);
    assert_eq!(calls[1].url, "https://x/blogs/3/comments/10");
    assert_eq!(comment.text, "Edited");
}
