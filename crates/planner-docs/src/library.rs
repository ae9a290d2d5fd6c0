use planner_core::{LibraryRequest, ReferenceDoc};
use serde_json::{json, Value};

use crate::{DocsClient, DocsError};

pub const RESOLVE_TOOL: &str = "resolve-library-id";
pub const DOCS_TOOL: &str = "get-library-docs";

/// Ask Context7 to map a library name to its Context7-compatible id.
pub async fn resolve_library_id(client: &dyn DocsClient, name: &str) -> Result<String, DocsError> {
    let result = client
        .call(
            "tools/call",
            json!({
                "name": RESOLVE_TOOL,
                "arguments": { "libraryName": name },
            }),
        )
        .await?;

    first_text(&result)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .ok_or_else(|| DocsError::MissingLibraryId {
            library: name.to_string(),
        })
}

/// Resolve a library and fetch its documentation, optionally narrowed to a topic
/// and capped at a token budget.
pub async fn fetch_library_docs(
    client: &dyn DocsClient,
    request: &LibraryRequest,
) -> Result<ReferenceDoc, DocsError> {
    let library_id = resolve_library_id(client, &request.name).await?;

    let topic = request.topic.as_deref().filter(|t| !t.is_empty());
    let mut arguments = json!({ "context7CompatibleLibraryID": library_id });
    if let Some(topic) = topic {
        arguments["topic"] = json!(topic);
    }
    if let Some(tokens) = request.tokens.filter(|t| *t > 0) {
        arguments["tokens"] = json!(tokens);
    }

    let result = client
        .call(
            "tools/call",
            json!({ "name": DOCS_TOOL, "arguments": arguments }),
        )
        .await?;

    Ok(ReferenceDoc {
        library: request.name.clone(),
        topic: topic.map(String::from),
        text: first_text(&result).unwrap_or_default().to_string(),
    })
}

/// Text of the first content item of an MCP tool result.
fn first_text(result: &Value) -> Option<&str> {
    result.pointer("/content/0/text").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockDocsClient;

    fn text_result(text: &str) -> Value {
        json!({ "content": [{ "type": "text", "text": text }] })
    }

    #[tokio::test]
    async fn resolves_then_fetches_with_optional_arguments() {
        let mut client = MockDocsClient::new();
        client
            .expect_call()
            .withf(|method, params| {
                method == "tools/call"
                    && params["name"] == RESOLVE_TOOL
                    && params["arguments"]["libraryName"] == "axum"
            })
            .times(1)
            .returning(|_, _| Ok(text_result("  /tokio-rs/axum \n")));
        client
            .expect_call()
            .withf(|method, params| {
                method == "tools/call"
                    && params["name"] == DOCS_TOOL
                    && params["arguments"]["context7CompatibleLibraryID"] == "/tokio-rs/axum"
                    && params["arguments"]["topic"] == "routing"
                    && params["arguments"]["tokens"] == 2000
            })
            .times(1)
            .returning(|_, _| Ok(text_result("Router::new().route(..)")));

        let doc = fetch_library_docs(
            &client,
            &LibraryRequest {
                name: "axum".into(),
                topic: Some("routing".into()),
                tokens: Some(2000),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            doc,
            ReferenceDoc {
                library: "axum".into(),
                topic: Some("routing".into()),
                text: "Router::new().route(..)".into(),
            }
        );
    }

    #[tokio::test]
    async fn omits_topic_and_tokens_when_not_given() {
        let mut client = MockDocsClient::new();
        client
            .expect_call()
            .withf(|_, params| params["name"] == RESOLVE_TOOL)
            .returning(|_, _| Ok(text_result("/serde-rs/serde")));
        client
            .expect_call()
            .withf(|_, params| {
                params["name"] == DOCS_TOOL
                    && params["arguments"].get("topic").is_none()
                    && params["arguments"].get("tokens").is_none()
            })
            .returning(|_, _| Ok(json!({ "content": [] })));

        let doc = fetch_library_docs(
            &client,
            &LibraryRequest {
                name: "serde".into(),
                topic: None,
                tokens: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(doc.text, "");
        assert_eq!(doc.topic, None);
    }

    #[tokio::test]
    async fn empty_resolution_is_an_error() {
        let mut client = MockDocsClient::new();
        client
            .expect_call()
            .returning(|_, _| Ok(text_result("   ")));

        let err = resolve_library_id(&client, "mystery").await.unwrap_err();
        assert_eq!(
            err,
            DocsError::MissingLibraryId {
                library: "mystery".into()
            }
        );
    }

    #[tokio::test]
    async fn resolution_failure_skips_docs_call() {
        let mut client = MockDocsClient::new();
        client
            .expect_call()
            .times(1)
            .returning(|_, _| {
                Err(DocsError::Http {
                    status: 500,
                    body: "down".into(),
                })
            });

        let err = fetch_library_docs(
            &client,
            &LibraryRequest {
                name: "axum".into(),
                topic: None,
                tokens: None,
            },
        )
        .await
        .unwrap_err();
        assert!(err.is_transport());
    }
}
