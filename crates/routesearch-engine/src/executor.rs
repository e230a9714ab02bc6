//! Search task executor.
//!
//! Renders the connection string and query templates of a [`RouteTask`]
//! against a [`RouteMatch`], runs them through a [`SearchClient`] and
//! attaches pagination to every result. Every failure leaves as a
//! [`TaskError`].

use std::sync::Arc;

use async_trait::async_trait;
use routesearch_core::{PaginationDetails, QuerySet, QueryTemplate, RouteMatch, RouteTask, TaskConfig};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::client::{ClientFactory, ConnectOptions, SearchClient};
use crate::error::{Cause, Failure, FailureStage, TaskError, TransportError};
use crate::http::HttpClientFactory;
use crate::renderer::TemplateRenderer;
use crate::types::{
    total_hits, MultiSearchRequest, SearchRequest, SearchResult, SearchResultMap, TaskOutput,
};

/// Name the search task is registered under.
pub const TASK_NAME: &str = "elasticsearch";

/// A unit of work a host router dispatches matched routes to.
#[async_trait]
pub trait RouterTask: Send + Sync {
    /// What a successful execution produces.
    type Output: Send;

    /// Name the task is registered under.
    fn name(&self) -> &str;

    /// Run the task for a matched route.
    async fn execute(&self, route: &RouteMatch, task: &RouteTask)
        -> Result<Self::Output, TaskError>;
}

/// Executes search tasks.
///
/// Holds no per-execution state, so one executor can serve concurrent
/// route matches.
#[derive(Clone)]
pub struct SearchTask {
    renderer: Arc<TemplateRenderer>,
    factory: Arc<dyn ClientFactory>,
}

impl SearchTask {
    /// Create an executor with an explicit client factory.
    pub fn new(renderer: Arc<TemplateRenderer>, factory: Arc<dyn ClientFactory>) -> Self {
        Self { renderer, factory }
    }

    /// Create an executor that talks HTTP to the rendered host.
    pub fn http(renderer: Arc<TemplateRenderer>) -> Self {
        Self::new(renderer, Arc::new(HttpClientFactory))
    }

    /// The renderer used for all templates.
    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    /// Run a task: one result for a single template, a name-keyed map for a
    /// batch.
    pub async fn execute(
        &self,
        route: &RouteMatch,
        task: &RouteTask,
    ) -> Result<TaskOutput, TaskError> {
        self.run(route, task)
            .await
            .map_err(|failure| failure.into_task_error(route, task))
    }

    /// Run one query on an existing client.
    pub async fn single_query(
        &self,
        client: &dyn SearchClient,
        template: &QueryTemplate,
        route: &RouteMatch,
        task: &RouteTask,
    ) -> Result<SearchResult, TaskError> {
        self.run_single(client, template, route)
            .await
            .map_err(|failure| failure.into_task_error(route, task))
    }

    /// Run a batch of queries on an existing client.
    pub async fn multi_query(
        &self,
        client: &dyn SearchClient,
        templates: &[QueryTemplate],
        route: &RouteMatch,
        task: &RouteTask,
    ) -> Result<SearchResultMap, TaskError> {
        self.run_batch(client, templates, route)
            .await
            .map_err(|failure| failure.into_task_error(route, task))
    }

    async fn run(&self, route: &RouteMatch, task: &RouteTask) -> Result<TaskOutput, Failure> {
        let queries = &task.config.query_templates;
        info!(
            task = task.name.as_deref().unwrap_or(TASK_NAME),
            batch = queries.is_batch(),
            queries = queries.templates().len(),
            "Executing search task"
        );

        let client = self.connect(route, &task.config)?;

        match queries {
            QuerySet::Single(template) => self
                .run_single(client.as_ref(), template, route)
                .await
                .map(TaskOutput::Single),
            QuerySet::Batch(templates) => self
                .run_batch(client.as_ref(), templates, route)
                .await
                .map(TaskOutput::Batch),
        }
    }

    /// Render the connection string and obtain a client for it.
    fn connect(
        &self,
        route: &RouteMatch,
        config: &TaskConfig,
    ) -> Result<Box<dyn SearchClient>, Failure> {
        let source = &config.connection_string_template;
        let host = self.renderer.render(source, route).map_err(|e| {
            Failure::new(
                FailureStage::ConnectionString,
                e,
                json!({ "connectionStringTemplate": source }),
            )
        })?;
        debug!(host = %host, "Rendered connection string");

        let options = ConnectOptions::new(host, config.engine_options.clone());
        self.factory.connect(&options).map_err(|e| {
            Failure::new(
                FailureStage::Connect,
                e,
                json!({ "connectionString": options.host }),
            )
        })
    }

    /// Compile, render and parse a query template into a request.
    fn build_request(
        &self,
        template: &QueryTemplate,
        route: &RouteMatch,
    ) -> Result<SearchRequest, Failure> {
        let compiled = self.renderer.compile(&template.template).map_err(|e| {
            Failure::new(FailureStage::Compile, e, json!({ "queryTemplate": template }))
        })?;

        let query_json = compiled.render(route).map_err(|e| {
            Failure::new(FailureStage::Render, e, json!({ "queryTemplate": template }))
        })?;

        let body: Value = serde_json::from_str(&query_json).map_err(|e| {
            Failure::new(
                FailureStage::Parse,
                e,
                json!({ "queryTemplate": template, "queryJson": query_json }),
            )
        })?;

        Ok(SearchRequest {
            index: template.index.clone(),
            doc_type: template.doc_type.clone(),
            body,
        })
    }

    async fn run_single(
        &self,
        client: &dyn SearchClient,
        template: &QueryTemplate,
        route: &RouteMatch,
    ) -> Result<SearchResult, Failure> {
        let request = self.build_request(template, route)?;
        let applied = PaginationDetails::from_query(&request.body);

        info!(
            index = %request.index,
            doc_type = ?request.doc_type,
            from = applied.from,
            size = applied.size,
            "Executing search"
        );

        let response = client.search(&request).await.map_err(|e| {
            Failure::new(FailureStage::Search, e, json!({ "payload": request }))
        })?;

        if let Some(redirect_to) = &template.no_results_route {
            if total_hits(&response) == Some(0) {
                return Err(Failure::new(
                    FailureStage::NoResults,
                    Cause::NoResults {
                        redirect_to: redirect_to.clone(),
                    },
                    json!({ "payload": request }),
                ));
            }
        }

        Ok(SearchResult::new(response, applied, request))
    }

    /// Every template is rendered before the single network call, so a bad
    /// template never results in a partial submission. Response `i` belongs
    /// to template `i`.
    async fn run_batch(
        &self,
        client: &dyn SearchClient,
        templates: &[QueryTemplate],
        route: &RouteMatch,
    ) -> Result<SearchResultMap, Failure> {
        let mut batch = MultiSearchRequest::new();
        for template in templates {
            batch.push(self.build_request(template, route)?);
        }

        info!(searches = batch.len(), "Executing multi-search");

        let payload = || json!({ "payload": { "body": batch.bulk_body() } });

        let reply = client
            .multi_search(&batch)
            .await
            .map_err(|e| Failure::new(FailureStage::Search, e, payload()))?;

        let Some(responses) = reply.responses else {
            warn!("Multi-search reply carried no responses");
            return Ok(SearchResultMap::new());
        };

        if responses.len() != templates.len() {
            return Err(Failure::new(
                FailureStage::Search,
                TransportError::InvalidResponse(format!(
                    "expected {} responses, got {}",
                    templates.len(),
                    responses.len()
                )),
                payload(),
            ));
        }

        let mut results = SearchResultMap::with_capacity(templates.len());
        for ((template, request), response) in
            templates.iter().zip(batch.requests()).zip(responses)
        {
            if let Some(error) = response.get("error") {
                return Err(Failure::new(
                    FailureStage::BatchEntry,
                    Cause::Rejected(describe_engine_error(error)),
                    json!({ "queryTemplate": template, "response": response }),
                ));
            }

            // First empty entry with a redirect aborts the batch.
            if let Some(redirect_to) = &template.no_results_route {
                if total_hits(&response) == Some(0) {
                    return Err(Failure::new(
                        FailureStage::NoResults,
                        Cause::NoResults {
                            redirect_to: redirect_to.clone(),
                        },
                        json!({ "queryTemplate": template, "response": response }),
                    ));
                }
            }

            let applied = PaginationDetails::from_query(&request.body);
            results.insert(
                template.name.clone(),
                SearchResult::new(response, applied, request.clone()),
            );
        }

        Ok(results)
    }
}

#[async_trait]
impl RouterTask for SearchTask {
    type Output = TaskOutput;

    fn name(&self) -> &str {
        TASK_NAME
    }

    async fn execute(&self, route: &RouteMatch, task: &RouteTask) -> Result<TaskOutput, TaskError> {
        SearchTask::execute(self, route, task).await
    }
}

/// Human-readable summary of a per-entry engine error.
fn describe_engine_error(error: &Value) -> String {
    error
        .get("reason")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use routesearch_core::EngineOptions;

    use crate::renderer::{HelperRegistry, RendererOptions};
    use crate::types::MultiSearchResponse;

    /// Scripted engine that records every call.
    #[derive(Default)]
    struct MockEngine {
        search_replies: Mutex<VecDeque<Result<Value, TransportError>>>,
        batch_replies: Mutex<VecDeque<Result<MultiSearchResponse, TransportError>>>,
        searches: Mutex<Vec<SearchRequest>>,
        batches: Mutex<Vec<MultiSearchRequest>>,
        connections: Mutex<Vec<ConnectOptions>>,
        refuse: bool,
    }

    impl MockEngine {
        fn with_search(reply: Result<Value, TransportError>) -> Arc<Self> {
            let engine = Self::default();
            engine.search_replies.lock().unwrap().push_back(reply);
            Arc::new(engine)
        }

        fn with_batch(reply: Result<MultiSearchResponse, TransportError>) -> Arc<Self> {
            let engine = Self::default();
            engine.batch_replies.lock().unwrap().push_back(reply);
            Arc::new(engine)
        }

        fn refusing() -> Arc<Self> {
            Arc::new(Self {
                refuse: true,
                ..Self::default()
            })
        }

        fn network_calls(&self) -> usize {
            self.searches.lock().unwrap().len() + self.batches.lock().unwrap().len()
        }
    }

    struct MockClient(Arc<MockEngine>);

    #[async_trait]
    impl SearchClient for MockClient {
        async fn search(&self, request: &SearchRequest) -> Result<Value, TransportError> {
            self.0.searches.lock().unwrap().push(request.clone());
            self.0
                .search_replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected search call")
        }

        async fn multi_search(
            &self,
            request: &MultiSearchRequest,
        ) -> Result<MultiSearchResponse, TransportError> {
            self.0.batches.lock().unwrap().push(request.clone());
            self.0
                .batch_replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected multi-search call")
        }
    }

    struct MockFactory(Arc<MockEngine>);

    impl ClientFactory for MockFactory {
        fn connect(
            &self,
            options: &ConnectOptions,
        ) -> Result<Box<dyn SearchClient>, TransportError> {
            self.0.connections.lock().unwrap().push(options.clone());
            if self.0.refuse {
                return Err(TransportError::Connection("refused".to_string()));
            }
            Ok(Box::new(MockClient(self.0.clone())))
        }
    }

    fn executor(engine: &Arc<MockEngine>) -> SearchTask {
        SearchTask::new(
            Arc::new(TemplateRenderer::default()),
            Arc::new(MockFactory(engine.clone())),
        )
    }

    fn route() -> RouteMatch {
        RouteMatch::new(json!({
            "host": "search.local",
            "params": {"q": "food bank", "page": 3}
        }))
    }

    const QUERY: &str = r#"{"query": {"match": {"title": {{json params.q}} }}, "from": {{pageOffset params.page 10}}, "size": 10}"#;

    fn template(name: &str, source: &str) -> QueryTemplate {
        QueryTemplate::new(name, "services", source).with_doc_type("service")
    }

    fn task(queries: QuerySet) -> RouteTask {
        let mut engine_options = EngineOptions::default();
        engine_options.request_timeout_secs = Some(3);
        RouteTask::new(TaskConfig {
            connection_string_template: "http://{{host}}:9200".to_string(),
            engine_options,
            query_templates: queries,
        })
        .with_error_route("error")
    }

    fn hits(total: u64) -> Value {
        json!({"took": 2, "hits": {"total": total, "hits": []}})
    }

    #[tokio::test]
    async fn test_single_query() {
        let engine = MockEngine::with_search(Ok(hits(95)));
        let task = task(QuerySet::Single(template("results", QUERY)));

        let result = executor(&engine)
            .execute(&route(), &task)
            .await
            .unwrap()
            .into_single()
            .unwrap();

        let connections = engine.connections.lock().unwrap();
        assert_eq!(connections[0].host, "http://search.local:9200");
        assert_eq!(connections[0].engine.request_timeout_secs, Some(3));

        let sent = engine.searches.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].index, "services");
        assert_eq!(sent[0].doc_type.as_deref(), Some("service"));
        assert_eq!(sent[0].body["query"]["match"]["title"], "food bank");
        assert_eq!(sent[0].body["from"], 20);

        assert_eq!(result.request, sent[0]);
        assert_eq!(result.applied(), PaginationDetails { from: 20, size: 10 });
        assert_eq!(result.pagination.total_pages, 10);
        assert_eq!(result.pagination.current_page, 3);
        assert_eq!(result.pagination.prev_page, Some(2));
        assert_eq!(result.pagination.next_page, Some(4));
        assert_eq!(result.response["took"], 2);
    }

    #[tokio::test]
    async fn test_request_reproduces_rendered_json() {
        let engine = MockEngine::with_search(Ok(hits(1)));
        let source = r#"{"query": {"term": {"id": "{{params.q}}"}}, "sort": ["_score"]}"#;
        let task = task(QuerySet::Single(template("results", source)));

        let result = executor(&engine)
            .execute(&route(), &task)
            .await
            .unwrap()
            .into_single()
            .unwrap();

        let rendered: Value = serde_json::from_str(
            &TemplateRenderer::default().render(source, &route()).unwrap(),
        )
        .unwrap();
        assert_eq!(result.request.body, rendered);
        assert_eq!(result.request.index, "services");
        assert_eq!(result.request.doc_type.as_deref(), Some("service"));
    }

    #[tokio::test]
    async fn test_single_query_default_pagination() {
        let engine = MockEngine::with_search(Ok(hits(3)));
        let task = task(QuerySet::Single(template("results", r#"{"query": {}}"#)));

        let result = executor(&engine)
            .execute(&route(), &task)
            .await
            .unwrap()
            .into_single()
            .unwrap();

        assert_eq!(result.applied(), PaginationDetails::default());
        assert_eq!(result.pagination.total_pages, 1);
    }

    #[tokio::test]
    async fn test_single_query_huge_offset_from_route() {
        let engine = MockEngine::with_search(Ok(hits(3)));
        let task = task(QuerySet::Single(template(
            "results",
            r#"{"from": {{params.from}}, "size": 1}"#,
        )));
        let route = RouteMatch::new(json!({
            "host": "search.local",
            "params": {"from": "9223372036854775807"}
        }));

        let result = executor(&engine)
            .execute(&route, &task)
            .await
            .unwrap()
            .into_single()
            .unwrap();

        assert_eq!(result.applied().from, i64::MAX as u64);
        assert_eq!(result.pagination.current_page, i64::MAX as u64 + 1);
        assert_eq!(result.pagination.total_pages, 3);
        assert_eq!(result.pagination.next_page, None);
        assert_eq!(result.pagination.page_range.len(), 3);
    }

    #[tokio::test]
    async fn test_single_query_no_results_redirect() {
        let engine = MockEngine::with_search(Ok(hits(0)));
        let task = task(QuerySet::Single(
            template("results", QUERY).with_no_results_route("no-results"),
        ));

        let err = executor(&engine).execute(&route(), &task).await.unwrap_err();

        assert_eq!(err.status_code, 404);
        assert_eq!(err.redirect_to.as_deref(), Some("no-results"));
        assert_eq!(err.stage, FailureStage::NoResults);
        assert!(err.is_no_results());
        assert_eq!(err.data["payload"]["index"], "services");
        assert_eq!(err.source_route, route());
    }

    #[tokio::test]
    async fn test_zero_hits_without_route_is_a_result() {
        let engine = MockEngine::with_search(Ok(hits(0)));
        let task = task(QuerySet::Single(template("results", QUERY)));

        let result = executor(&engine)
            .execute(&route(), &task)
            .await
            .unwrap()
            .into_single()
            .unwrap();

        assert_eq!(result.total_hits(), Some(0));
        assert!(result.pagination.page_range.is_empty());
    }

    #[tokio::test]
    async fn test_compile_failure() {
        let engine = MockEngine::with_search(Ok(hits(1)));
        let task = task(QuerySet::Single(template("results", "{{#if x}}{{/each}}")));

        let err = executor(&engine).execute(&route(), &task).await.unwrap_err();

        assert_eq!(err.stage, FailureStage::Compile);
        assert_eq!(err.status_code, 500);
        assert_eq!(err.redirect_to.as_deref(), Some("error"));
        assert_eq!(err.data["queryTemplate"]["name"], "results");
        assert!(err.data.get("queryJson").is_none());
        assert_eq!(engine.network_calls(), 0);
    }

    #[tokio::test]
    async fn test_render_failure() {
        let engine = MockEngine::with_search(Ok(hits(1)));
        let strict = TemplateRenderer::with_options(
            HelperRegistry::new(),
            RendererOptions { strict: true },
        );
        let executor = SearchTask::new(Arc::new(strict), Arc::new(MockFactory(engine.clone())));
        let task = task(QuerySet::Single(template("results", r#"{"q": "{{params.missing}}"}"#)));

        let err = executor.execute(&route(), &task).await.unwrap_err();

        assert_eq!(err.stage, FailureStage::Render);
        assert_eq!(err.status_code, 500);
        assert!(matches!(err.cause, Cause::Template(_)));
        assert_eq!(engine.network_calls(), 0);
    }

    #[tokio::test]
    async fn test_parse_failure_carries_rendered_text() {
        let engine = MockEngine::with_search(Ok(hits(1)));
        let task = task(QuerySet::Single(template("results", r#"{"q": {{params.q}} }"#)));

        let err = executor(&engine).execute(&route(), &task).await.unwrap_err();

        assert_eq!(err.stage, FailureStage::Parse);
        assert!(matches!(err.cause, Cause::Parse(_)));
        assert_eq!(err.data["queryJson"], r#"{"q": food bank }"#);
        assert_eq!(err.data["queryTemplate"]["index"], "services");
        assert_eq!(engine.network_calls(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let engine = MockEngine::with_search(Err(TransportError::Status {
            status: 503,
            body: "unavailable".to_string(),
        }));
        let task = task(QuerySet::Single(template("results", QUERY)));

        let err = executor(&engine).execute(&route(), &task).await.unwrap_err();

        assert_eq!(err.stage, FailureStage::Search);
        assert_eq!(err.status_code, 500);
        assert_eq!(err.redirect_to.as_deref(), Some("error"));
        assert_eq!(err.data["payload"]["body"]["from"], 20);
        assert!(matches!(err.cause, Cause::Transport(TransportError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_connection_string_failure() {
        let engine = Arc::new(MockEngine::default());
        let mut task = task(QuerySet::Single(template("results", QUERY)));
        task.config.connection_string_template = "http://{{#if host}}x{{/each}}".to_string();

        let err = executor(&engine).execute(&route(), &task).await.unwrap_err();

        assert_eq!(err.stage, FailureStage::ConnectionString);
        assert_eq!(err.data["connectionStringTemplate"], "http://{{#if host}}x{{/each}}");
        assert!(engine.connections.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let engine = MockEngine::refusing();
        let task = task(QuerySet::Single(template("results", QUERY)));

        let err = executor(&engine).execute(&route(), &task).await.unwrap_err();

        assert_eq!(err.stage, FailureStage::Connect);
        assert_eq!(err.status_code, 500);
        assert_eq!(err.data["connectionString"], "http://search.local:9200");
    }

    #[tokio::test]
    async fn test_batch_render_failure_sends_nothing() {
        let engine = MockEngine::with_batch(Ok(MultiSearchResponse::default()));
        let task = task(QuerySet::Batch(vec![
            template("a", "{{#if x}}{{/each}}"),
            template("b", QUERY),
        ]));

        let err = executor(&engine).execute(&route(), &task).await.unwrap_err();

        assert_eq!(err.stage, FailureStage::Compile);
        assert_eq!(err.data["queryTemplate"]["name"], "a");
        assert_eq!(engine.network_calls(), 0);
    }

    #[tokio::test]
    async fn test_batch_maps_responses_by_position() {
        let engine = MockEngine::with_batch(Ok(MultiSearchResponse {
            responses: Some(vec![hits(12), hits(95)]),
        }));
        let task = task(QuerySet::Batch(vec![
            template("a", r#"{"query": {}, "size": 5}"#),
            template("b", QUERY),
        ]));

        let results = executor(&engine)
            .execute(&route(), &task)
            .await
            .unwrap()
            .into_batch()
            .unwrap();

        let mut keys: Vec<_> = results.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);

        let a = &results["a"];
        assert_eq!(a.applied(), PaginationDetails { from: 0, size: 5 });
        assert_eq!(a.pagination.total_results, 12);
        assert_eq!(a.pagination.total_pages, 3);
        assert_eq!(a.request.body["size"], 5);

        let b = &results["b"];
        assert_eq!(b.applied(), PaginationDetails { from: 20, size: 10 });
        assert_eq!(b.pagination.total_pages, 10);
        assert_eq!(b.pagination.current_page, 3);

        let batches = engine.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].bulk_body().len(), 4);
        assert_eq!(batches[0].requests()[1], b.request);
    }

    #[tokio::test]
    async fn test_batch_no_results_aborts_with_first_match() {
        let engine = MockEngine::with_batch(Ok(MultiSearchResponse {
            responses: Some(vec![hits(4), hits(0), hits(0)]),
        }));
        let task = task(QuerySet::Batch(vec![
            template("a", QUERY).with_no_results_route("a-empty"),
            template("b", QUERY).with_no_results_route("b-empty"),
            template("c", QUERY).with_no_results_route("c-empty"),
        ]));

        let err = executor(&engine).execute(&route(), &task).await.unwrap_err();

        assert_eq!(err.status_code, 404);
        assert_eq!(err.redirect_to.as_deref(), Some("b-empty"));
        assert_eq!(err.data["queryTemplate"]["name"], "b");
        assert_eq!(err.data["response"]["hits"]["total"], 0);
    }

    #[tokio::test]
    async fn test_batch_without_responses_is_empty() {
        let engine = MockEngine::with_batch(Ok(MultiSearchResponse { responses: None }));
        let task = task(QuerySet::Batch(vec![template("a", QUERY)]));

        let results = executor(&engine)
            .execute(&route(), &task)
            .await
            .unwrap()
            .into_batch()
            .unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_batch_entry_error() {
        let engine = MockEngine::with_batch(Ok(MultiSearchResponse {
            responses: Some(vec![
                hits(1),
                json!({"error": {"type": "index_not_found_exception", "reason": "no such index"}, "status": 404}),
            ]),
        }));
        let task = task(QuerySet::Batch(vec![template("a", QUERY), template("b", QUERY)]));

        let err = executor(&engine).execute(&route(), &task).await.unwrap_err();

        assert_eq!(err.stage, FailureStage::BatchEntry);
        assert_eq!(err.status_code, 500);
        assert_eq!(err.data["queryTemplate"]["name"], "b");
        assert_eq!(err.cause.to_string(), "engine rejected query: no such index");
    }

    #[tokio::test]
    async fn test_batch_response_count_mismatch() {
        let engine = MockEngine::with_batch(Ok(MultiSearchResponse {
            responses: Some(vec![hits(1)]),
        }));
        let task = task(QuerySet::Batch(vec![template("a", QUERY), template("b", QUERY)]));

        let err = executor(&engine).execute(&route(), &task).await.unwrap_err();

        assert_eq!(err.stage, FailureStage::Search);
        assert!(matches!(err.cause, Cause::Transport(TransportError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_batch_transport_failure() {
        let engine =
            MockEngine::with_batch(Err(TransportError::Connection("reset".to_string())));
        let task = task(QuerySet::Batch(vec![template("a", QUERY), template("b", QUERY)]));

        let err = executor(&engine).execute(&route(), &task).await.unwrap_err();

        assert_eq!(err.stage, FailureStage::Search);
        assert_eq!(err.data["payload"]["body"].as_array().unwrap().len(), 4);
        assert_eq!(err.data["payload"]["body"][0]["index"], "services");
    }

    #[tokio::test]
    async fn test_single_query_on_explicit_client() {
        let engine = MockEngine::with_search(Ok(hits(30)));
        let client = MockClient(engine.clone());
        let template = template("results", QUERY);
        let task = task(QuerySet::Single(template.clone()));

        let result = executor(&engine)
            .single_query(&client, &template, &route(), &task)
            .await
            .unwrap();

        assert_eq!(result.pagination.total_pages, 3);
        assert!(engine.connections.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_config_is_reusable() {
        let engine = Arc::new(MockEngine::default());
        engine.search_replies.lock().unwrap().extend([Ok(hits(5)), Ok(hits(5))]);
        let task = task(QuerySet::Single(template("results", QUERY)));
        let before = task.clone();
        let executor = executor(&engine);

        let first = executor.execute(&route(), &task).await.unwrap();
        let second = executor.execute(&route(), &task).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(task, before);
    }

    #[test]
    fn test_router_task_name() {
        let engine = Arc::new(MockEngine::default());
        assert_eq!(RouterTask::name(&executor(&engine)), "elasticsearch");
    }

    #[test]
    fn test_describe_engine_error() {
        assert_eq!(describe_engine_error(&json!({"reason": "bad"})), "bad");
        assert_eq!(describe_engine_error(&json!("plain")), "plain");
        assert_eq!(describe_engine_error(&json!({"type": "x"})), r#"{"type":"x"}"#);
    }
}
