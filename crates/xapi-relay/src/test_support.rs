//! A relay wired to an in-memory store and a stub LRS.

use std::sync::{Arc, Mutex};

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;
use xapi_core::{LanguageMap, VerbKey, platform::{Content, User}};
use xapi_memory::MemoryStore;
use xapi_pipeline::{
  Dispatcher, IdentityConfig, Pipeline, PipelineConfig, SendOutcome, Site,
  StateDefinition, Transport, identity::StrategyConfig,
};

use crate::{AppState, router};

#[derive(Debug, thiserror::Error)]
#[error("connection refused")]
pub struct Refused;

/// Records what it is sent; assigns fresh ids.
#[derive(Clone, Default)]
pub struct StubLrs {
  sent:     Arc<Mutex<Vec<(Option<String>, Value)>>>,
  puts:     Arc<Mutex<Vec<Uuid>>>,
  failing:  bool,
  endpoint: Option<String>,
}

impl StubLrs {
  pub fn failing() -> Self {
    Self {
      failing: true,
      ..Self::default()
    }
  }

  pub fn sent(&self) -> Vec<Value> {
    self.sent.lock().unwrap().iter().map(|(_, v)| v.clone()).collect()
  }

  pub fn endpoints(&self) -> Vec<Option<String>> {
    self.sent.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
  }

  pub fn put_ids(&self) -> Vec<Uuid> { self.puts.lock().unwrap().clone() }
}

impl Transport for StubLrs {
  type Error = Refused;

  async fn send(&self, batch: &[Value]) -> Result<SendOutcome, Refused> {
    if self.failing {
      return Err(Refused);
    }
    self
      .sent
      .lock()
      .unwrap()
      .extend(batch.iter().map(|v| (self.endpoint.clone(), v.clone())));
    Ok(SendOutcome {
      statement_ids: batch.iter().map(|_| Uuid::new_v4()).collect(),
    })
  }

  async fn put(&self, id: Uuid, statement: &Value) -> Result<(), Refused> {
    if self.failing {
      return Err(Refused);
    }
    self
      .sent
      .lock()
      .unwrap()
      .push((self.endpoint.clone(), statement.clone()));
    self.puts.lock().unwrap().push(id);
    Ok(())
  }

  async fn query(&self, resource: &str, query: Option<&str>) -> Result<Value, Refused> {
    if self.failing {
      return Err(Refused);
    }
    Ok(json!({ "resource": resource, "query": query }))
  }

  fn retarget(&self, endpoint: &str) -> Result<Self, Refused> {
    Ok(Self {
      endpoint: Some(endpoint.to_string()),
      ..self.clone()
    })
  }
}

pub struct Relay {
  pub router: Router,
  pub store:  MemoryStore,
  learner:    Uuid,
}

fn config() -> PipelineConfig {
  let mut completed = StateDefinition::new("completed", VerbKey::Completed);
  completed.flag = Some("completed".into());
  let mut attended = StateDefinition::new("attended", VerbKey::Attended);
  attended.flag = Some("attended".into());
  attended.content_types = vec!["event".into()];

  PipelineConfig {
    site:     Site::new("Academy", "https://lms.example"),
    identity: IdentityConfig {
      strategies: vec![StrategyConfig {
        id:       "mbox".into(),
        priority: 10,
      }],
      real_name:  false,
    },
    states:   vec![completed, attended],
  }
}

impl Relay {
  /// A relay knowing one learner (`ada@example.com`) and one course
  /// (`42`, at `https://lms.example/node/42`).
  pub fn new(lrs: StubLrs) -> Self {
    let store = MemoryStore::default();
    let mut learner = User::new(Uuid::new_v4());
    learner.email = Some("ada@example.com".into());
    let uuid = learner.uuid;
    store.insert_user(learner);
    store.insert_content(Content {
      id:            "42".into(),
      entity_type:   "node".into(),
      bundle:        Some("course".into()),
      canonical_url: "https://lms.example/node/42".into(),
      labels:        LanguageMap::from([("en".to_string(), "Algebra".to_string())]),
      descriptions:  LanguageMap::new(),
    });

    let shared = Arc::new(store.clone());
    let pipeline = Pipeline::new(
      &config(),
      shared.clone(),
      shared.clone(),
      shared,
      Dispatcher::new(lrs),
    )
    .unwrap();
    let replay_endpoints = ["https://lrs.partner.example/xapi".to_string()];
    let router = router(AppState::new(pipeline, &replay_endpoints));

    Self {
      router,
      store,
      learner: uuid,
    }
  }

  pub fn learner(&self) -> Uuid { self.learner }

  pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
    self.send("POST", uri, Some(body)).await
  }

  pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
    self.send("PUT", uri, Some(body)).await
  }

  pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
    self.send("GET", uri, None).await
  }

  async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let req = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(body) => req
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string())),
      None => req.body(Body::empty()),
    }
    .unwrap();
    let resp = self.router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
  }
}
