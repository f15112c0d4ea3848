use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rmi_metrics::{load_bytes, ContextBudget, ContextBuilder, MetricsEngine};

use super::*;
use crate::error::ServiceError;

/// Replays scripted outcomes in order, then keeps answering "ok".
#[derive(Default)]
struct ScriptedService {
    script: Mutex<VecDeque<Result<String, ServiceError>>>,
    calls: AtomicU32,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedService {
    fn new(script: Vec<Result<String, ServiceError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReasoningService for ScriptedService {
    async fn generate(&self, prompt: &Prompt) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_owned()))
    }
}

struct StalledService;

#[async_trait]
impl ReasoningService for StalledService {
    async fn generate(&self, _prompt: &Prompt) -> Result<String, ServiceError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".to_owned())
    }
}

fn context(question: &str) -> ContextObject {
    context_with_budget(question, ContextBudget::default())
}

fn context_with_budget(question: &str, budget: ContextBudget) -> ContextObject {
    let csv = "name,city,cuisine,rating,review_text,delivery_time,price,menu_items\n\
               Bistro A,X,Y,4.5,Lovely staff,30,20,Soup\n\
               Cafe B,X,Y,4,Decent coffee,20,8,Latte\n\
               Diner C,X,Y,3,Cold fries,55,12,Burger\n";
    let bundle = MetricsEngine::default().compute(&load_bytes(csv.as_bytes()).unwrap());
    ContextBuilder::new(budget)
        .build("Diner C", question, &bundle)
        .unwrap()
}

fn runner(service: Arc<dyn ReasoningService>) -> AgentRunner {
    AgentRunner::new(service)
        .with_timeout(Duration::from_secs(5))
        .with_retry_policy(2, 0)
}

#[tokio::test]
async fn answers_with_fingerprint_and_attempts() {
    let service = ScriptedService::new(vec![Ok("  Diner C ranks third of three.  ".to_owned())]);
    let question = "How does Diner C compare to competitors?";
    let ctx = context(question);

    let answer = runner(service.clone()).run(question, &ctx).await.unwrap();

    assert_eq!(answer.text, "Diner C ranks third of three.");
    assert_eq!(answer.restaurant, "Diner C");
    assert_eq!(answer.attempts, 1);
    assert_eq!(
        answer.prompt_fingerprint,
        Prompt::build(&ctx).unwrap().fingerprint()
    );
    assert_eq!(answer.request_id.get_version_num(), 4);
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn blank_question_never_reaches_service() {
    let service = ScriptedService::new(vec![]);
    let err = runner(service.clone())
        .run("   ", &context("anything"))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::EmptyQuestion));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let service = ScriptedService::new(vec![
        Err(ServiceError::RateLimited {
            retry_after: Some(Duration::ZERO),
        }),
        Ok("Delivery is slow.".to_owned()),
    ]);
    let answer = runner(service.clone())
        .run("Is delivery slow?", &context("Is delivery slow?"))
        .await
        .unwrap();
    assert_eq!(answer.attempts, 2);
    assert_eq!(service.calls(), 2);

    let prompts = service.prompts.lock().unwrap();
    assert_eq!(prompts[0], prompts[1]);
}

#[tokio::test]
async fn permanent_failure_maps_to_unavailable() {
    let service = ScriptedService::new(vec![Err(ServiceError::Api {
        status: 401,
        message: "invalid api key".to_owned(),
    })]);
    let err = runner(service.clone())
        .run("How are we doing?", &context("How are we doing?"))
        .await
        .unwrap_err();
    match err {
        AgentError::Unavailable { reason } => assert!(reason.contains("invalid api key")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn exhausted_retries_map_to_unavailable() {
    let rate_limited = || -> Result<String, ServiceError> {
        Err(ServiceError::RateLimited {
            retry_after: Some(Duration::ZERO),
        })
    };
    let service = ScriptedService::new(vec![rate_limited(), rate_limited(), rate_limited()]);
    let err = runner(service.clone())
        .run("Any trends?", &context("Any trends?"))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Unavailable { .. }));
    assert_eq!(service.calls(), 3);
}

#[tokio::test]
async fn empty_answer_is_unavailable() {
    let service = ScriptedService::new(vec![Ok("   ".to_owned())]);
    let err = runner(service)
        .run("Summarise reviews", &context("Summarise reviews"))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Unavailable { .. }));
}

#[tokio::test]
async fn slow_service_times_out() {
    let err = AgentRunner::new(Arc::new(StalledService))
        .with_timeout(Duration::from_millis(20))
        .run("Hello?", &context("Hello?"))
        .await
        .unwrap_err();
    match err {
        AgentError::Unavailable { reason } => assert!(reason.contains("timed out")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn run_leaves_context_untouched() {
    let ctx = context("What should we change?");
    let before = ctx.clone();
    runner(ScriptedService::new(vec![]))
        .run("What should we change?", &ctx)
        .await
        .unwrap();
    assert_eq!(ctx, before);
}

#[tokio::test]
async fn prompt_uses_budgeted_question() {
    let service = ScriptedService::new(vec![]);
    let question = format!("Why are our fries cold? {}", "Please explain in detail. ".repeat(300));
    let ctx = context_with_budget(
        &question,
        ContextBudget {
            max_bytes: 1500,
            ..ContextBudget::default()
        },
    );
    assert!(ctx.truncated);
    assert!(ctx.question.len() < question.len());

    let answer = runner(service.clone()).run(&question, &ctx).await.unwrap();

    let sent = service.prompts.lock().unwrap()[0].clone();
    assert!(sent.user.contains(&format!("Question: {}\n", ctx.question)));
    assert!(!sent.user.contains(question.trim()));
    assert!(sent.user.len() < question.len());
    assert_eq!(answer.question, question.trim());
}
