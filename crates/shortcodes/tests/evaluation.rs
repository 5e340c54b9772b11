use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shortcodes::{
    Arguments, Cancellation, Context, Diagnostic, Engine, EngineBuilder, EngineConfig,
    EvaluateError, FailureBehavior, HandlerError, InMemoryTemplateStore, ParseError,
    ShortcodeHandler, ShortcodeTemplate,
};

fn bold_engine() -> EngineBuilder {
    Engine::builder().shortcode_fn("bold", |args, content, _ctx| {
        let text = args.named("text").unwrap_or(content);
        Ok(format!("<b>{}</b>", text))
    })
}

/// Records every call it receives into the context under `calls`.
struct Recorder;

#[async_trait]
impl ShortcodeHandler for Recorder {
    async fn render(
        &self,
        args: &Arguments,
        content: &str,
        ctx: &mut Context,
    ) -> Result<String, HandlerError> {
        tokio::task::yield_now().await;
        let label = args.at_or_default(0, "?");
        ctx.push("calls", format!("{}:{}", label, content));
        Ok(format!("{}({})", label, content))
    }
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[tokio::test]
async fn test_bold_prefers_text_argument() {
    let engine = bold_engine().build().unwrap();
    let mut ctx = Context::new();
    assert_eq!(
        engine
            .evaluate("[bold text='hi']ignored[/bold]", &mut ctx)
            .await
            .unwrap(),
        "<b>hi</b>"
    );
    assert_eq!(
        engine.evaluate("[bold]plain[/bold]", &mut ctx).await.unwrap(),
        "<b>plain</b>"
    );
}

#[tokio::test]
async fn test_repeated_argument_last_wins() {
    let engine = Engine::builder()
        .shortcode_fn("tag", |args, _, _| Ok(args.named_or_default("a", "").to_string()))
        .build()
        .unwrap();
    let out = engine
        .evaluate("[tag a=1 a=2]", &mut Context::new())
        .await
        .unwrap();
    assert_eq!(out, "2");
}

#[tokio::test]
async fn test_surrounding_text_is_untouched() {
    let engine = bold_engine().build().unwrap();
    let input = "Line one,\n  [bold]two[/bold] [sic] & <three> [bold text=\"four\"/]\n";
    let out = engine.evaluate(input, &mut Context::new()).await.unwrap();
    assert_eq!(out, "Line one,\n  <b>two</b> [sic] & <three> <b>four</b>\n");
}

// ============================================================================
// Nesting
// ============================================================================

#[tokio::test]
async fn test_inner_handler_runs_first() {
    let engine = Engine::builder().shortcode("r", Recorder).build().unwrap();
    let mut ctx = Context::new();
    let out = engine
        .evaluate("[r outer][r inner]x[/r][/r]", &mut ctx)
        .await
        .unwrap();
    assert_eq!(out, "outer(inner(x))");

    let calls: Vec<String> = ctx.get_as("calls").unwrap();
    assert_eq!(calls, vec!["inner:x", "outer:inner(x)"]);
}

#[tokio::test]
async fn test_handlers_run_in_source_order() {
    let engine = Engine::builder()
        .shortcode("r", Recorder)
        .shortcode_fn("log", |_, _, ctx| {
            let calls: Vec<String> = ctx.get_as("calls").unwrap_or_default();
            Ok(calls.join(","))
        })
        .build()
        .unwrap();
    let out = engine
        .evaluate("[r a/][r b]1[/r][r c/] => [log/]", &mut Context::new())
        .await
        .unwrap();
    assert_eq!(out, "a()b(1)c() => a:,b:1,c:");
}

#[tokio::test]
async fn test_context_flows_to_later_tags() {
    let engine = Engine::builder()
        .shortcode_fn("h", |_, content, ctx| {
            ctx.push("headings", content);
            Ok(format!("<h2>{}</h2>", content))
        })
        .shortcode_fn("toc", |_, _, ctx| {
            let headings: Vec<String> = ctx.get_as("headings").unwrap_or_default();
            let items: String = headings
                .iter()
                .map(|h| format!("<li>{}</li>", h))
                .collect();
            Ok(format!("<ul>{}</ul>", items))
        })
        .build()
        .unwrap();
    let out = engine
        .evaluate("[h]A[/h][h]B[/h][toc/]", &mut Context::new())
        .await
        .unwrap();
    assert_eq!(out, "<h2>A</h2><h2>B</h2><ul><li>A</li><li>B</li></ul>");
}

// ============================================================================
// Providers
// ============================================================================

#[tokio::test]
async fn test_template_shortcode_renders_model() {
    let store = Arc::new(InMemoryTemplateStore::new(vec![ShortcodeTemplate::new(
        "link",
        "<a href=\"{{ args.href }}\">{{ content or positional[0] }}</a>",
    )]));
    let engine = bold_engine().templates(store).build().unwrap();
    let out = engine
        .evaluate(
            "[link href='/docs' Docs] and [link href=/x][bold]X[/bold][/link]",
            &mut Context::new(),
        )
        .await
        .unwrap();
    assert_eq!(
        out,
        "<a href=\"/docs\">Docs</a> and <a href=\"/x\"><b>X</b></a>"
    );
}

#[tokio::test]
async fn test_template_wins_over_code_regardless_of_order() {
    let store = Arc::new(InMemoryTemplateStore::new(vec![ShortcodeTemplate::new(
        "bold",
        "<strong>{{ content }}</strong>",
    )]));

    let code_first = bold_engine().templates(store.clone()).build().unwrap();
    let templates_first = Engine::builder()
        .templates(store)
        .shortcode_fn("bold", |_, c, _| Ok(format!("<b>{}</b>", c)))
        .build()
        .unwrap();

    for engine in [code_first, templates_first] {
        let out = engine
            .evaluate("[bold]x[/bold]", &mut Context::new())
            .await
            .unwrap();
        assert_eq!(out, "<strong>x</strong>");
    }
}

#[tokio::test]
async fn test_same_name_registered_twice_applies_once() {
    let engine = Engine::builder()
        .shortcode_fn("bold", |_, c, _| Ok(format!("<em>{}</em>", c)))
        .shortcode_fn("bold", |_, c, _| Ok(format!("<b>{}</b>", c)))
        .build()
        .unwrap();
    let out = engine
        .evaluate("[bold]x[/bold]", &mut Context::new())
        .await
        .unwrap();
    assert_eq!(out, "<b>x</b>");
}

// ============================================================================
// Recovery
// ============================================================================

#[tokio::test]
async fn test_unknown_tag_passes_through() {
    let engine = bold_engine().build().unwrap();
    let eval = engine
        .evaluate_detailed("[nonexistent x=1]", &mut Context::new())
        .await
        .unwrap();
    assert_eq!(eval.output, "[nonexistent x=1]");
    assert_eq!(
        eval.diagnostics,
        vec![
            Diagnostic::Parse(ParseError::UnclosedTag {
                name: "nonexistent".into(),
                offset: 0
            }),
            Diagnostic::Unresolved {
                name: "nonexistent".into(),
                offset: 0
            },
        ]
    );
}

#[tokio::test]
async fn test_unterminated_quote_does_not_hide_later_tags() {
    let engine = bold_engine().build().unwrap();
    let eval = engine
        .evaluate_detailed(
            "[bold text='x]a[/bold] then [bold]later[/bold] end",
            &mut Context::new(),
        )
        .await
        .unwrap();
    assert_eq!(eval.output, "[bold text='x]a[/bold] then <b>later</b> end");
    assert_eq!(
        eval.diagnostics,
        vec![Diagnostic::Parse(ParseError::UnterminatedQuote { offset: 11 })]
    );
}

#[tokio::test]
async fn test_unterminated_tag_is_echoed() {
    let engine = bold_engine().build().unwrap();
    let eval = engine
        .evaluate_detailed("[bold text", &mut Context::new())
        .await
        .unwrap();
    assert_eq!(eval.output, "[bold text");
    assert_eq!(
        eval.diagnostics,
        vec![Diagnostic::Parse(ParseError::UnterminatedTag { offset: 0 })]
    );
}

#[tokio::test]
async fn test_malformed_tag_does_not_stop_later_tags() {
    let engine = bold_engine().build().unwrap();
    let out = engine
        .evaluate("[bold a=[x] [bold]ok[/bold]", &mut Context::new())
        .await
        .unwrap();
    assert!(out.ends_with("<b>ok</b>"), "got {:?}", out);
}

#[tokio::test]
async fn test_failed_handler_uses_placeholder() {
    let engine = bold_engine()
        .shortcode_fn("broken", |_, _, _| Err(HandlerError::msg("no data")))
        .config(
            EngineConfig::default().with_failure(FailureBehavior::Placeholder("[?]".into())),
        )
        .build()
        .unwrap();
    let eval = engine
        .evaluate_detailed("[bold]a[/bold][broken/][bold]b[/bold]", &mut Context::new())
        .await
        .unwrap();
    assert_eq!(eval.output, "<b>a</b>[?]<b>b</b>");
    assert_eq!(eval.diagnostics.len(), 1);
    assert_eq!(
        eval.diagnostics[0].to_string(),
        "shortcode 'broken' at byte 14 failed: no data"
    );
}

#[tokio::test]
async fn test_failing_template_is_isolated() {
    let store = Arc::new(InMemoryTemplateStore::new(vec![ShortcodeTemplate::new(
        "bad", "{% if %}",
    )]));
    let engine = bold_engine().templates(store).build().unwrap();
    let out = engine
        .evaluate("[bad/][bold]still here[/bold]", &mut Context::new())
        .await
        .unwrap();
    assert_eq!(out, "<b>still here</b>");
}

// ============================================================================
// Concurrency, cancellation and timeouts
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_concurrent_documents_do_not_share_context() {
    struct Slow;

    #[async_trait]
    impl ShortcodeHandler for Slow {
        async fn render(
            &self,
            args: &Arguments,
            _content: &str,
            ctx: &mut Context,
        ) -> Result<String, HandlerError> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let n = ctx.increment("n");
            Ok(format!("{}{}", args.at_or_default(0, ""), n))
        }
    }

    let engine = Arc::new(Engine::builder().shortcode("slow", Slow).build().unwrap());
    let (a, b) = {
        let engine_a = Arc::clone(&engine);
        let engine_b = Arc::clone(&engine);
        tokio::join!(
            async move {
                engine_a
                    .evaluate("[slow a/][slow a/]", &mut Context::new())
                    .await
            },
            async move {
                engine_b
                    .evaluate("[slow b/][slow b/][slow b/]", &mut Context::new())
                    .await
            },
        )
    };
    assert_eq!(a.unwrap(), "a1a2");
    assert_eq!(b.unwrap(), "b1b2b3");
}

#[tokio::test]
async fn test_engine_is_shareable_across_tasks() {
    let engine = Arc::new(bold_engine().build().unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .evaluate(&format!("[bold]{}[/bold]", i), &mut Context::new())
                    .await
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap().unwrap(), format!("<b>{}</b>", i));
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_slow_handler_returns_partial() {
    struct Hang;

    #[async_trait]
    impl ShortcodeHandler for Hang {
        async fn render(
            &self,
            _args: &Arguments,
            _content: &str,
            _ctx: &mut Context,
        ) -> Result<String, HandlerError> {
            std::future::pending::<()>().await;
            Ok(String::new())
        }
    }

    let engine = bold_engine().shortcode("hang", Hang).build().unwrap();
    let token = Cancellation::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = engine
        .evaluate_with_cancellation(
            "[bold]done[/bold] [bold][hang/][/bold] never",
            &mut Context::new(),
            &token,
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EvaluateError::Cancelled {
            partial: "<b>done</b> [bold]".into()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_returns_partial() {
    struct Sleepy;

    #[async_trait]
    impl ShortcodeHandler for Sleepy {
        async fn render(
            &self,
            _args: &Arguments,
            _content: &str,
            _ctx: &mut Context,
        ) -> Result<String, HandlerError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok("late".into())
        }
    }

    let engine = bold_engine()
        .shortcode("sleepy", Sleepy)
        .config(EngineConfig::default().with_timeout(Duration::from_secs(1)))
        .build()
        .unwrap();
    let err = engine
        .evaluate("[bold]a[/bold][sleepy/]", &mut Context::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EvaluateError::TimedOut { .. }));
    assert_eq!(err.partial(), "<b>a</b>");
}
