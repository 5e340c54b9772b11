//! Shortcodes the CLI ships with.

use shortcodes::{handler_fn, Arguments, Context, HandlerError, ShortcodeOptions};

const HTML: &str = "HTML Content";

/// `text` (or the first positional value) wins over the tag's content when
/// present and non-empty.
fn text_or<'a>(args: &'a Arguments, content: &'a str) -> &'a str {
    args.named_or_at("text", 0)
        .filter(|t| !t.is_empty())
        .unwrap_or(content)
}

pub fn builtins() -> ShortcodeOptions {
    let mut options = ShortcodeOptions::new();
    options
        .add_shortcode_with(
            "bold",
            handler_fn(|args, content, _| Ok(format!("<b>{}</b>", text_or(args, content)))),
            |meta| {
                meta.hint = Some("Add bold formatting with a shortcode.".into());
                meta.usage = Some("[bold 'your bold content here']".into());
                meta.return_shortcode = Some("[bold ]".into());
                meta.categories = vec![HTML.into(), "Content Item".into()];
            },
        )
        .add_shortcode_with(
            "italic",
            handler_fn(|args, content, _| Ok(format!("<em>{}</em>", text_or(args, content)))),
            |meta| {
                meta.hint = Some("Add italic formatting.".into());
                meta.categories = vec![HTML.into()];
            },
        )
        .add_shortcode_with(
            "upper",
            handler_fn(|args, content, _| Ok(text_or(args, content).to_uppercase())),
            |meta| meta.hint = Some("Uppercase the content.".into()),
        )
        .add_shortcode_with("heading", handler_fn(heading), |meta| {
            meta.hint = Some("A section heading, recorded for [toc].".into());
            meta.usage = Some("[heading level=2]Title[/heading]".into());
            meta.categories = vec![HTML.into()];
        })
        .add_shortcode_with("toc", handler_fn(toc), |meta| {
            meta.hint = Some("List the headings that precede it.".into());
            meta.return_shortcode = Some("[toc/]".into());
            meta.categories = vec![HTML.into()];
        });
    options
}

fn heading(args: &Arguments, content: &str, ctx: &mut Context) -> Result<String, HandlerError> {
    let level = args.named_or_at("level", 0).unwrap_or("2");
    let level: u8 = level
        .parse()
        .ok()
        .filter(|l| (1..=6).contains(l))
        .ok_or_else(|| HandlerError::msg(format!("invalid heading level '{}'", level)))?;
    // Positional 0 is the level here, so only a named `text` overrides.
    let text = args.named("text").filter(|t| !t.is_empty()).unwrap_or(content);
    let n = ctx.increment("heading_count");
    let id = format!("h{}", n);
    ctx.push("headings", serde_json::json!({ "id": id, "level": level, "text": text }));
    Ok(format!("<h{0} id=\"{1}\">{2}</h{0}>", level, id, text))
}

fn toc(_args: &Arguments, _content: &str, ctx: &mut Context) -> Result<String, HandlerError> {
    let headings: Vec<serde_json::Value> = ctx.get_as("headings").unwrap_or_default();
    let items: String = headings
        .iter()
        .map(|h| {
            format!(
                "<li><a href=\"#{}\">{}</a></li>",
                h["id"].as_str().unwrap_or_default(),
                h["text"].as_str().unwrap_or_default()
            )
        })
        .collect();
    Ok(format!("<ul class=\"toc\">{}</ul>", items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shortcodes::Engine;

    async fn render(input: &str) -> String {
        let engine = Engine::builder().shortcodes(builtins()).build().unwrap();
        engine.evaluate(input, &mut Context::new()).await.unwrap()
    }

    #[tokio::test]
    async fn test_bold_text_argument() {
        assert_eq!(render("[bold text='hi']ignored[/bold]").await, "<b>hi</b>");
        assert_eq!(render("[bold text='']kept[/bold]").await, "<b>kept</b>");
    }

    #[tokio::test]
    async fn test_documented_usage_renders() {
        assert_eq!(
            render("[bold 'your bold content here']").await,
            "<b>your bold content here</b>"
        );
        assert_eq!(render("[upper 'shout'/]").await, "SHOUT");
        assert_eq!(render("[italic]kept[/italic]").await, "<em>kept</em>");
    }

    #[tokio::test]
    async fn test_headings_feed_toc() {
        let out = render("[heading]A[/heading][heading 3]B[/heading][toc/]").await;
        assert_eq!(
            out,
            "<h2 id=\"h1\">A</h2><h3 id=\"h2\">B</h3>\
             <ul class=\"toc\"><li><a href=\"#h1\">A</a></li><li><a href=\"#h2\">B</a></li></ul>"
        );
    }

    #[tokio::test]
    async fn test_bad_heading_level_is_dropped() {
        assert_eq!(render("x[heading level=9]A[/heading]y").await, "xy");
    }
}
