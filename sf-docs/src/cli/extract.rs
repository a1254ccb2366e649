use anyhow::Result;
use serde_json::json;

use super::{AppContext, print_json};
use sf_docs::domain::Source;

pub async fn run(ctx: &AppContext, input: &str) -> Result<()> {
    let source = Source::parse(input)?;
    let page = ctx.extractor()?.extract(&source).await?;

    if ctx.json {
        return print_json(&json!({
            "source": source.locator,
            "kind": source.kind,
            "title": page.title,
            "strategy": page.strategy,
            "final_url": page.final_url,
            "text": page.text,
        }));
    }

    eprintln!("# {} [{}]", page.title, page.strategy);
    println!("{}", page.text);
    Ok(())
}
