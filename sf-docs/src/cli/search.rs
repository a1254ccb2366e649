use anyhow::Result;
use console::style;

use super::{AppContext, print_json};
use sf_docs::domain::SearchQuery;

pub async fn run(
    ctx: &AppContext,
    query: String,
    limit: Option<usize>,
    source: Option<String>,
    min_score: Option<f32>,
) -> Result<()> {
    let service = ctx.search_service(!ctx.json).await?;

    let mut search = SearchQuery::new(query)
        .with_limit(limit.unwrap_or(ctx.config.search.default_limit));
    if let Some(source) = source {
        search = search.with_source(source);
    }
    if let Some(min_score) = min_score.or(ctx.config.search.min_score) {
        search = search.with_min_score(min_score);
    }

    let results = service.search(&search).await?;

    if ctx.json {
        return print_json(&results);
    }

    if results.is_empty() {
        println!("No results for {:?}", search.query);
        return Ok(());
    }
    for (i, result) in results.iter().enumerate() {
        println!(
            "{} {} {}",
            style(format!("{}.", i + 1)).bold(),
            style(&result.title).bold(),
            style(format!("({:.3})", result.score)).dim()
        );
        println!("   {} #{}", style(&result.source).cyan(), result.index);
        for line in result.text.lines().take(6) {
            println!("   {line}");
        }
        println!();
    }
    Ok(())
}
