//! Record CLI commands: insert, query, search, stats.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use vectable_types::schema::{Schema, VECTOR_COLUMN};
use vectable_types::vector::Vector;

use super::input::{parse_embedding, parse_filter, parse_vector, search_options};
use super::{FilterArgs, SearchArgs};
use crate::state::AppState;

/// Components shown before the embedding preview is elided.
const EMBEDDING_PREVIEW: usize = 4;

pub async fn insert(state: &AppState, metadata: &str, embedding: &str, json: bool) -> Result<()> {
    let vector = parse_vector(state.store.schema(), metadata, embedding)?;
    state.store.insert(&vector).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&vector)?);
        return Ok(());
    }

    println!(
        "  {} Inserted record into {}",
        style("✓").green().bold(),
        style(&state.store.schema().name).cyan()
    );
    Ok(())
}

pub async fn query(state: &AppState, filter: &FilterArgs, json: bool) -> Result<()> {
    let filter = parse_filter(state.store.schema(), &filter.predicates)?;
    let vectors = state.store.query(filter.as_ref()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&vectors)?);
        return Ok(());
    }

    if vectors.is_empty() {
        print_empty();
        return Ok(());
    }

    let rows = vectors.iter().map(|v| (None, v));
    println!("{}", record_table(state.store.schema(), rows));
    println!("  {} records", style(vectors.len()).bold());
    Ok(())
}

pub async fn search(
    state: &AppState,
    embedding: &str,
    filter: &FilterArgs,
    args: &SearchArgs,
    json: bool,
) -> Result<()> {
    let target = parse_embedding(embedding)?;
    let filter = parse_filter(state.store.schema(), &filter.predicates)?;
    let options = search_options(state.config.search, args);

    let results = state
        .store
        .query_similarity(&target, filter.as_ref(), Some(&options))
        .await?;

    if json {
        let out: Vec<serde_json::Value> = results
            .iter()
            .map(|(vector, score)| {
                serde_json::json!({
                    "score": score,
                    "metadata": vector.metadata,
                    "embedding": vector.embedding,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if results.is_empty() {
        print_empty();
        if options.std_deviations > 0.0 {
            println!(
                "  No score cleared the outlier cutoff. Retry with {}",
                style("--std-deviations 0").yellow()
            );
            println!();
        }
        return Ok(());
    }

    let rows = results.iter().map(|(v, score)| (Some(score), v));
    println!("{}", record_table(state.store.schema(), rows));
    println!(
        "  {} results by {}",
        style(results.len()).bold(),
        style(options.similarity.method).cyan()
    );
    Ok(())
}

pub async fn stats(state: &AppState, filter: &FilterArgs, json: bool) -> Result<()> {
    let schema = state.store.schema();
    let filter = parse_filter(schema, &filter.predicates)?;
    let live = state.store.live_schema().await?;
    let count = match live {
        Some(_) => Some(state.store.count(filter.as_ref()).await?),
        None => None,
    };

    if json {
        let out = serde_json::json!({
            "table": schema.name,
            "dimension": state.store.config().length,
            "exists": live.is_some(),
            "in_sync": live.as_ref() == Some(schema),
            "records": count,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let label = |text: &str| style(format!("{text:<10}")).bold();
    println!();
    println!("  {} {}", label("Table:"), style(&schema.name).cyan());
    println!("  {} {}", label("Dimension:"), state.store.config().length);
    println!("  {} {}", label("Columns:"), schema.columns.len());
    println!("  {} {}", label("Indexes:"), schema.indexes.len());
    match count {
        Some(n) => println!("  {} {n}", label("Records:")),
        None => println!(
            "  {} {} (run {})",
            label("Records:"),
            style("table absent").dim(),
            style("vectable migrate").yellow()
        ),
    }
    println!();
    Ok(())
}

fn print_empty() {
    println!();
    println!("  {} No records found.", style("i").blue().bold());
    println!();
}

fn embedding_preview(embedding: &[f64]) -> String {
    let shown: Vec<String> = embedding
        .iter()
        .take(EMBEDDING_PREVIEW)
        .map(|x| format!("{x:.4}"))
        .collect();
    if embedding.len() > EMBEDDING_PREVIEW {
        format!("[{}, … +{}]", shown.join(", "), embedding.len() - EMBEDDING_PREVIEW)
    } else {
        format!("[{}]", shown.join(", "))
    }
}

/// One row per record, metadata in schema column order. The score column
/// appears when the first row carries a score.
fn record_table<'a>(
    schema: &Schema,
    rows: impl Iterator<Item = (Option<f64>, &'a Vector)>,
) -> Table {
    let columns: Vec<&str> = schema
        .column_names()
        .into_iter()
        .filter(|name| *name != VECTOR_COLUMN)
        .collect();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut rows = rows.peekable();
    let scored = matches!(rows.peek(), Some((Some(_), _)));

    let mut header = Vec::with_capacity(columns.len() + 2);
    if scored {
        header.push(Cell::new("score").fg(Color::White));
    }
    header.extend(columns.iter().map(|name| Cell::new(name).fg(Color::White)));
    header.push(Cell::new(VECTOR_COLUMN).fg(Color::White));
    table.set_header(header);

    for (score, vector) in rows {
        let mut cells = Vec::with_capacity(columns.len() + 2);
        if let Some(score) = score {
            cells.push(Cell::new(format!("{score:.6}")).fg(Color::Green));
        }
        cells.extend(columns.iter().map(|name| match vector.get(name) {
            Some(value) => Cell::new(value.to_string()),
            None => Cell::new("NULL").fg(Color::DarkGrey),
        }));
        cells.push(Cell::new(embedding_preview(&vector.embedding)).fg(Color::DarkGrey));
        table.add_row(cells);
    }

    table
}
